//! External table conversion.

use crate::error::{ProfileError, Result};
use log::info;
use std::path::Path;
use std::process::{Command, Stdio};

/// Converts a written OTU table into an exchange artifact.
pub trait TableConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<()>;
}

/// The `biom convert` command-line tool.
#[derive(Debug, Clone)]
pub struct BiomConvert {
    program: String,
    extra_args: Vec<String>,
}

impl Default for BiomConvert {
    fn default() -> Self {
        Self::new("biom")
    }
}

impl BiomConvert {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn new_command(&self) -> Command {
        Command::new(&self.program)
    }

    fn describe(&self, input: &Path, output: &Path) -> String {
        format!(
            "{} convert -i {} -o {}",
            self.program,
            input.display(),
            output.display()
        )
    }
}

impl TableConverter for BiomConvert {
    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let command = self.describe(input, output);
        info!("Running {}", command);

        let result = self
            .new_command()
            .arg("convert")
            .arg("-i")
            .arg(input)
            .arg("-o")
            .arg(output)
            .args(["--to-json", "--table-type=OTU table"])
            .args(["--process-obs-metadata", "taxonomy"])
            .args(&self.extra_args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ProfileError::ExportFailed {
                command: command.clone(),
                reason: e.to_string(),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ProfileError::ExportFailed {
                command,
                reason: format!("{} ({})", result.status, stderr.trim()),
            });
        }
        if !output.exists() {
            return Err(ProfileError::ExportFailed {
                command,
                reason: format!("converter exited cleanly but {:?} was not created", output),
            });
        }

        Ok(())
    }
}
