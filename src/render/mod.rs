//! Heatmap rendering.
//!
//! The pipeline only depends on [`MatrixRenderer`]; [`SvgHeatmap`] is the
//! plotters-backed implementation used by the binary.

pub mod heatmap;
pub mod palette;

pub use heatmap::{heatmap_dimensions, HeatmapStyle, SvgHeatmap};
pub use palette::Palette;

use crate::data::CountMatrix;
use crate::error::Result;
use std::path::Path;

/// Renders a labeled matrix to a single image file.
pub trait MatrixRenderer {
    fn render(&self, matrix: &CountMatrix, path: &Path, title: &str) -> Result<()>;
}

impl<R: MatrixRenderer + ?Sized> MatrixRenderer for Box<R> {
    fn render(&self, matrix: &CountMatrix, path: &Path, title: &str) -> Result<()> {
        (**self).render(matrix, path, title)
    }
}
