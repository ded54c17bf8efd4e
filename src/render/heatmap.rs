//! SVG heatmap drawn cell by cell on a plotters drawing area.

use super::palette::{luminance, Palette};
use super::MatrixRenderer;
use crate::data::CountMatrix;
use crate::error::{ProfileError, Result};
use log::debug;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pixels per figure inch.
const DPI: u32 = 100;
const MIN_WIDTH_IN: u32 = 20;
const MIN_HEIGHT_IN: u32 = 10;
const WIDTH_PER_COLUMN: f64 = 2.0;
const HEIGHT_PER_ROW: f64 = 0.5;

const TITLE_HEIGHT: i32 = 80;
const MARGIN: i32 = 40;
const COLORBAR_WIDTH: i32 = 30;
const COLORBAR_GAP: i32 = 40;
const COLORBAR_LABELS: i32 = 90;
const COLORBAR_STEPS: i32 = 100;

/// Presentation options shared by every heatmap of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapStyle {
    /// Draw the numeric value inside each cell.
    pub annotate: bool,
    pub palette: Palette,
    pub font_size: u32,
}

impl Default for HeatmapStyle {
    fn default() -> Self {
        Self {
            annotate: false,
            palette: Palette::Viridis,
            font_size: 20,
        }
    }
}

impl HeatmapStyle {
    /// Annotated diverging style used for summary views.
    pub fn annotated() -> Self {
        Self {
            annotate: true,
            palette: Palette::SpectralR,
            ..Self::default()
        }
    }
}

/// Image size in pixels for a `rows` × `cols` matrix.
///
/// Width grows by two inches per column and height by half an inch per row,
/// never below 20 × 10 inches.
pub fn heatmap_dimensions(rows: usize, cols: usize) -> (u32, u32) {
    let width = (cols as f64 * WIDTH_PER_COLUMN).max(MIN_WIDTH_IN as f64);
    let height = (rows as f64 * HEIGHT_PER_ROW).max(MIN_HEIGHT_IN as f64);
    (
        (width * DPI as f64).round() as u32,
        (height * DPI as f64).round() as u32,
    )
}

/// Two significant digits, switching to exponent form for very large or
/// very small magnitudes.
pub(crate) fn format_annotation(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{}", value);
    }
    let magnitude = value.abs().log10().floor() as i32;
    if (-4..2).contains(&magnitude) {
        let decimals = (1 - magnitude).max(0) as usize;
        format!("{:.*}", decimals, value)
    } else {
        format!("{:.1e}", value)
    }
}

/// Renders heatmaps as SVG files.
#[derive(Debug, Clone, Default)]
pub struct SvgHeatmap {
    style: HeatmapStyle,
}

impl SvgHeatmap {
    pub fn new(style: HeatmapStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &HeatmapStyle {
        &self.style
    }
}

fn render_err<E: std::fmt::Display>(e: E) -> ProfileError {
    ProfileError::Render(e.to_string())
}

impl MatrixRenderer for SvgHeatmap {
    fn render(&self, matrix: &CountMatrix, path: &Path, title: &str) -> Result<()> {
        if matrix.is_empty() {
            return Err(ProfileError::EmptyData(format!(
                "Cannot render empty {} matrix",
                matrix.row_label()
            )));
        }

        let n_rows = matrix.n_rows();
        let n_cols = matrix.n_samples();
        let (width, height) = heatmap_dimensions(n_rows, n_cols);
        let font = self.style.font_size as i32;
        let font_px = self.style.font_size as f64;

        let label_chars = matrix.row_ids().iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let sample_chars = matrix
            .sample_ids()
            .iter()
            .map(|s| s.chars().count())
            .max()
            .unwrap_or(0);
        let left = MARGIN + (label_chars as i32 * font * 3 / 5);
        let bottom = MARGIN + (sample_chars as i32 * font * 3 / 5);
        let right = COLORBAR_GAP + COLORBAR_WIDTH + COLORBAR_LABELS;

        let plot_width = (width as i32 - left - right).max(n_cols as i32);
        let plot_height = (height as i32 - TITLE_HEIGHT - bottom).max(n_rows as i32);
        let cell_w = plot_width as f64 / n_cols as f64;
        let cell_h = plot_height as f64 / n_rows as f64;

        let data = matrix.data();
        let vmin = data.min();
        let vmax = data.max();
        let span = vmax - vmin;
        let scale = |v: f64| if span > 0.0 { (v - vmin) / span } else { 0.0 };

        let root = SVGBackend::new(path, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let centered = Pos::new(HPos::Center, VPos::Center);
        root.draw(&Text::new(
            title.to_string(),
            (width as i32 / 2, TITLE_HEIGHT / 2),
            ("sans-serif", font_px + 8.0)
                .into_font()
                .color(&BLACK)
                .pos(centered),
        ))
        .map_err(render_err)?;

        for row in 0..n_rows {
            let y0 = TITLE_HEIGHT as f64 + row as f64 * cell_h;
            for col in 0..n_cols {
                let x0 = left as f64 + col as f64 * cell_w;
                let value = matrix.get(row, col);
                let color = self.style.palette.color(scale(value));
                root.draw(&Rectangle::new(
                    [
                        (x0 as i32, y0 as i32),
                        ((x0 + cell_w).ceil() as i32, (y0 + cell_h).ceil() as i32),
                    ],
                    color.filled(),
                ))
                .map_err(render_err)?;

                if self.style.annotate {
                    let ink = if luminance(&color) < 0.5 { &WHITE } else { &BLACK };
                    root.draw(&Text::new(
                        format_annotation(value),
                        ((x0 + cell_w / 2.0) as i32, (y0 + cell_h / 2.0) as i32),
                        ("sans-serif", font_px).into_font().color(ink).pos(centered),
                    ))
                    .map_err(render_err)?;
                }
            }

            root.draw(&Text::new(
                matrix.row_ids()[row].clone(),
                (left - 8, (y0 + cell_h / 2.0) as i32),
                ("sans-serif", font_px)
                    .into_font()
                    .color(&BLACK)
                    .pos(Pos::new(HPos::Right, VPos::Center)),
            ))
            .map_err(render_err)?;
        }

        let axis_y = TITLE_HEIGHT + plot_height + 8;
        for (col, sample) in matrix.sample_ids().iter().enumerate() {
            let x = left as f64 + (col as f64 + 0.5) * cell_w;
            root.draw(&Text::new(
                sample.clone(),
                (x as i32, axis_y),
                ("sans-serif", font_px)
                    .into_font()
                    .transform(FontTransform::Rotate270)
                    .color(&BLACK)
                    .pos(Pos::new(HPos::Right, VPos::Center)),
            ))
            .map_err(render_err)?;
        }
        root.draw(&Text::new(
            matrix.row_label().to_string(),
            (MARGIN / 2, TITLE_HEIGHT + plot_height / 2),
            ("sans-serif", font_px)
                .into_font()
                .transform(FontTransform::Rotate270)
                .color(&BLACK)
                .pos(centered),
        ))
        .map_err(render_err)?;

        // Colorbar, high values on top.
        let bar_x = left + plot_width + COLORBAR_GAP;
        let step = plot_height as f64 / COLORBAR_STEPS as f64;
        for i in 0..COLORBAR_STEPS {
            let y0 = TITLE_HEIGHT as f64 + i as f64 * step;
            let t = 1.0 - i as f64 / (COLORBAR_STEPS - 1) as f64;
            root.draw(&Rectangle::new(
                [
                    (bar_x, y0 as i32),
                    (bar_x + COLORBAR_WIDTH, (y0 + step).ceil() as i32),
                ],
                self.style.palette.color(t).filled(),
            ))
            .map_err(render_err)?;
        }
        let tick_style = ("sans-serif", font_px)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Left, VPos::Center));
        root.draw(&Text::new(
            format_annotation(vmax),
            (bar_x + COLORBAR_WIDTH + 6, TITLE_HEIGHT),
            tick_style.clone(),
        ))
        .map_err(render_err)?;
        root.draw(&Text::new(
            format_annotation(vmin),
            (bar_x + COLORBAR_WIDTH + 6, TITLE_HEIGHT + plot_height),
            tick_style,
        ))
        .map_err(render_err)?;

        root.present().map_err(render_err)?;
        debug!("Rendered {}x{} heatmap to {:?}", n_rows, n_cols, path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn create_test_matrix() -> CountMatrix {
        CountMatrix::from_triplets(
            "Lv3",
            vec!["nitrogen".into(), "iron".into()],
            vec!["S1".into(), "S2".into()],
            vec![(0, 0, 60.0), (1, 0, 15.0), (1, 1, 25.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_dimensions_have_floor() {
        assert_eq!(heatmap_dimensions(1, 1), (2000, 1000));
        assert_eq!(heatmap_dimensions(40, 15), (3000, 2000));
        assert_eq!(heatmap_dimensions(0, 0), (2000, 1000));
    }

    #[test]
    fn test_format_annotation() {
        assert_eq!(format_annotation(0.0), "0");
        assert_eq!(format_annotation(12.34), "12");
        assert_eq!(format_annotation(3.14159), "3.1");
        assert_eq!(format_annotation(0.0123), "0.012");
        assert_eq!(format_annotation(1234.0), "1.2e3");
    }

    #[test]
    fn test_renders_svg() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Lv3_heatmap.svg");
        SvgHeatmap::new(HeatmapStyle::annotated())
            .render(&create_test_matrix(), &path, "Normalized gene counts by sample and Lv3")
            .unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("nitrogen"));
        assert!(svg.contains("Normalized gene counts by sample and Lv3"));
    }

    #[test]
    fn test_unannotated_has_no_cell_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.svg");
        SvgHeatmap::default()
            .render(&create_test_matrix(), &path, "plain")
            .unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        assert!(!svg.contains(">15<"));
    }

    #[test]
    fn test_empty_matrix_is_rejected() {
        let dir = tempdir().unwrap();
        let result = SvgHeatmap::default().render(
            &CountMatrix::empty("Lv3"),
            &dir.path().join("x.svg"),
            "empty",
        );
        assert!(matches!(result, Err(ProfileError::EmptyData(_))));
    }
}
