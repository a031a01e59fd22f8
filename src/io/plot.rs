//! Line charts of per-patch error series

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};

use crate::io::configuration::{
    PLOT_CAPTION_SIZE, PLOT_DIMENSIONS, PLOT_FONT_FAMILY, PLOT_MARKER_RADIUS,
};
use crate::io::error::{MaeError, PathContext, Result};

/// Title and axis labels for one chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotLabels {
    /// Chart caption
    pub title: &'static str,
    /// Horizontal axis description
    pub x_label: &'static str,
    /// Vertical axis description
    pub y_label: &'static str,
}

impl PlotLabels {
    /// Overlay vs original over every patch
    pub const OVERLAY: Self = Self {
        title: "Mean Squared Error for Each Patch: mask_img vs ori_img",
        x_label: "Patch Index",
        y_label: "MSE",
    };

    /// Reconstruction vs original over every patch
    pub const RECONSTRUCTED: Self = Self {
        title: "Mean Squared Error for Each Patch: rec_img vs ori_img",
        x_label: "Patch Index",
        y_label: "MSE",
    };

    /// Overlay vs original over masked patches
    pub const MASKED_OVERLAY: Self = Self {
        title: "MSE for Masked Patches: mask_img vs ori_img",
        x_label: "Masked Patch Index",
        y_label: "MSE",
    };

    /// Reconstruction vs original over masked patches
    pub const MASKED_RECONSTRUCTED: Self = Self {
        title: "MSE for Masked Patches: rec_img vs ori_img",
        x_label: "Masked Patch Index",
        y_label: "MSE",
    };
}

fn plot_error(path: &Path) -> impl Fn(&dyn std::fmt::Display) -> MaeError {
    move |e| MaeError::Plot {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

static EMBEDDED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
static FONT_REGISTERED: OnceLock<bool> = OnceLock::new();

/// Register the bundled DejaVu Sans as the plot font family
///
/// Idempotent. With the `fonts` feature plotters resolves the family
/// through the system font database instead and this registration is unused.
///
/// # Errors
///
/// Returns an error if the bundled font cannot be parsed
pub fn register_plot_font() -> Result<()> {
    let registered = *FONT_REGISTERED.get_or_init(|| {
        register_font(PLOT_FONT_FAMILY, FontStyle::Normal, EMBEDDED_FONT).is_ok()
    });
    if registered {
        Ok(())
    } else {
        Err(MaeError::Plot {
            path: PathBuf::from("assets/fonts/DejaVuSans.ttf"),
            reason: "bundled font is not a valid TrueType file".to_string(),
        })
    }
}

// Flat or empty series still need a non-degenerate axis
fn axis_ranges(values: &[f32]) -> (f32, f32) {
    let x_max = values.len().saturating_sub(1).max(1) as f32;
    let peak = values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .fold(0.0_f32, f32::max);
    let y_max = if peak > 0.0 { peak * 1.05 } else { 1.0 };
    (x_max, y_max)
}

/// Draw `values` against their index as a marked line chart in a PNG
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the chart
/// cannot be rendered or written
pub fn plot_series(values: &[f32], path: &Path, labels: &PlotLabels) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_path(parent, "create directory")?;
    }
    register_plot_font()?;
    let fail = plot_error(path);
    let (x_max, y_max) = axis_ranges(values);

    let root = BitMapBackend::new(path, PLOT_DIMENSIONS).into_drawing_area();
    root.fill(&WHITE).map_err(|e| fail(&e))?;

    {
        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .caption(labels.title, (PLOT_FONT_FAMILY, PLOT_CAPTION_SIZE))
            .set_label_area_size(LabelAreaPosition::Left, 80)
            .set_label_area_size(LabelAreaPosition::Bottom, 60)
            .build_cartesian_2d(0.0_f32..x_max, 0.0_f32..y_max)
            .map_err(|e| fail(&e))?;

        chart
            .configure_mesh()
            .x_desc(labels.x_label)
            .y_desc(labels.y_label)
            .draw()
            .map_err(|e| fail(&e))?;

        let points: Vec<(f32, f32)> = values
            .iter()
            .enumerate()
            .map(|(index, &value)| (index as f32, value))
            .collect();

        chart
            .draw_series(LineSeries::new(points.iter().copied(), &BLUE))
            .map_err(|e| fail(&e))?;
        chart
            .draw_series(
                points
                    .iter()
                    .map(|&point| Circle::new(point, PLOT_MARKER_RADIUS, BLUE.filled())),
            )
            .map_err(|e| fail(&e))?;
    }

    root.present().map_err(|e| fail(&e))
}
