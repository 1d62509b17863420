//! Metric printing and confusion-matrix heatmap rendering using Plotters

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::eval::{ConfusionMatrix, Evaluation};

/// Tick labels along the predicted (x) axis, left to right.
///
/// These read "Survived" first although column 0 holds label 0 (did not
/// survive). Kept as-is to match the established report output.
pub const X_TICK_LABELS: [&str; 2] = ["Survived", "Not Survived"];

/// Tick labels along the actual (y) axis, top to bottom
pub const Y_TICK_LABELS: [&str; 2] = ["Not Survived", "Survived"];

/// Heatmap size in pixels (10 x 7 inches at 100 dpi)
const FIGURE_SIZE: (u32, u32) = (1000, 700);

/// Colour for the smallest count
const LOW_COLOR: RGBColor = RGBColor(40, 11, 54);
/// Colour for the largest count
const HIGH_COLOR: RGBColor = RGBColor(250, 235, 221);

/// Print accuracy and the confusion matrix to stdout
pub fn print_metrics(evaluation: &Evaluation) {
    println!("Accuracy: {:.2}%", evaluation.accuracy * 100.0);
    println!("Confusion Matrix:\n{}", evaluation.confusion);
}

/// Print metrics and, when `output_path` is given, render the heatmap.
///
/// Rendering failures are logged and swallowed so the printed metrics are
/// never lost. Returns whether a heatmap was written.
pub fn report(evaluation: &Evaluation, output_path: Option<&Path>) -> bool {
    print_metrics(evaluation);

    let Some(path) = output_path else {
        return false;
    };

    match render_heatmap(&evaluation.confusion, path) {
        Ok(()) => {
            info!(path = %path.display(), "confusion matrix heatmap saved");
            true
        }
        Err(err) => {
            warn!(error = %err, "could not render confusion matrix heatmap");
            false
        }
    }
}

/// Render `matrix` as an annotated heatmap PNG.
pub fn render_heatmap(matrix: &ConfusionMatrix, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            return Err(PipelineError::Plot(format!(
                "output directory {} does not exist",
                parent.display()
            )));
        }
    }

    let root = BitMapBackend::new(output_path, FIGURE_SIZE).into_drawing_area();
    draw_heatmap(&root, matrix)?;
    root.present().map_err(plot_error)?;
    Ok(())
}

/// Draw the annotated heatmap onto `root`.
///
/// Row 0 of the matrix is drawn at the top, as in a printed matrix.
fn draw_heatmap<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, matrix: &ConfusionMatrix) -> Result<()> {
    let counts = matrix.counts();
    let n_rows = counts.nrows() as i32;
    let n_cols = counts.ncols() as i32;
    let max_count = matrix.max_count();

    root.fill(&WHITE).map_err(plot_error)?;

    let x_label = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(i) => tick_label(&X_TICK_LABELS, *i),
        _ => String::new(),
    };
    // y grows upwards, so the top segment is the first tick label
    let y_label = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(i) => tick_label(&Y_TICK_LABELS, n_rows - 1 - *i),
        _ => String::new(),
    };

    // Integer ranges are inclusive once segmented: 0..n-1 gives n segments
    let mut chart = ChartBuilder::on(root)
        .caption("Confusion Matrix", ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(120)
        .build_cartesian_2d((0..n_cols - 1).into_segmented(), (0..n_rows - 1).into_segmented())
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Predicted Values")
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .axis_desc_style(("sans-serif", 18))
        .label_style(("sans-serif", 16))
        .draw()
        .map_err(plot_error)?;

    for ((row, col), &count) in counts.indexed_iter() {
        let x = col as i32;
        let y = n_rows - 1 - row as i32;
        let fill = cell_color(count, max_count);

        chart
            .draw_series(std::iter::once(Rectangle::new(
                [
                    (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
                ],
                fill.filled(),
            )))
            .map_err(plot_error)?;

        let text_color = if luminance(&fill) > 0.5 { BLACK } else { WHITE };
        let style = TextStyle::from(("sans-serif", 28).into_font())
            .color(&text_color)
            .pos(Pos::new(HPos::Center, VPos::Center));
        chart
            .draw_series(std::iter::once(Text::new(
                count.to_string(),
                (SegmentValue::CenterOf(x), SegmentValue::CenterOf(y)),
                style,
            )))
            .map_err(plot_error)?;
    }

    Ok(())
}

/// Linear blend from [`LOW_COLOR`] to [`HIGH_COLOR`] by `count / max`
pub fn cell_color(count: usize, max: usize) -> RGBColor {
    let t = if max == 0 {
        0.0
    } else {
        (count as f64 / max as f64).clamp(0.0, 1.0)
    };
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(
        lerp(LOW_COLOR.0, HIGH_COLOR.0),
        lerp(LOW_COLOR.1, HIGH_COLOR.1),
        lerp(LOW_COLOR.2, HIGH_COLOR.2),
    )
}

/// Relative luminance in [0, 1]
fn luminance(color: &RGBColor) -> f64 {
    (0.2126 * color.0 as f64 + 0.7152 * color.1 as f64 + 0.0722 * color.2 as f64) / 255.0
}

fn tick_label(labels: &[&str], idx: i32) -> String {
    usize::try_from(idx)
        .ok()
        .and_then(|i| labels.get(i))
        .map(|s| s.to_string())
        .unwrap_or_default()
}

fn plot_error<E: std::fmt::Display>(err: E) -> PipelineError {
    PipelineError::Plot(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::tempdir;

    fn create_test_evaluation() -> Evaluation {
        let actual = array![0, 0, 1, 1, 0];
        let predicted = array![0, 1, 1, 1, 0];
        let confusion = ConfusionMatrix::new(&actual, &predicted).unwrap();
        Evaluation {
            accuracy: 0.8,
            confusion,
            predictions: predicted,
        }
    }

    #[test]
    fn test_cell_color_endpoints() {
        assert_eq!(cell_color(0, 10), LOW_COLOR);
        assert_eq!(cell_color(10, 10), HIGH_COLOR);
        assert_eq!(cell_color(3, 0), LOW_COLOR);
        assert!(luminance(&cell_color(10, 10)) > 0.5);
        assert!(luminance(&cell_color(0, 10)) < 0.5);
    }

    #[test]
    fn test_tick_labels() {
        assert_eq!(tick_label(&X_TICK_LABELS, 0), "Survived");
        assert_eq!(tick_label(&Y_TICK_LABELS, 1), "Survived");
        assert_eq!(tick_label(&Y_TICK_LABELS, -1), "");
        assert_eq!(tick_label(&Y_TICK_LABELS, 2), "");
    }

    #[test]
    fn test_report_without_plot() {
        let evaluation = create_test_evaluation();
        assert!(!report(&evaluation, None));
    }

    #[test]
    fn test_report_survives_unwritable_path() {
        let evaluation = create_test_evaluation();
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("missing_dir").join("heatmap.png");

        // Must not panic or propagate; the metrics were already printed
        assert!(!report(&evaluation, Some(&path)));
    }

    fn pixel(buffer: &[u8], x: u32, y: u32) -> RGBColor {
        let idx = ((y * FIGURE_SIZE.0 + x) * 3) as usize;
        RGBColor(buffer[idx], buffer[idx + 1], buffer[idx + 2])
    }

    #[test]
    fn test_cells_fill_plot_area() {
        let actual = array![0, 0, 0, 1, 1];
        let predicted = array![0, 0, 1, 0, 1];
        let matrix = ConfusionMatrix::new(&actual, &predicted).unwrap();
        assert_eq!(matrix.counts(), &array![[2, 1], [1, 1]]);

        let mut buffer = vec![0u8; (FIGURE_SIZE.0 * FIGURE_SIZE.1 * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, FIGURE_SIZE).into_drawing_area();
            draw_heatmap(&root, &matrix).unwrap();
            root.present().unwrap();
        }

        // One sample per quadrant of the plot area, clear of the count labels
        let low = cell_color(1, 2);
        assert_eq!(pixel(&buffer, 250, 160), HIGH_COLOR);
        assert_eq!(pixel(&buffer, 900, 160), low);
        assert_eq!(pixel(&buffer, 250, 590), low);
        assert_eq!(pixel(&buffer, 900, 590), low);
    }

    #[test]
    fn test_render_heatmap_writes_png() {
        let matrix = ConfusionMatrix::new(&array![0, 1, 1], &array![0, 1, 0]).unwrap();
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("heatmap.png");

        render_heatmap(&matrix, &path).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }
}
