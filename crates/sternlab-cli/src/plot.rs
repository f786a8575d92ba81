//! SVG box plots of one variable across timepoints
//!
//! Whiskers reach the most extreme values inside the 1.5 IQR fences; values
//! beyond them are drawn as points. Each box is annotated with its mean.

use std::path::{Path, PathBuf};

use plotters::prelude::*;
use sternlab_analysis::pipeline::BoxplotSeries;
use sternlab_stats::{descriptive::DescriptiveStats, quantile::IqrFences};

const SIZE: (u32, u32) = (960, 640);
const HALF_WIDTH: f64 = 0.3;
const WHISKER_FENCE: f64 = 1.5;
const BOX_COLORS: [RGBColor; 3] = [
    RGBColor(173, 216, 230),
    RGBColor(144, 238, 144),
    RGBColor(240, 128, 128),
];

struct BoxStats {
    q1: f64,
    median: f64,
    q3: f64,
    whisker_low: f64,
    whisker_high: f64,
    mean: f64,
    fliers: Vec<f64>,
}

impl BoxStats {
    fn new(values: &[f64]) -> Option<Self> {
        let stats = DescriptiveStats::new(values.iter().copied())?;
        let fences = IqrFences::new(values, WHISKER_FENCE)?;
        let inside = values
            .iter()
            .copied()
            .filter(|v| (fences.lower..=fences.upper).contains(v));
        let (whisker_low, whisker_high) = inside.fold((fences.q1, fences.q3), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        let fliers = values
            .iter()
            .copied()
            .filter(|v| !(fences.lower..=fences.upper).contains(v))
            .collect();
        Some(Self {
            q1: fences.q1,
            median: stats.median,
            q3: fences.q3,
            whisker_low,
            whisker_high,
            mean: stats.mean,
            fliers,
        })
    }
}

/// File name of a variable's box plot inside the plot directory
pub fn boxplot_path(dir: &Path, variable: &str) -> PathBuf {
    let name = variable.replace(['/', '\\'], "_");
    dir.join(format!("boxplot_{name}.svg"))
}

#[expect(clippy::cast_precision_loss)]
pub fn draw_boxplot(path: &Path, series: &BoxplotSeries) -> anyhow::Result<()> {
    let boxes = series
        .groups
        .iter()
        .filter_map(|(tp, values)| Some((tp.tag(), BoxStats::new(values)?)))
        .collect::<Vec<_>>();
    if boxes.is_empty() {
        anyhow::bail!("No values to plot for {}", series.variable);
    }

    let (y_min, y_max) = series
        .groups
        .iter()
        .flat_map(|(_, values)| values)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    let pad = ((y_max - y_min) * 0.1).max(1e-6);
    let labels = boxes.iter().map(|(label, _)| *label).collect::<Vec<_>>();

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Boxplot - {}", series.variable), ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5..(boxes.len() as f64 - 0.5), (y_min - pad)..(y_max + pad))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Timepoint")
        .y_desc(series.variable.as_str())
        .x_labels(boxes.len())
        .x_label_formatter(&|x| group_label(&labels, *x))
        .draw()?;

    for (i, (_, stats)) in boxes.iter().enumerate() {
        let center = i as f64;
        let (left, right) = (center - HALF_WIDTH, center + HALF_WIDTH);
        let color = BOX_COLORS[i % BOX_COLORS.len()];

        chart.draw_series(std::iter::once(Rectangle::new(
            [(left, stats.q1), (right, stats.q3)],
            color.filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(left, stats.q1), (right, stats.q3)],
            BLACK.stroke_width(1),
        )))?;
        chart.draw_series([
            PathElement::new(
                vec![(left, stats.median), (right, stats.median)],
                BLACK.stroke_width(2),
            ),
            PathElement::new(
                vec![(center, stats.q3), (center, stats.whisker_high)],
                BLACK.stroke_width(1),
            ),
            PathElement::new(
                vec![(center, stats.q1), (center, stats.whisker_low)],
                BLACK.stroke_width(1),
            ),
            PathElement::new(
                vec![
                    (center - HALF_WIDTH / 2.0, stats.whisker_high),
                    (center + HALF_WIDTH / 2.0, stats.whisker_high),
                ],
                BLACK.stroke_width(1),
            ),
            PathElement::new(
                vec![
                    (center - HALF_WIDTH / 2.0, stats.whisker_low),
                    (center + HALF_WIDTH / 2.0, stats.whisker_low),
                ],
                BLACK.stroke_width(1),
            ),
        ])?;
        chart.draw_series(
            stats
                .fliers
                .iter()
                .map(|v| Circle::new((center, *v), 3, BLACK.stroke_width(1))),
        )?;
        chart.draw_series(std::iter::once(Circle::new(
            (center, stats.mean),
            4,
            RED.filled(),
        )))?;
        chart.draw_series(std::iter::once(Text::new(
            format!("Mean: {:.3}", stats.mean),
            (center + 0.05, stats.mean),
            ("sans-serif", 14),
        )))?;
    }

    root.present()?;
    Ok(())
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn group_label(labels: &[&str], x: f64) -> String {
    let index = x.round();
    if index < 0.0 {
        return String::new();
    }
    labels
        .get(index as usize)
        .map_or_else(String::new, |label| (*label).to_owned())
}
