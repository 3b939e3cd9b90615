use crate::plot_config::{ManagerStyle, MarkerShape, PlotConfig};
use crate::result_store::{ManagerSeries, ResultSet};
use crate::trial_key::{BenchmarkDescriptor, MetricKind};
use anyhow::{anyhow, Context, Result};
use plotters::coord::Shift;
use plotters::element::{DynElement, IntoDynElement};
use plotters::prelude::*;
use std::fs;
use std::ops::Range;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Renders per-metric comparison charts from a [`ResultSet`].
///
/// The allow-list in the injected [`PlotConfig`] decides which managers
/// are drawn and in which order; managers absent from the data are
/// silently skipped, so partial comparisons render without complaint.
pub struct PlotRenderer {
    config: PlotConfig,
}

struct SeriesData<'a> {
    style: &'a ManagerStyle,
    /// (threads, value, stddev), display-scaled.
    points: Vec<(f64, f64, f64)>,
}

impl PlotRenderer {
    pub fn new(config: PlotConfig) -> Self {
        Self { config }
    }

    /// Render one chart per metric present in the result set.
    /// Returns the emitted image paths.
    pub fn render_result_set(&self, results: &ResultSet) -> Result<Vec<PathBuf>> {
        let encoded = match results.metadata.benchmarks.last() {
            Some(encoded) => encoded,
            None => {
                warn!("result set carries no benchmark descriptor; nothing to draw");
                return Ok(Vec::new());
            }
        };
        let descriptor = BenchmarkDescriptor::decode(encoded)?;
        if results.metadata.threads.is_empty() {
            warn!("result set carries no thread counts; nothing to draw");
            return Ok(Vec::new());
        }

        let mut emitted = Vec::new();
        for (&metric, data) in &results.metrics {
            emitted.extend(self.render_metric(
                metric,
                data,
                &results.metadata.threads,
                &descriptor,
            )?);
        }
        Ok(emitted)
    }

    /// Render one metric's chart. Returns the emitted paths (empty when
    /// no allow-listed manager has data for this metric).
    pub fn render_metric(
        &self,
        metric: MetricKind,
        data: &ManagerSeries,
        threads: &[u32],
        descriptor: &BenchmarkDescriptor,
    ) -> Result<Vec<PathBuf>> {
        if threads.is_empty() {
            return Ok(Vec::new());
        }
        let series = self.collect_series(metric, data, threads);
        if series.is_empty() {
            debug!("no drawable series for {metric} ({descriptor})");
            return Ok(Vec::new());
        }

        let (x_range, y_range) = self.ranges(&series, threads);
        let caption = format!("{metric}, {}, {}", descriptor.structure, descriptor.workload);
        let stem = self.file_stem(metric, descriptor);

        fs::create_dir_all(&self.config.output_dir).with_context(|| {
            format!(
                "failed to create graph directory: {}",
                self.config.output_dir.display()
            )
        })?;

        let png = self.config.output_dir.join(format!("{stem}.png"));
        {
            let root =
                BitMapBackend::new(&png, self.config.image_size).into_drawing_area();
            self.draw_chart(&root, metric, &caption, &series, x_range.clone(), y_range.clone())
                .with_context(|| format!("failed to render {}", png.display()))?;
        }
        let mut emitted = vec![png];

        if self.config.emit_svg {
            let svg = self.config.output_dir.join(format!("{stem}.svg"));
            let root = SVGBackend::new(&svg, self.config.image_size).into_drawing_area();
            self.draw_chart(&root, metric, &caption, &series, x_range, y_range)
                .with_context(|| format!("failed to render {}", svg.display()))?;
            emitted.push(svg);
        }
        Ok(emitted)
    }

    /// Walk the allow-list in display order and pick up whatever series
    /// the data has. Managers without data and threads without points
    /// are dropped without error.
    fn collect_series<'a>(
        &'a self,
        metric: MetricKind,
        data: &ManagerSeries,
        threads: &[u32],
    ) -> Vec<SeriesData<'a>> {
        let divisor = metric.display_divisor();
        let mut series = Vec::new();
        for style in &self.config.styles {
            if !self.config.includes(&style.key, metric) {
                continue;
            }
            let by_thread = match data.get(&style.key) {
                Some(by_thread) => by_thread,
                None => continue,
            };
            let mut points = Vec::new();
            for &thread_count in threads {
                match by_thread.get(&thread_count) {
                    Some(point) => points.push((
                        thread_count as f64,
                        point.mean / divisor,
                        point.stddev / divisor,
                    )),
                    None => debug!(
                        "{}: no {metric} point at {thread_count} threads",
                        style.key
                    ),
                }
            }
            if !points.is_empty() {
                series.push(SeriesData { style, points });
            }
        }
        series
    }

    fn ranges(
        &self,
        series: &[SeriesData<'_>],
        threads: &[u32],
    ) -> (Range<f64>, Range<f64>) {
        let x_min = threads[0] as f64;
        let x_max = threads[threads.len() - 1] as f64;
        let x_pad = ((x_max - x_min) * 0.04).max(0.5);

        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for entry in series {
            for &(_, value, stddev) in &entry.points {
                let spread = if self.config.error_bars { stddev } else { 0.0 };
                y_min = y_min.min(value - spread);
                y_max = y_max.max(value + spread);
            }
        }
        let span = y_max - y_min;
        let y_pad = if span > 0.0 {
            span * 0.08
        } else {
            y_max.abs().max(1.0) * 0.1
        };

        (
            x_min - x_pad..x_max + x_pad,
            y_min - y_pad..y_max + y_pad,
        )
    }

    fn hardware_threads(&self) -> Option<u32> {
        self.config.hardware_threads.or_else(|| {
            std::thread::available_parallelism()
                .ok()
                .map(|count| count.get() as u32)
        })
    }

    fn file_stem(&self, metric: MetricKind, descriptor: &BenchmarkDescriptor) -> String {
        let mut stem = format!("{metric}-{}", slug(&descriptor.encode()));
        if let Some(tag) = &self.config.run_tag {
            stem.push('.');
            stem.push_str(tag);
        }
        stem
    }

    fn draw_chart<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        metric: MetricKind,
        caption: &str,
        series: &[SeriesData<'_>],
        x_range: Range<f64>,
        y_range: Range<f64>,
    ) -> Result<()> {
        root.fill(&WHITE).map_err(draw_err)?;
        let mut chart = ChartBuilder::on(root)
            .caption(caption, ("sans-serif", 22))
            .margin(12)
            .x_label_area_size(44)
            .y_label_area_size(64)
            .build_cartesian_2d(x_range.clone(), y_range.clone())
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc("Number of threads")
            .y_desc(y_label(metric))
            .draw()
            .map_err(draw_err)?;

        if let Some(hardware) = self.hardware_threads() {
            let x = hardware as f64;
            if x_range.contains(&x) {
                chart
                    .draw_series(std::iter::once(PathElement::new(
                        vec![(x, y_range.start), (x, y_range.end)],
                        BLACK.mix(0.4),
                    )))
                    .map_err(draw_err)?;
            } else {
                debug!("hardware thread count {hardware} outside the plotted domain");
            }
        }

        for entry in series {
            let color = entry.style.color;
            let line: Vec<(f64, f64)> =
                entry.points.iter().map(|&(x, y, _)| (x, y)).collect();
            chart
                .draw_series(LineSeries::new(line, color.stroke_width(2)))
                .map_err(draw_err)?
                .label(entry.style.label.clone())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
                });

            chart
                .draw_series(
                    entry
                        .points
                        .iter()
                        .map(|&(x, y, _)| marker_element::<DB>(entry.style.marker, (x, y), color)),
                )
                .map_err(draw_err)?;

            if self.config.error_bars {
                chart
                    .draw_series(
                        entry
                            .points
                            .iter()
                            .filter(|&&(_, _, stddev)| stddev > 0.0)
                            .map(|&(x, y, stddev)| {
                                ErrorBar::new_vertical(
                                    x,
                                    y - stddev,
                                    y,
                                    y + stddev,
                                    color.stroke_width(1),
                                    6,
                                )
                            }),
                    )
                    .map_err(draw_err)?;
            }
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        Ok(())
    }
}

fn draw_err<E: std::fmt::Display>(err: E) -> anyhow::Error {
    anyhow!("chart rendering failed: {err}")
}

fn y_label(metric: MetricKind) -> &'static str {
    match metric {
        MetricKind::Throughput => "Throughput (Mop/s)",
        MetricKind::Allocated => "Extra nodes (Thousands)",
        MetricKind::Retired => "Retired nodes (Thousands)",
    }
}

/// Lowercased text with every non-alphanumeric run collapsed to one '-'.
fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

fn marker_element<DB: DrawingBackend>(
    shape: MarkerShape,
    at: (f64, f64),
    color: RGBColor,
) -> DynElement<'static, DB, (f64, f64)> {
    let fill = color.filled();
    let stroke = color.stroke_width(2);
    match shape {
        MarkerShape::Circle => {
            (EmptyElement::at(at) + Circle::new((0, 0), 4, fill)).into_dyn()
        }
        MarkerShape::Square => {
            (EmptyElement::at(at) + Rectangle::new([(-4, -4), (4, 4)], fill)).into_dyn()
        }
        MarkerShape::Diamond => (EmptyElement::at(at)
            + Polygon::new(vec![(0, -5), (5, 0), (0, 5), (-5, 0)], fill))
        .into_dyn(),
        MarkerShape::TriangleUp => {
            (EmptyElement::at(at) + Polygon::new(vec![(-5, 4), (5, 4), (0, -5)], fill)).into_dyn()
        }
        MarkerShape::TriangleDown => {
            (EmptyElement::at(at) + Polygon::new(vec![(-5, -4), (5, -4), (0, 5)], fill)).into_dyn()
        }
        MarkerShape::TriangleLeft => {
            (EmptyElement::at(at) + Polygon::new(vec![(4, -5), (4, 5), (-5, 0)], fill)).into_dyn()
        }
        MarkerShape::TriangleRight => {
            (EmptyElement::at(at) + Polygon::new(vec![(-4, -5), (-4, 5), (5, 0)], fill)).into_dyn()
        }
        MarkerShape::Cross => {
            (EmptyElement::at(at) + Cross::new((0, 0), 4, stroke)).into_dyn()
        }
        MarkerShape::Plus => (EmptyElement::at(at)
            + PathElement::new(vec![(-5, 0), (5, 0)], stroke)
            + PathElement::new(vec![(0, -5), (0, 5)], stroke))
        .into_dyn(),
        MarkerShape::Star => (EmptyElement::at(at)
            + Cross::new((0, 0), 4, stroke)
            + PathElement::new(vec![(-5, 0), (5, 0)], stroke)
            + PathElement::new(vec![(0, -5), (0, 5)], stroke))
        .into_dyn(),
        MarkerShape::Tick => {
            (EmptyElement::at(at) + PathElement::new(vec![(0, -6), (0, 6)], stroke)).into_dyn()
        }
    }
}
