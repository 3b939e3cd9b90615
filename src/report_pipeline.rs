use crate::aggregator::aggregate;
use crate::config::Config;
use crate::log_parser;
use crate::parser_dialect::ParserDialect;
use crate::plot_config::PlotConfig;
use crate::plot_renderer::PlotRenderer;
use crate::result_store::ResultSet;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// What one pipeline run produced.
#[derive(Debug)]
pub struct ReportSummary {
    pub trial_keys: usize,
    pub json_path: PathBuf,
    pub images: Vec<PathBuf>,
}

/// Run the staged pipeline for one complete log file:
/// parse -> aggregate -> store -> render.
///
/// The ambient [`Config`] supplies output locations and toggles; the
/// [`PlotConfig`] supplies the display table. Each stage finishes before
/// the next starts, and any stage failure aborts the run — a partial
/// comparison must never be published as if it were complete.
pub fn run_report(
    log_path: &Path,
    config: &Config,
    dialect: &ParserDialect,
    plot: &PlotConfig,
) -> Result<ReportSummary> {
    info!("📊 analyzing {}", log_path.display());
    let parsed = log_parser::parse_file(log_path, dialect)?;
    info!(
        "parsed {} trial keys across {} thread counts and {} managers",
        parsed.observations.len(),
        parsed.threads.len(),
        parsed.memory_managers.len()
    );

    let aggregated = aggregate(parsed)?;
    let trial_keys = aggregated.records.len();
    let results = ResultSet::from_aggregated(&aggregated);

    fs::create_dir_all(&config.results_dir).with_context(|| {
        format!(
            "failed to create results directory: {}",
            config.results_dir.display()
        )
    })?;
    let stem = log_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("results");
    let json_path = config.results_dir.join(format!("{stem}.json"));
    results.save_json(&json_path)?;
    info!("stored {}", json_path.display());

    let mut plot = plot.clone();
    plot.output_dir = config.graphs_dir.clone();
    plot.run_tag = config.run_tag.clone();
    plot.emit_svg = config.emit_svg;
    plot.error_bars = config.error_bars;
    if let Some(threads) = config.hardware_threads {
        plot.hardware_threads = Some(threads);
    }
    let images = PlotRenderer::new(plot).render_result_set(&results)?;
    info!("rendered {} chart(s)", images.len());

    Ok(ReportSummary {
        trial_keys,
        json_path,
        images,
    })
}
