use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;

/// Pipeline configuration from environment variables.
///
/// Everything is optional; the defaults mirror the directory layout the
/// benchmark harness's scripts have always used (`results/` + `graphs/`).
#[derive(Debug, Clone)]
pub struct Config {
    /// Where aggregated result files are written (RESULTS_DIR).
    pub results_dir: PathBuf,
    /// Where chart images are written (GRAPHS_DIR).
    pub graphs_dir: PathBuf,
    /// Optional tag appended to chart filenames (RUN_TAG).
    pub run_tag: Option<String>,
    /// Override for the hardware-thread reference line (HARDWARE_THREADS).
    pub hardware_threads: Option<u32>,
    /// Also emit vector charts next to the rasters (EMIT_SVG).
    pub emit_svg: bool,
    /// Draw ±stddev error bars (ERROR_BARS, default on).
    pub error_bars: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let hardware_threads = match env::var("HARDWARE_THREADS") {
            Ok(raw) => {
                let threads = raw.parse::<u32>().with_context(|| {
                    format!("HARDWARE_THREADS must be a positive integer, got {raw:?}")
                })?;
                if threads == 0 {
                    bail!("HARDWARE_THREADS must be a positive integer, got 0");
                }
                Some(threads)
            }
            Err(_) => None,
        };

        Ok(Config {
            results_dir: env::var("RESULTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("results")),
            graphs_dir: env::var("GRAPHS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("graphs")),
            run_tag: env::var("RUN_TAG").ok().filter(|tag| !tag.is_empty()),
            hardware_threads,
            emit_svg: flag("EMIT_SVG", false),
            error_bars: flag("ERROR_BARS", true),
        })
    }

    pub fn log_config(&self) {
        tracing::info!("📋 Configuration:");
        tracing::info!("   Results dir: {}", self.results_dir.display());
        tracing::info!("   Graphs dir:  {}", self.graphs_dir.display());
        if let Some(ref tag) = self.run_tag {
            tracing::info!("   Run tag:     {}", tag);
        }
        if let Some(threads) = self.hardware_threads {
            tracing::info!("   HW threads:  {}", threads);
        }
        tracing::info!("   SVG output:  {}", self.emit_svg);
        tracing::info!("   Error bars:  {}", self.error_bars);
    }
}

fn flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(value) => !matches!(value.as_str(), "" | "0" | "false" | "FALSE" | "False"),
        Err(_) => default,
    }
}
