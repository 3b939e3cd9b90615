use std::path::Path;

use bench_analyzer::config::Config;
use bench_analyzer::parser_dialect::ParserDialect;
use bench_analyzer::plot_config::PlotConfig;
use bench_analyzer::report_pipeline;
use tracing::{error, info};

fn main() {
    tracing_subscriber::fmt::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Configuration error: {e:#}");
            error!("💡 Supported variables: RESULTS_DIR, GRAPHS_DIR, RUN_TAG, HARDWARE_THREADS, EMIT_SVG, ERROR_BARS");
            std::process::exit(1);
        }
    };
    config.log_config();

    let logs: Vec<String> = std::env::args().skip(1).collect();
    if logs.is_empty() {
        error!("usage: bench-report <benchmark-log>...");
        std::process::exit(1);
    }

    let dialect = ParserDialect::default();
    let plot = PlotConfig::default();

    for log in &logs {
        match report_pipeline::run_report(Path::new(log), &config, &dialect, &plot) {
            Ok(summary) => info!(
                "{}: {} trial keys -> {} and {} image(s)",
                log,
                summary.trial_keys,
                summary.json_path.display(),
                summary.images.len()
            ),
            Err(e) => {
                // an aborted run must not leave a misleading partial report
                error!("{log}: {e:#}");
                std::process::exit(1);
            }
        }
    }
}
