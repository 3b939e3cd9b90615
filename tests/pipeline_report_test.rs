/// End-to-end pipeline test: parse an embedded benchmark log, aggregate
/// the repeats, persist the result set, render the charts, and check the
/// artifacts on disk. Output goes to a per-process temp directory that is
/// removed at the end.
use std::fs;
use std::path::PathBuf;

use bench_analyzer::config::Config;
use bench_analyzer::parser_dialect::ParserDialect;
use bench_analyzer::plot_config::PlotConfig;
use bench_analyzer::report_pipeline::run_report;
use bench_analyzer::result_store::ResultSet;
use bench_analyzer::trial_key::MetricKind;

const SAMPLE_LOG: &str = "\
Testing:  1 threads for 5 seconds on ObjRetire:u10:range=200K:prefill=100K with NatarajanTree
Using flags:
emptyf = \"2\"
epochf = \"10\"
tracker = \"RCU\"
Prefilled 100000
Gets:90 Updates:10 RQs: 0
Average allocated nodes: 150000.0
Throughput: 12.500000 Mop/s
Testing:  1 threads for 5 seconds on ObjRetire:u10:range=200K:prefill=100K with NatarajanTree
tracker = \"RCU\"
Prefilled 100000
Gets:90 Updates:10 RQs: 0
Average allocated nodes: 150000.0
Throughput: 13.000000 Mop/s
Testing:  1 threads for 5 seconds on ObjRetire:u10:range=200K:prefill=100K with NatarajanTree
tracker = \"RCU\"
Prefilled 100000
Gets:90 Updates:10 RQs: 0
Average allocated nodes: 150000.0
Throughput: 11.500000 Mop/s
Testing:  1 threads for 5 seconds on ObjRetire:u10:range=200K:prefill=100K with NatarajanTree
tracker = \"NIL\"
Prefilled 100000
Gets:90 Updates:10 RQs: 0
Average allocated nodes: 152000.0
Throughput: 15.000000 Mop/s
Testing:  4 threads for 5 seconds on ObjRetire:u10:range=200K:prefill=100K with NatarajanTree
tracker = \"RCU\"
Prefilled 100000
Gets:90 Updates:10 RQs: 0
Average allocated nodes: 151000.0
Throughput: 40.000000 Mop/s
Testing:  4 threads for 5 seconds on ObjRetire:u10:range=200K:prefill=100K with NatarajanTree
tracker = \"NIL\"
Prefilled 100000
Gets:90 Updates:10 RQs: 0
Average allocated nodes: 153000.0
Throughput: 48.000000 Mop/s
";

struct TestDirs {
    root: PathBuf,
    config: Config,
}

fn setup(name: &str) -> TestDirs {
    let root = std::env::temp_dir().join(format!(
        "bench_analyzer_pipeline_{}_{}",
        name,
        std::process::id()
    ));
    fs::create_dir_all(&root).expect("failed to create temp dir");
    let config = Config {
        results_dir: root.join("results"),
        graphs_dir: root.join("graphs"),
        run_tag: None,
        hardware_threads: Some(4),
        emit_svg: false,
        error_bars: true,
    };
    TestDirs { root, config }
}

fn write_log(dirs: &TestDirs) -> PathBuf {
    let log_path = dirs.root.join("exp-bst-100K-10.out");
    fs::write(&log_path, SAMPLE_LOG).expect("failed to write sample log");
    log_path
}

#[test]
fn test_pipeline_produces_results_and_charts() {
    let dirs = setup("full");
    let log_path = write_log(&dirs);

    let summary = run_report(
        &log_path,
        &dirs.config,
        &ParserDialect::default(),
        &PlotConfig::default(),
    )
    .expect("pipeline failed");

    // 2 managers x 2 thread counts x 3 metrics
    assert_eq!(summary.trial_keys, 12);
    assert_eq!(
        summary.json_path,
        dirs.config.results_dir.join("exp-bst-100K-10.json")
    );

    let results = ResultSet::load_json(&summary.json_path).expect("failed to reload");
    assert_eq!(results.metadata.threads, vec![1, 4]);
    assert_eq!(
        results.metadata.memory_managers,
        vec!["RCU".to_string(), "NIL".to_string()]
    );
    assert_eq!(results.metadata.structure, "NatarajanTree");
    assert_eq!(
        results.metadata.benchmarks,
        vec!["NatarajanTree, size:100000, Gets:90 Updates:10 RQs: 0".to_string()]
    );

    // three repeats at one thread: mean of {12.5, 13.0, 11.5}
    let throughput = results.metric(MetricKind::Throughput).unwrap();
    let repeated = throughput["RCU"][&1];
    assert_eq!(repeated.samples, 3);
    assert!((repeated.mean - 12.333_333).abs() < 1e-6);
    assert!((repeated.stddev - 0.623_610).abs() < 1e-3);

    // identical allocations every repeat: retired is exact with zero spread
    let retired = results.metric(MetricKind::Retired).unwrap();
    assert_eq!(retired["RCU"][&1].mean, -50_005.0);
    assert_eq!(retired["RCU"][&1].stddev, 0.0);

    // stored values stay raw; scaling is display-only
    let allocated = results.metric(MetricKind::Allocated).unwrap();
    assert_eq!(allocated["RCU"][&4].mean, 151_000.0);

    // one raster per metric, named deterministically
    let slug = "natarajantree-size-100000-gets-90-updates-10-rqs-0";
    for metric in ["allocated", "throughput", "retired"] {
        let image = dirs.config.graphs_dir.join(format!("{metric}-{slug}.png"));
        assert!(
            summary.images.contains(&image),
            "missing chart {}",
            image.display()
        );
        assert!(image.exists(), "chart not on disk: {}", image.display());
    }

    fs::remove_dir_all(&dirs.root).ok();
}

#[test]
fn test_serialization_is_stable_across_runs() {
    let dirs = setup("stable");
    let log_path = write_log(&dirs);
    let dialect = ParserDialect::default();
    let plot = PlotConfig::default();

    let first = run_report(&log_path, &dirs.config, &dialect, &plot).expect("first run failed");
    let first_json = fs::read_to_string(&first.json_path).expect("missing json");

    // rerun overwrites the same artifacts with identical content
    let second = run_report(&log_path, &dirs.config, &dialect, &plot).expect("second run failed");
    let second_json = fs::read_to_string(&second.json_path).expect("missing json");

    assert_eq!(first.json_path, second.json_path);
    assert_eq!(first_json, second_json);
    assert_eq!(first.images, second.images);

    fs::remove_dir_all(&dirs.root).ok();
}

#[test]
fn test_reduced_style_table_renders_partial_comparison() {
    use bench_analyzer::plot_config::{ManagerStyle, MarkerShape, TAB_BLUE, TAB_GREEN};

    let dirs = setup("partial");
    let log_path = write_log(&dirs);

    // Range_new is allow-listed but never appears in this log; RCU does.
    // NIL is discovered but not allow-listed, so it never renders.
    let plot = PlotConfig::new().with_styles(vec![
        ManagerStyle::new("Range_new", "IBR", TAB_GREEN, MarkerShape::TriangleUp),
        ManagerStyle::new("RCU", "EBR", TAB_BLUE, MarkerShape::Circle),
    ]);

    let summary = run_report(&log_path, &dirs.config, &ParserDialect::default(), &plot)
        .expect("pipeline failed");
    assert_eq!(summary.images.len(), 3);

    fs::remove_dir_all(&dirs.root).ok();
}

#[test]
fn test_malformed_numeric_line_aborts_the_run() {
    let dirs = setup("malformed");
    let log_path = dirs.root.join("broken.out");
    fs::write(&log_path, "Prefilled lots of elements\n").expect("failed to write log");

    let err = run_report(
        &log_path,
        &dirs.config,
        &ParserDialect::default(),
        &PlotConfig::default(),
    )
    .unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("Prefilled lots of elements"));

    fs::remove_dir_all(&dirs.root).ok();
}
