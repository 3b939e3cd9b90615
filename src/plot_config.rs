use crate::trial_key::MetricKind;
use once_cell::sync::Lazy;
use plotters::style::RGBColor;
use std::path::PathBuf;

/// Marker drawn at each data point of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Circle,
    Square,
    Diamond,
    TriangleUp,
    TriangleDown,
    TriangleLeft,
    TriangleRight,
    Cross,
    Plus,
    Star,
    Tick,
}

/// Display row for one allow-listed memory manager.
#[derive(Debug, Clone)]
pub struct ManagerStyle {
    /// Manager literal as it appears in the logs.
    pub key: String,
    /// Human-readable legend label.
    pub label: String,
    pub color: RGBColor,
    pub marker: MarkerShape,
}

impl ManagerStyle {
    pub fn new(key: &str, label: &str, color: RGBColor, marker: MarkerShape) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            color,
            marker,
        }
    }
}

// The tableau palette the harness's charts have always used.
pub const TAB_BLUE: RGBColor = RGBColor(31, 119, 180);
pub const TAB_ORANGE: RGBColor = RGBColor(255, 127, 14);
pub const TAB_GREEN: RGBColor = RGBColor(44, 160, 44);
pub const TAB_RED: RGBColor = RGBColor(214, 39, 40);
pub const TAB_PURPLE: RGBColor = RGBColor(148, 103, 189);
pub const TAB_BROWN: RGBColor = RGBColor(140, 86, 75);
pub const TAB_PINK: RGBColor = RGBColor(227, 119, 194);
pub const TAB_GRAY: RGBColor = RGBColor(127, 127, 127);
pub const TAB_OLIVE: RGBColor = RGBColor(188, 189, 34);
pub const TAB_CYAN: RGBColor = RGBColor(23, 190, 207);

static DEFAULT_STYLES: Lazy<Vec<ManagerStyle>> = Lazy::new(|| {
    vec![
        ManagerStyle::new("RCU", "EBR", TAB_BLUE, MarkerShape::Circle),
        ManagerStyle::new("Range_new", "IBR", TAB_GREEN, MarkerShape::TriangleUp),
        ManagerStyle::new("HazardOpt", "HP", TAB_OLIVE, MarkerShape::Star),
        ManagerStyle::new("Hazard", "HP (slow)", TAB_RED, MarkerShape::Square),
        ManagerStyle::new("HE", "HE", TAB_GRAY, MarkerShape::Cross),
        ManagerStyle::new("Hyaline", "Hyaline", TAB_RED, MarkerShape::Square),
        ManagerStyle::new("DEBRA", "DEBRA", TAB_OLIVE, MarkerShape::TriangleRight),
        ManagerStyle::new("NIL", "No MM", TAB_PINK, MarkerShape::Tick),
        ManagerStyle::new("RC", "RC", TAB_ORANGE, MarkerShape::TriangleDown),
        ManagerStyle::new("RCHP", "RC (HP)", TAB_BROWN, MarkerShape::Diamond),
        ManagerStyle::new("RCEBR", "RC (EBR)", TAB_PURPLE, MarkerShape::Plus),
        ManagerStyle::new("RCHE", "RC (HE)", TAB_CYAN, MarkerShape::Cross),
        ManagerStyle::new("RCIBR", "RC (IBR)", TAB_CYAN, MarkerShape::TriangleLeft),
        ManagerStyle::new(
            "RCHyaline",
            "RC (Hyaline)",
            TAB_ORANGE,
            MarkerShape::TriangleDown,
        ),
    ]
});

/// Display configuration for one rendering job.
///
/// Injected into the renderer rather than read from globals, so jobs
/// over different files can use different tables and tests can
/// substitute a reduced one. The allow-list's order is the display
/// order — decoupled from discovery order so charts from different
/// files stay comparable.
#[derive(Debug, Clone)]
pub struct PlotConfig {
    pub styles: Vec<ManagerStyle>,
    /// Manager literal meaning "no reclamation". Its allocation and
    /// retention figures are meaningless, so it only appears on
    /// throughput charts.
    pub no_reclamation: String,
    /// Override for the hardware-thread reference line; detected from
    /// the host when unset.
    pub hardware_threads: Option<u32>,
    pub image_size: (u32, u32),
    pub error_bars: bool,
    pub emit_svg: bool,
    pub output_dir: PathBuf,
    pub run_tag: Option<String>,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            styles: DEFAULT_STYLES.clone(),
            no_reclamation: "NIL".to_string(),
            hardware_threads: None,
            image_size: (1040, 640),
            error_bars: true,
            emit_svg: false,
            output_dir: PathBuf::from("graphs"),
            run_tag: None,
        }
    }
}

impl PlotConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_styles(mut self, styles: Vec<ManagerStyle>) -> Self {
        self.styles = styles;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_run_tag(mut self, tag: &str) -> Self {
        self.run_tag = Some(tag.to_string());
        self
    }

    pub fn with_hardware_threads(mut self, threads: u32) -> Self {
        self.hardware_threads = Some(threads);
        self
    }

    pub fn with_error_bars(mut self, enabled: bool) -> Self {
        self.error_bars = enabled;
        self
    }

    pub fn with_svg(mut self, enabled: bool) -> Self {
        self.emit_svg = enabled;
        self
    }

    /// Whether this manager belongs on a chart of the given metric.
    pub fn includes(&self, manager: &str, metric: MetricKind) -> bool {
        metric == MetricKind::Throughput || manager != self.no_reclamation
    }
}
