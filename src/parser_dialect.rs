use serde::{Deserialize, Serialize};

/// Describes one generation of the benchmark harness's log format.
///
/// The harness's output has changed shape across generations; everything
/// the parser needs to know about a given generation lives in this value,
/// so supporting a new format means building a new `ParserDialect`, not a
/// new parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserDialect {
    /// Marks the line announcing a trial (thread count + structure name).
    pub trial_marker: String,
    /// Marks the line restating the prefill element count.
    pub prefill_marker: String,
    /// Marks the line naming the reclamation scheme under test.
    pub tracker_marker: String,
    /// Marks the line describing the operation mixture.
    pub workload_marker: String,
    /// Marks the line carrying the allocated-nodes measurement.
    pub allocated_marker: String,
    /// Marks the line carrying the throughput measurement; completes a trial.
    pub throughput_marker: String,
    /// Whole-line rewrites applied to the trial line before extraction.
    pub synonyms: Vec<(String, String)>,
    /// Substring marking a reference-counting variant inside the structure token.
    pub variant_marker: String,
    /// Structure whose retired estimate must discount internal nodes.
    pub balanced_tree: String,
    /// Internal/sentinel node count of `balanced_tree` beyond the prefill.
    pub balanced_tree_overhead: u64,
}

impl Default for ParserDialect {
    fn default() -> Self {
        Self {
            trial_marker: "Testing:".to_string(),
            prefill_marker: "Prefilled".to_string(),
            tracker_marker: "tracker = ".to_string(),
            workload_marker: "Gets:".to_string(),
            allocated_marker: "Average allocated nodes:".to_string(),
            throughput_marker: "Throughput:".to_string(),
            synonyms: vec![("LinkList".to_string(), "LinkedList".to_string())],
            variant_marker: "RC".to_string(),
            balanced_tree: "NatarajanTree".to_string(),
            balanced_tree_overhead: 5,
        }
    }
}

impl ParserDialect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_synonym(mut self, from: &str, to: &str) -> Self {
        self.synonyms.push((from.to_string(), to.to_string()));
        self
    }

    pub fn with_variant_marker(mut self, marker: &str) -> Self {
        self.variant_marker = marker.to_string();
        self
    }

    pub fn with_balanced_tree(mut self, structure: &str, overhead: u64) -> Self {
        self.balanced_tree = structure.to_string();
        self.balanced_tree_overhead = overhead;
        self
    }

    /// The six recognized markers, in pattern-index order.
    pub(crate) fn markers(&self) -> [&str; 6] {
        [
            &self.trial_marker,
            &self.prefill_marker,
            &self.tracker_marker,
            &self.workload_marker,
            &self.allocated_marker,
            &self.throughput_marker,
        ]
    }

    /// Apply the dialect's synonym rewrites to a trial line.
    pub(crate) fn rewrite(&self, line: &str) -> String {
        let mut line = line.to_string();
        for (from, to) in &self.synonyms {
            line = line.replace(from.as_str(), to.as_str());
        }
        line
    }

    /// Estimate of not-yet-reclaimed nodes beyond the logical element count.
    ///
    /// The balanced tree keeps one internal node per element plus a fixed
    /// handful of sentinels, none of which count toward the prefill.
    pub fn retired_estimate(&self, structure: &str, allocated: f64, prefill: u64) -> f64 {
        let mut retired = allocated - prefill as f64;
        if structure == self.balanced_tree {
            retired -= (prefill + self.balanced_tree_overhead) as f64;
        }
        retired
    }
}
