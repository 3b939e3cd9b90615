use crate::aggregator::{AggregatedRecord, AggregatedResults};
use crate::trial_key::MetricKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Summary statistics for one (metric, manager, thread count) cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub mean: f64,
    pub stddev: f64,
    pub samples: usize,
}

impl From<AggregatedRecord> for MetricPoint {
    fn from(record: AggregatedRecord) -> Self {
        MetricPoint {
            mean: record.mean,
            stddev: record.stddev,
            samples: record.samples,
        }
    }
}

/// What one result file covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    /// Benchmark descriptors, first-seen order.
    pub benchmarks: Vec<String>,
    /// Memory managers, first-seen order.
    pub memory_managers: Vec<String>,
    /// Thread counts, ascending.
    pub threads: Vec<u32>,
    /// Resolved structure name; the last benchmark wins if a file mixes
    /// descriptors.
    pub structure: String,
}

/// Series data per manager: thread count -> summary point.
pub type ManagerSeries = BTreeMap<String, BTreeMap<u32, MetricPoint>>;

/// Nested, serialization-ready view of one log file's aggregates:
/// metric -> memory manager -> thread count -> summary point.
///
/// Ordered maps throughout, so the same data always serializes to the
/// same bytes. Values are stored unscaled; the thousands scaling for
/// allocated/retired happens at render time only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub metrics: BTreeMap<MetricKind, ManagerSeries>,
    pub metadata: ResultMetadata,
}

impl ResultSet {
    /// Restructure aggregated records for persistence and rendering.
    pub fn from_aggregated(aggregated: &AggregatedResults) -> Self {
        let mut metrics: BTreeMap<MetricKind, ManagerSeries> = BTreeMap::new();
        for (key, record) in &aggregated.records {
            metrics
                .entry(key.metric)
                .or_default()
                .entry(key.memory_manager.clone())
                .or_default()
                .insert(key.threads, MetricPoint::from(*record));
        }

        let structure = aggregated
            .benchmarks
            .last()
            .map(|benchmark| benchmark.structure.clone())
            .unwrap_or_default();

        ResultSet {
            metrics,
            metadata: ResultMetadata {
                benchmarks: aggregated
                    .benchmarks
                    .iter()
                    .map(|benchmark| benchmark.encode())
                    .collect(),
                memory_managers: aggregated.memory_managers.clone(),
                threads: aggregated.threads.clone(),
                structure,
            },
        }
    }

    /// Series data for one metric, if any trial produced it.
    pub fn metric(&self, metric: MetricKind) -> Option<&ManagerSeries> {
        self.metrics.get(&metric)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).context("failed to serialize result set")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write result file: {}", path.display()))?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read result file: {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("malformed result file: {}", path.display()))
    }
}
