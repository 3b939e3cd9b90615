use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three scalar measurements recorded per completed trial.
///
/// This vocabulary is closed: decoding anything else is a fatal error so
/// a parser/aggregator schema mismatch can never pass silently.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Allocated,
    Throughput,
    Retired,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [
        MetricKind::Allocated,
        MetricKind::Throughput,
        MetricKind::Retired,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Allocated => "allocated",
            MetricKind::Throughput => "throughput",
            MetricKind::Retired => "retired",
        }
    }

    /// Divisor applied at presentation time only; stored values stay raw.
    pub fn display_divisor(self) -> f64 {
        match self {
            MetricKind::Allocated | MetricKind::Retired => 1000.0,
            MetricKind::Throughput => 1.0,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "allocated" => Ok(MetricKind::Allocated),
            "throughput" => Ok(MetricKind::Throughput),
            "retired" => Ok(MetricKind::Retired),
            other => bail!("unknown result kind: {other:?}"),
        }
    }
}

/// Composite key addressing one raw-observation list.
///
/// Encodes as
/// `"<manager>, <structure>, size:<prefill>, <workload>, <threads>, <metric>"`.
/// The workload is the only field that may contain spaces; no field in the
/// domain contains the `", "` separator, so the encoding is injective and
/// decoding recovers the exact tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrialKey {
    pub memory_manager: String,
    pub structure: String,
    pub prefill: u64,
    pub workload: String,
    pub threads: u32,
    pub metric: MetricKind,
}

impl TrialKey {
    pub fn encode(&self) -> String {
        format!(
            "{}, {}, size:{}, {}, {}, {}",
            self.memory_manager,
            self.structure,
            self.prefill,
            self.workload,
            self.threads,
            self.metric
        )
    }

    pub fn decode(text: &str) -> Result<Self> {
        let mut left = text.splitn(4, ", ");
        let memory_manager = left
            .next()
            .ok_or_else(|| anyhow!("malformed trial key: {text:?}"))?;
        let structure = left
            .next()
            .ok_or_else(|| anyhow!("malformed trial key: {text:?}"))?;
        let size = left
            .next()
            .ok_or_else(|| anyhow!("malformed trial key: {text:?}"))?;
        let rest = left
            .next()
            .ok_or_else(|| anyhow!("malformed trial key: {text:?}"))?;

        let prefill = size
            .strip_prefix("size:")
            .ok_or_else(|| anyhow!("malformed size field {size:?} in trial key {text:?}"))?
            .parse::<u64>()
            .with_context(|| format!("malformed size field {size:?} in trial key {text:?}"))?;

        // The workload may contain spaces, so split the tail from the right.
        let mut right = rest.rsplitn(3, ", ");
        let metric = right
            .next()
            .ok_or_else(|| anyhow!("malformed trial key: {text:?}"))?;
        let threads = right
            .next()
            .ok_or_else(|| anyhow!("malformed trial key: {text:?}"))?;
        let workload = right
            .next()
            .ok_or_else(|| anyhow!("malformed trial key: {text:?}"))?;

        Ok(TrialKey {
            memory_manager: memory_manager.to_string(),
            structure: structure.to_string(),
            prefill,
            workload: workload.to_string(),
            threads: threads
                .parse::<u32>()
                .with_context(|| format!("malformed thread count in trial key {text:?}"))?,
            metric: metric.parse()?,
        })
    }

    pub fn benchmark(&self) -> BenchmarkDescriptor {
        BenchmarkDescriptor {
            structure: self.structure.clone(),
            prefill: self.prefill,
            workload: self.workload.clone(),
        }
    }
}

impl fmt::Display for TrialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for TrialKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

/// Identifies one chart/report unit, independent of manager and thread axis.
///
/// Encodes as `"<structure>, size:<prefill>, <workload>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BenchmarkDescriptor {
    pub structure: String,
    pub prefill: u64,
    pub workload: String,
}

impl BenchmarkDescriptor {
    pub fn encode(&self) -> String {
        format!("{}, size:{}, {}", self.structure, self.prefill, self.workload)
    }

    pub fn decode(text: &str) -> Result<Self> {
        let mut fields = text.splitn(3, ", ");
        let structure = fields
            .next()
            .ok_or_else(|| anyhow!("malformed benchmark descriptor: {text:?}"))?;
        let size = fields
            .next()
            .ok_or_else(|| anyhow!("malformed benchmark descriptor: {text:?}"))?;
        let workload = fields
            .next()
            .ok_or_else(|| anyhow!("malformed benchmark descriptor: {text:?}"))?;

        Ok(BenchmarkDescriptor {
            structure: structure.to_string(),
            prefill: size
                .strip_prefix("size:")
                .ok_or_else(|| {
                    anyhow!("malformed size field {size:?} in benchmark descriptor {text:?}")
                })?
                .parse::<u64>()
                .with_context(|| {
                    format!("malformed size field {size:?} in benchmark descriptor {text:?}")
                })?,
            workload: workload.to_string(),
        })
    }
}

impl fmt::Display for BenchmarkDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
