use crate::parser_dialect::ParserDialect;
use crate::trial_key::MetricKind;
use anyhow::{anyhow, Result};

/// Fields of the trial currently being assembled from the log.
///
/// The harness emits one logical trial across several non-atomic lines;
/// this collects them until the throughput line arrives. After a
/// successful [`finalize`](Self::finalize) only the memory manager and
/// the held allocation measurement are cleared: consecutive trials in a
/// log restate just the manager, so thread count, structure, prefill and
/// workload carry over.
#[derive(Debug, Clone, Default)]
pub struct TrialAccumulator {
    pub threads: Option<u32>,
    pub structure: Option<String>,
    pub memory_manager: Option<String>,
    pub prefill: Option<u64>,
    pub workload: Option<String>,
    pub allocated: Option<f64>,
}

/// One fully assembled trial with its derived retired estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedTrial {
    pub structure: String,
    pub memory_manager: String,
    pub prefill: u64,
    pub workload: String,
    pub threads: u32,
    pub allocated: f64,
    pub throughput: f64,
    pub retired: f64,
}

impl TrialAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete the current trial with its throughput measurement.
    ///
    /// Fails naming the first missing field; nothing is cleared on
    /// failure, so the error context still shows the partial state.
    pub fn finalize(
        &mut self,
        throughput: f64,
        dialect: &ParserDialect,
    ) -> Result<CompletedTrial> {
        let structure = self
            .structure
            .clone()
            .ok_or_else(|| anyhow!("trial completed without a structure name"))?;
        let threads = self
            .threads
            .ok_or_else(|| anyhow!("trial completed without a thread count"))?;
        let prefill = self
            .prefill
            .ok_or_else(|| anyhow!("trial completed without a prefill size"))?;
        let workload = self
            .workload
            .clone()
            .ok_or_else(|| anyhow!("trial completed without a workload descriptor"))?;
        let memory_manager = self
            .memory_manager
            .clone()
            .ok_or_else(|| anyhow!("trial completed without a memory manager"))?;
        let allocated = self
            .allocated
            .ok_or_else(|| anyhow!("trial completed without an allocated-nodes measurement"))?;

        self.memory_manager = None;
        self.allocated = None;

        let retired = dialect.retired_estimate(&structure, allocated, prefill);

        Ok(CompletedTrial {
            structure,
            memory_manager,
            prefill,
            workload,
            threads,
            allocated,
            throughput,
            retired,
        })
    }
}

impl CompletedTrial {
    /// The three scalars recorded for this trial, in storage order.
    pub fn observations(&self) -> [(MetricKind, f64); 3] {
        [
            (MetricKind::Allocated, self.allocated),
            (MetricKind::Throughput, self.throughput),
            (MetricKind::Retired, self.retired),
        ]
    }
}
