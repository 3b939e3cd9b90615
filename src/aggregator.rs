use crate::log_parser::ParseOutput;
use crate::trial_key::{BenchmarkDescriptor, TrialKey};
use anyhow::{bail, Result};
use rustc_hash::FxHashMap;

/// Mean, population standard deviation and repeat count for one key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatedRecord {
    pub mean: f64,
    pub stddev: f64,
    pub samples: usize,
}

/// All aggregated records for one log file plus chart-ready metadata.
#[derive(Debug)]
pub struct AggregatedResults {
    pub records: FxHashMap<TrialKey, AggregatedRecord>,
    /// Distinct thread counts, ascending.
    pub threads: Vec<u32>,
    /// Distinct memory managers, first-seen order.
    pub memory_managers: Vec<String>,
    /// Distinct benchmark descriptors, first-seen order.
    pub benchmarks: Vec<BenchmarkDescriptor>,
}

/// Reduce every raw observation list to its summary statistics.
///
/// An empty list cannot come out of the parser — absence means "never
/// executed". One showing up here means the pipeline mixed up its keys,
/// which must not be papered over with a zero-filled record.
pub fn aggregate(output: ParseOutput) -> Result<AggregatedResults> {
    let mut records = FxHashMap::default();
    for (key, values) in output.observations {
        if values.is_empty() {
            bail!("no observations recorded for {key}");
        }
        let mean = mean(&values);
        records.insert(
            key,
            AggregatedRecord {
                mean,
                stddev: population_stddev(&values, mean),
                samples: values.len(),
            },
        );
    }

    let mut threads = output.threads;
    threads.sort_unstable();

    Ok(AggregatedResults {
        records,
        threads,
        memory_managers: output.memory_managers,
        benchmarks: output.benchmarks,
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0 for a single repeat.
fn population_stddev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|value| {
            let delta = value - mean;
            delta * delta
        })
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial_key::MetricKind;

    fn key(metric: MetricKind) -> TrialKey {
        TrialKey {
            memory_manager: "RCU".to_string(),
            structure: "LinkedList".to_string(),
            prefill: 1000,
            workload: "Gets:90 Updates:10 RQs: 0".to_string(),
            threads: 4,
            metric,
        }
    }

    fn output_with(values: Vec<f64>) -> ParseOutput {
        let mut output = ParseOutput::default();
        output
            .observations
            .insert(key(MetricKind::Throughput), values);
        output.threads = vec![4];
        output.memory_managers = vec!["RCU".to_string()];
        output.benchmarks = vec![key(MetricKind::Throughput).benchmark()];
        output
    }

    #[test]
    fn test_single_repeat_is_its_own_mean_with_zero_stddev() {
        let results = aggregate(output_with(vec![12.5])).unwrap();
        let record = results.records[&key(MetricKind::Throughput)];
        assert_eq!(record.mean, 12.5);
        assert_eq!(record.stddev, 0.0);
        assert_eq!(record.samples, 1);
    }

    #[test]
    fn test_three_repeats_population_statistics() {
        let results = aggregate(output_with(vec![12.5, 13.0, 11.5])).unwrap();
        let record = results.records[&key(MetricKind::Throughput)];
        assert!((record.mean - 12.333_333).abs() < 1e-6);
        assert!((record.stddev - 0.623_610).abs() < 1e-3);
        assert_eq!(record.samples, 3);
    }

    #[test]
    fn test_identical_repeats_have_zero_stddev() {
        let results = aggregate(output_with(vec![-50_005.0, -50_005.0, -50_005.0])).unwrap();
        let record = results.records[&key(MetricKind::Throughput)];
        assert_eq!(record.mean, -50_005.0);
        assert_eq!(record.stddev, 0.0);
    }

    #[test]
    fn test_threads_sorted_ascending() {
        let mut output = output_with(vec![1.0]);
        output.threads = vec![16, 1, 8];
        let results = aggregate(output).unwrap();
        assert_eq!(results.threads, vec![1, 8, 16]);
    }

    #[test]
    fn test_empty_observation_list_is_rejected() {
        let err = aggregate(output_with(Vec::new())).unwrap_err();
        assert!(err.to_string().contains("no observations"));
    }
}
