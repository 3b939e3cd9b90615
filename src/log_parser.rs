use crate::parser_dialect::ParserDialect;
use crate::trial_accumulator::TrialAccumulator;
use crate::trial_key::{BenchmarkDescriptor, TrialKey};
use aho_corasick::AhoCorasick;
use anyhow::{anyhow, Context, Result};
use memchr::memmem;
use rustc_hash::FxHashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

// Pattern indices, matching ParserDialect::markers().
const TRIAL: usize = 0;
const PREFILL: usize = 1;
const TRACKER: usize = 2;
const WORKLOAD: usize = 3;
const ALLOCATED: usize = 4;
const THROUGHPUT: usize = 5;

/// Everything recovered from one log: raw observation lists keyed by
/// trial configuration, plus the distinct thread counts, memory managers
/// and benchmark descriptors in first-seen order.
#[derive(Debug, Default)]
pub struct ParseOutput {
    pub observations: FxHashMap<TrialKey, Vec<f64>>,
    pub threads: Vec<u32>,
    pub memory_managers: Vec<String>,
    pub benchmarks: Vec<BenchmarkDescriptor>,
}

/// Stateful parser reassembling trials from interleavable log lines.
///
/// Each line is classified against the dialect's markers with one
/// Aho-Corasick pass; the six patterns are recognized independently of
/// each other and lines matching none are ignored.
pub struct LogParser {
    dialect: ParserDialect,
    classifier: AhoCorasick,
    accumulator: TrialAccumulator,
    output: ParseOutput,
}

impl LogParser {
    pub fn new() -> Self {
        Self::with_dialect(ParserDialect::default())
            .expect("default dialect markers always compile")
    }

    pub fn with_dialect(dialect: ParserDialect) -> Result<Self> {
        let classifier = AhoCorasick::new(dialect.markers())
            .context("failed to build the line classifier from the dialect markers")?;
        Ok(Self {
            dialect,
            classifier,
            accumulator: TrialAccumulator::new(),
            output: ParseOutput::default(),
        })
    }

    /// Feed one log line.
    pub fn parse_line(&mut self, line: &str) -> Result<()> {
        let mut hits = [false; 6];
        for mat in self.classifier.find_overlapping_iter(line) {
            hits[mat.pattern().as_usize()] = true;
        }
        self.dispatch(line, &hits)
            .with_context(|| format!("offending line: {line:?}"))
    }

    fn dispatch(&mut self, line: &str, hits: &[bool; 6]) -> Result<()> {
        if hits[TRIAL] {
            self.on_trial_line(line)?;
        }
        if hits[PREFILL] {
            self.accumulator.prefill = Some(first_uint(line)?);
        }
        if hits[TRACKER] {
            self.on_tracker_line(line);
        }
        if hits[WORKLOAD] {
            self.accumulator.workload = Some(line.trim().to_string());
        }
        if hits[ALLOCATED] {
            self.accumulator.allocated = Some(first_float(line)?);
        }
        if hits[THROUGHPUT] {
            self.on_throughput_line(line)?;
        }
        Ok(())
    }

    /// Thread count and structure identifier; a reference-counting
    /// variant carries its manager tag inside the structure token.
    fn on_trial_line(&mut self, line: &str) -> Result<()> {
        let line = self.dialect.rewrite(line);
        let threads = u32::try_from(first_int(&line)?)
            .map_err(|_| anyhow!("thread count out of range"))?;
        if !self.output.threads.contains(&threads) {
            self.output.threads.push(threads);
        }
        self.accumulator.threads = Some(threads);

        let token = line
            .split_whitespace()
            .last()
            .ok_or_else(|| anyhow!("no structure token"))?;
        match memmem::find(token.as_bytes(), self.dialect.variant_marker.as_bytes()) {
            Some(at) => {
                self.accumulator.structure = Some(token[..at].to_string());
                self.accumulator.memory_manager = Some(token[at..].to_string());
            }
            None => self.accumulator.structure = Some(token.to_string()),
        }
        Ok(())
    }

    fn on_tracker_line(&mut self, line: &str) {
        let cleaned = line.replace('"', "");
        if let Some(token) = cleaned.split_whitespace().last() {
            self.accumulator.memory_manager = Some(token.to_string());
        }
    }

    /// The throughput line finalizes the trial and records all three
    /// observations under their keys.
    fn on_throughput_line(&mut self, line: &str) -> Result<()> {
        let throughput = first_float(line)?;
        let trial = self.accumulator.finalize(throughput, &self.dialect)?;

        for (metric, value) in trial.observations() {
            let key = TrialKey {
                memory_manager: trial.memory_manager.clone(),
                structure: trial.structure.clone(),
                prefill: trial.prefill,
                workload: trial.workload.clone(),
                threads: trial.threads,
                metric,
            };
            self.output.observations.entry(key).or_default().push(value);
        }

        if !self.output.memory_managers.contains(&trial.memory_manager) {
            self.output.memory_managers.push(trial.memory_manager.clone());
        }
        let descriptor = BenchmarkDescriptor {
            structure: trial.structure,
            prefill: trial.prefill,
            workload: trial.workload,
        };
        if !self.output.benchmarks.contains(&descriptor) {
            self.output.benchmarks.push(descriptor);
        }
        Ok(())
    }

    /// Parse a complete in-memory log.
    pub fn parse_str(&mut self, text: &str) -> Result<()> {
        for (number, line) in text.lines().enumerate() {
            self.parse_line(line)
                .with_context(|| format!("log line {}", number + 1))?;
        }
        Ok(())
    }

    pub fn finish(self) -> ParseOutput {
        self.output
    }
}

impl Default for LogParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one complete benchmark log file with the given dialect.
pub fn parse_file(path: &Path, dialect: &ParserDialect) -> Result<ParseOutput> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read log file: {}", path.display()))?;
    let mut parser = LogParser::with_dialect(dialect.clone())?;
    parser
        .parse_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let output = parser.finish();
    debug!(
        "{}: {} trial keys, {} thread counts, {} managers",
        path.display(),
        output.observations.len(),
        output.threads.len(),
        output.memory_managers.len()
    );
    Ok(output)
}

/// First whitespace token that parses as an integer, in full.
fn first_int(line: &str) -> Result<i64> {
    line.split_whitespace()
        .find_map(|token| token.parse::<i64>().ok())
        .ok_or_else(|| anyhow!("no integer token in line"))
}

fn first_uint(line: &str) -> Result<u64> {
    u64::try_from(first_int(line)?).map_err(|_| anyhow!("negative count in line"))
}

/// First whitespace token that parses as a float, in full.
fn first_float(line: &str) -> Result<f64> {
    line.split_whitespace()
        .find_map(|token| token.parse::<f64>().ok())
        .ok_or_else(|| anyhow!("no numeric token in line"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial_key::MetricKind;

    const TRIAL_BLOCK: &str = "\
Testing:  4 threads for 5 seconds on ObjRetire:u10:range=200K:prefill=100K with NatarajanTree
Using flags:
emptyf = \"2\"
epochf = \"10\"
tracker = \"RCU\"
Prefilled 100000
Gets:90 Updates:10 RQs: 0
Average allocated nodes: 150000.0
Throughput: 12.500000 Mop/s
";

    fn key(mm: &str, threads: u32, metric: MetricKind) -> TrialKey {
        TrialKey {
            memory_manager: mm.to_string(),
            structure: "NatarajanTree".to_string(),
            prefill: 100_000,
            workload: "Gets:90 Updates:10 RQs: 0".to_string(),
            threads,
            metric,
        }
    }

    #[test]
    fn test_single_trial_yields_three_observations() {
        let mut parser = LogParser::new();
        parser.parse_str(TRIAL_BLOCK).unwrap();
        let output = parser.finish();

        assert_eq!(output.observations.len(), 3);
        assert_eq!(
            output.observations[&key("RCU", 4, MetricKind::Throughput)],
            vec![12.5]
        );
        assert_eq!(
            output.observations[&key("RCU", 4, MetricKind::Allocated)],
            vec![150_000.0]
        );
        // 150000 - 100000 - (100000 + 5): the tree discounts internal nodes
        assert_eq!(
            output.observations[&key("RCU", 4, MetricKind::Retired)],
            vec![-50_005.0]
        );

        assert_eq!(output.threads, vec![4]);
        assert_eq!(output.memory_managers, vec!["RCU".to_string()]);
        assert_eq!(output.benchmarks.len(), 1);
        assert_eq!(
            output.benchmarks[0].encode(),
            "NatarajanTree, size:100000, Gets:90 Updates:10 RQs: 0"
        );
    }

    #[test]
    fn test_repeats_append_in_arrival_order() {
        let mut parser = LogParser::new();
        parser.parse_str(TRIAL_BLOCK).unwrap();
        let second = TRIAL_BLOCK.replace("12.500000", "13.000000");
        parser.parse_str(&second).unwrap();
        let third = TRIAL_BLOCK.replace("12.500000", "11.500000");
        parser.parse_str(&third).unwrap();

        let output = parser.finish();
        assert_eq!(
            output.observations[&key("RCU", 4, MetricKind::Throughput)],
            vec![12.5, 13.0, 11.5]
        );
    }

    #[test]
    fn test_variant_token_carries_its_own_manager() {
        let log = "\
Testing:  8 threads for 5 seconds on ObjRetire:u10:range=2000:prefill=1000 with LinkListRCHP
Prefilled 1000
Gets:90 Updates:10 RQs: 0
Average allocated nodes: 1500.0
Throughput: 3.250000 Mop/s
";
        let mut parser = LogParser::new();
        parser.parse_str(log).unwrap();
        let output = parser.finish();

        // LinkList is rewritten before the token is split
        let throughput = TrialKey {
            memory_manager: "RCHP".to_string(),
            structure: "LinkedList".to_string(),
            prefill: 1000,
            workload: "Gets:90 Updates:10 RQs: 0".to_string(),
            threads: 8,
            metric: MetricKind::Throughput,
        };
        assert_eq!(output.observations[&throughput], vec![3.25]);
        assert_eq!(output.memory_managers, vec!["RCHP".to_string()]);
    }

    #[test]
    fn test_tracker_line_overrides_variant_manager() {
        let log = "\
Testing:  2 threads for 5 seconds on ObjRetire with LinkedListRCEBR
tracker = \"Range_new\"
Prefilled 1000
Gets:100 Updates:0 RQs: 0
Average allocated nodes: 1200.0
Throughput: 4.000000 Mop/s
";
        let mut parser = LogParser::new();
        parser.parse_str(log).unwrap();
        let output = parser.finish();
        assert_eq!(output.memory_managers, vec!["Range_new".to_string()]);
    }

    #[test]
    fn test_unrecognized_lines_are_ignored() {
        let mut parser = LogParser::new();
        parser
            .parse_str("warming up allocator\nthread 3 pinned to core 3\n")
            .unwrap();
        let output = parser.finish();
        assert!(output.observations.is_empty());
        assert!(output.threads.is_empty());
    }

    #[test]
    fn test_missing_numeric_token_surfaces_the_line() {
        let mut parser = LogParser::new();
        let err = parser.parse_line("Prefilled nothing yet").unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("Prefilled nothing yet"));
        assert!(message.contains("no integer token"));
    }

    #[test]
    fn test_incomplete_trial_fails_at_finalize() {
        let log = "\
Testing:  4 threads for 5 seconds on ObjRetire with LinkedList
tracker = \"RCU\"
Prefilled 1000
Gets:100 Updates:0 RQs: 0
Throughput: 4.000000 Mop/s
";
        let mut parser = LogParser::new();
        let err = parser.parse_str(log).unwrap_err();
        assert!(format!("{err:#}").contains("allocated"));
    }

    #[test]
    fn test_threads_keep_first_seen_order() {
        let mut parser = LogParser::new();
        for threads in [16, 1, 8, 16, 1] {
            let block = TRIAL_BLOCK.replace("Testing:  4", &format!("Testing:  {threads}"));
            parser.parse_str(&block).unwrap();
        }
        let output = parser.finish();
        assert_eq!(output.threads, vec![16, 1, 8]);
    }

    #[test]
    fn test_prefill_persists_when_not_restated() {
        // A trial block without its own "Prefilled" line reuses the last
        // recorded baseline, so its retired estimate is computed against
        // a stale prefill. Pinned here so a format change cannot shift
        // the baseline silently.
        let log = "\
Testing:  4 threads for 5 seconds on ObjRetire with LinkedList
tracker = \"RCU\"
Prefilled 1000
Gets:100 Updates:0 RQs: 0
Average allocated nodes: 1500.0
Throughput: 4.000000 Mop/s
Testing:  4 threads for 5 seconds on ObjRetire with LinkedList
tracker = \"Hazard\"
Gets:100 Updates:0 RQs: 0
Average allocated nodes: 2500.0
Throughput: 3.000000 Mop/s
";
        let mut parser = LogParser::new();
        parser.parse_str(log).unwrap();
        let output = parser.finish();

        let stale = TrialKey {
            memory_manager: "Hazard".to_string(),
            structure: "LinkedList".to_string(),
            prefill: 1000,
            workload: "Gets:100 Updates:0 RQs: 0".to_string(),
            threads: 4,
            metric: MetricKind::Retired,
        };
        assert_eq!(output.observations[&stale], vec![1500.0]);
    }
}
