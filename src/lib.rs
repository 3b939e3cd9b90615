// Log parsing
pub mod log_parser;
pub mod parser_dialect;
pub mod trial_accumulator;
pub mod trial_key;

// Aggregation and persistence
pub mod aggregator;
pub mod result_store;

// Chart rendering
pub mod plot_config;
pub mod plot_renderer;

// Pipeline driver
pub mod config;
pub mod report_pipeline;
