pub mod aggregator;
pub mod exporter;
pub mod loader;
pub mod processing;
pub mod publisher;
pub mod stash;
