pub mod aggregation;
pub mod scoring;
pub mod trend;
