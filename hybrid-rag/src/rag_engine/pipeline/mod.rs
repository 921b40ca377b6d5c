pub mod config;
pub mod orchestrator;


pub use config::PipelineConfig;
pub use orchestrator::{Pipeline, PipelineBuilder};
