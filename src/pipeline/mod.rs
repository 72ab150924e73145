pub mod format;
pub mod generate;
pub mod orchestrator;
pub mod retrieve;

pub use generate::SynthesisSettings;
pub use orchestrator::{RelocationRequest, RelocationResult, generate_insights};
