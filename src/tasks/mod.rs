pub mod orchestrator;
pub mod registry;

pub use orchestrator::TaskOrchestrator;
pub use registry::TaskRegistry;
