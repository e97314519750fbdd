pub mod engine;
pub mod error;
pub mod loader;
pub mod models;

// Re-export commonly used types
pub use engine::{AnalysisEngine, EngineQuery};
pub use error::{ApiError, ApiResult};
pub use loader::ProgramLoader;
pub use models::*;
