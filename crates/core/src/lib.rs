pub mod cmdline;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod index;
pub mod logging;

pub use cmdline::render_command_line;
pub use config::ServerConfig;
pub use context::ServiceContext;
pub use coordinator::{QueryCoordinator, QueryError, QueryRequest, QueryResponse};
pub use error::Result;
pub use index::ProgramIndex;
