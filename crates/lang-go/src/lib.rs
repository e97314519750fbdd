pub mod constraint;
pub mod env;
pub mod header;
pub mod loader;
pub mod oracle;
pub mod queries;

pub use constraint::BuildContext;
pub use env::GoEnv;
pub use loader::GoLoader;
pub use oracle::OracleEngine;
