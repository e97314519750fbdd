pub mod mode;
pub mod position;
pub mod program;

pub use mode::*;
pub use position::*;
pub use program::*;
