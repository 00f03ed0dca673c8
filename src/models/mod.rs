pub mod comment;
pub mod label;
pub mod task;

pub use comment::*;
pub use label::*;
pub use task::*;
