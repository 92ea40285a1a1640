// Utility functions
pub mod error;
pub mod response;
pub mod thread_pool;

pub use error::*;
pub use thread_pool::*;
