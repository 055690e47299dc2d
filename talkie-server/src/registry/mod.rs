mod registry;
mod sweeper;

pub use registry::*;
pub use sweeper::*;
