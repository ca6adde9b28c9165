pub mod bootstrap;
pub mod report;

pub use bootstrap::*;
pub use report::*;
