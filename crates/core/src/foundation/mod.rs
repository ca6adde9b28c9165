pub mod lifecycle;
pub mod traits;

pub use lifecycle::*;
pub use traits::*;
