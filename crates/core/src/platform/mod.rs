//! Host platform detection and platform-specific capability binding.

pub mod host;
pub mod identifier;
pub mod registry;
pub mod tag;

pub use host::*;
pub use identifier::*;
pub use registry::*;
pub use tag::*;
