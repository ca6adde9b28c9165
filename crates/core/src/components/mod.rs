//! Component model: descriptors produced by scanning, the factory catalog used to
//! activate them, and the container that owns activated instances.

pub mod builtin;
pub mod capability;
pub mod catalog;
pub mod container;
pub mod descriptor;

pub use builtin::*;
pub use capability::*;
pub use catalog::*;
pub use container::*;
pub use descriptor::*;
