//! Internal implementation details.

pub(crate) mod circular;

pub use circular::CircularDependency;
pub(crate) use circular::ResolutionGuard;
