//! Content hashing and incremental-rebuild bookkeeping.
//!
//! The engine decides whether a source needs recompilation by comparing
//! a collision-detecting SHA-1 digest of its current contents against a
//! digest stored in a sidecar file from the previous build. Using a
//! collision-detecting hash instead of plain SHA-1 means a source
//! crafted to collide with a stored digest cannot be mistaken for an
//! unchanged file.

pub use self::{digest::*, name::*, sidecar::*};

mod digest;
mod name;
mod sidecar;
