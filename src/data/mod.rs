//! Small data-structure building blocks shared by the rest of the crate.

pub mod arena;

pub use arena::{Arena, Index};
