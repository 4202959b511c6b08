//! Type model

pub mod type_system;

pub use type_system::{comparable, compare, promote, types_incompatible, Fields, Type};
