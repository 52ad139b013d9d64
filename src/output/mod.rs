//! Rendering a finished matrix for people and machines.

pub mod csv;
pub mod json;
pub mod terminal;
