//! Task definitions and the dependency graph they form.

mod graph;
mod reference;
mod spec;

pub use graph::{TaskGraph, TopologicalOrder};
pub use reference::{InputSource, OutputRef};
pub use spec::{InputBinding, TaskSpec};
