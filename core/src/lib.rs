//! Core of the sitecrew pipeline: roles, the task graph, the sequential
//! scheduler and the run coordinator. Concrete runners, renderers and
//! strategies live in `sitecrew-plugins`.

pub mod api;
pub mod artifacts;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod executor;
pub mod role;
pub mod summary;
pub mod task;
