//! sitecrew CLI library; modules are exposed for unit tests.

pub mod app;
pub mod commands;
pub mod input;
