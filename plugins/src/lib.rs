//! Pluggable runners, renderers and strategies for `sitecrew-core`.

pub mod executor;
pub mod factory;
pub mod runner;
pub mod services;

#[cfg(test)]
mod test_support;
