pub mod renderer;
pub mod runner;
pub mod sink;
pub mod strategy;

pub use renderer::*;
pub use runner::*;
pub use sink::*;
pub use strategy::*;
