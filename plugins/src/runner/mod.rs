//! Role runners: how a task attempt is actually carried out.

pub mod command;
pub mod echo;
pub mod replay;

pub use command::CommandRunnerPlugin;
pub use echo::EchoRunnerPlugin;
pub use replay::ReplayRunnerPlugin;
