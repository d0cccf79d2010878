pub mod manager;
pub mod retry;

pub use manager::ManagerStrategy;
pub use retry::{ExponentialBackoffPlugin, LinearRetryPlugin, NoDelayRetryPlugin};
