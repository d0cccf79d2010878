use async_trait::async_trait;

use crate::error::RunnerError;
use crate::executor::types::TaskRequest;

/// Backend that turns a rendered task request into raw output text.
///
/// The scheduler owns timeouts, retries and validation; a runner only performs
/// one attempt. Runners must be cancel-safe: the future may be dropped at any
/// await point.
#[async_trait]
pub trait RoleRunner: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, request: &TaskRequest) -> Result<String, RunnerError>;
}
