//! WorkloadWatcher port - StatefulSet の watch stream
//!
//! `watch_workloads` の失敗は controller の起動失敗として扱われます。
//! stream 自体は cancel されると drop されるだけなので、実装側は drop で
//! 後片付けできるようにしておくこと。

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::{ReaperError, WatchEvent};

pub type WorkloadEventStream = BoxStream<'static, WatchEvent>;

#[async_trait]
pub trait WorkloadWatcher: Send + Sync {
    async fn watch_workloads(&self, namespace: &str) -> Result<WorkloadEventStream, ReaperError>;
}
