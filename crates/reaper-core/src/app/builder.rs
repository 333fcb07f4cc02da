//! ReaperBuilder - ports と config のワイヤリング
//!
//! # 検証
//! `build()` で次をチェックします。
//! - label key が空でない / time と notification が別の key
//! - time format が format → parse で往復できる
//! - scheduler を使うなら notifier がある（dry run を除く）
//! - controller を使うなら watcher がある
//!
//! # 使用例
//! ```ignore
//! let reaper = ReaperBuilder::new(store)
//!     .with_scheduler(scheduler_config)
//!     .notifier(notifier)
//!     .build()?;
//! let summary = reaper.scheduler().unwrap().run_pass().await?;
//! ```

use std::sync::Arc;

use tokio::sync::watch;

use super::bootstrap::BootstrapScanner;
use super::controller::LabelController;
use super::scheduler::ReconcileScheduler;
use crate::domain::{ControllerConfig, ReaperError, SchedulerConfig, TrackingLabels};
use crate::impls::LogNotifier;
use crate::ports::{ClaimStore, Clock, Notifier, SystemClock, UlidGenerator, WorkloadWatcher};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("neither a scheduler nor a controller was configured")]
    NothingConfigured,

    #[error("scheduler requires a notifier unless dry_run is set")]
    MissingNotifier,

    #[error("controller requires a workload watcher")]
    MissingWatcher,

    #[error(transparent)]
    InvalidConfig(#[from] ReaperError),
}

pub struct ReaperBuilder {
    store: Arc<dyn ClaimStore>,
    watcher: Option<Arc<dyn WorkloadWatcher>>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Arc<dyn Clock>,
    scheduler_config: Option<SchedulerConfig>,
    controller_config: Option<ControllerConfig>,
}

impl ReaperBuilder {
    pub fn new(store: Arc<dyn ClaimStore>) -> Self {
        Self {
            store,
            watcher: None,
            notifier: None,
            clock: Arc::new(SystemClock),
            scheduler_config: None,
            controller_config: None,
        }
    }

    pub fn watcher(mut self, watcher: Arc<dyn WorkloadWatcher>) -> Self {
        self.watcher = Some(watcher);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_scheduler(mut self, config: SchedulerConfig) -> Self {
        self.scheduler_config = Some(config);
        self
    }

    pub fn with_controller(mut self, config: ControllerConfig) -> Self {
        self.controller_config = Some(config);
        self
    }

    pub fn build(self) -> Result<Reaper, BuildError> {
        let Self {
            store,
            watcher,
            notifier,
            clock,
            scheduler_config,
            controller_config,
        } = self;

        if scheduler_config.is_none() && controller_config.is_none() {
            return Err(BuildError::NothingConfigured);
        }

        let scheduler = match scheduler_config {
            Some(config) => {
                validate_labels(&config.labels, clock.as_ref())?;
                let notifier: Arc<dyn Notifier> = match (notifier, config.dry_run) {
                    (Some(notifier), _) => notifier,
                    (None, true) => Arc::new(LogNotifier),
                    (None, false) => return Err(BuildError::MissingNotifier),
                };
                Some(Arc::new(ReconcileScheduler::new(
                    Arc::clone(&store),
                    notifier,
                    Arc::clone(&clock),
                    Arc::new(UlidGenerator::new(Arc::clone(&clock))),
                    config,
                )))
            }
            None => None,
        };

        let (controller, bootstrap) = match controller_config {
            Some(config) => {
                validate_labels(&config.labels, clock.as_ref())?;
                let watcher = watcher.ok_or(BuildError::MissingWatcher)?;
                let bootstrap =
                    BootstrapScanner::new(Arc::clone(&store), Arc::clone(&clock), config.clone());
                let controller = LabelController::new(store, watcher, clock, config);
                (Some(Arc::new(controller)), Some(Arc::new(bootstrap)))
            }
            None => (None, None),
        };

        Ok(Reaper {
            scheduler,
            controller,
            bootstrap,
        })
    }
}

fn validate_labels(labels: &TrackingLabels, clock: &dyn Clock) -> Result<(), ReaperError> {
    labels.validate()?;
    labels.time_format.validate(clock.now())
}

/// Wired components. Each part is present only if it was configured.
pub struct Reaper {
    scheduler: Option<Arc<ReconcileScheduler>>,
    controller: Option<Arc<LabelController>>,
    bootstrap: Option<Arc<BootstrapScanner>>,
}

impl Reaper {
    pub fn scheduler(&self) -> Option<Arc<ReconcileScheduler>> {
        self.scheduler.clone()
    }

    pub fn controller(&self) -> Option<Arc<LabelController>> {
        self.controller.clone()
    }

    pub fn bootstrap(&self) -> Option<Arc<BootstrapScanner>> {
        self.bootstrap.clone()
    }

    /// Controller startup: initial scan, then watch until `shutdown` fires.
    pub async fn run_controller(&self, shutdown: watch::Receiver<bool>) -> Result<(), ReaperError> {
        let (Some(bootstrap), Some(controller)) = (&self.bootstrap, &self.controller) else {
            return Err(ReaperError::Config("controller is not configured".to_string()));
        };
        bootstrap.scan().await?;
        controller.run(shutdown).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TimeFormat;
    use crate::impls::InMemoryClusterStore;

    fn store() -> Arc<InMemoryClusterStore> {
        Arc::new(InMemoryClusterStore::new())
    }

    #[test]
    fn build_requires_something() {
        let result = ReaperBuilder::new(store()).build();
        assert!(matches!(result, Err(BuildError::NothingConfigured)));
    }

    #[test]
    fn scheduler_without_notifier_fails_unless_dry_run() {
        let result = ReaperBuilder::new(store())
            .with_scheduler(SchedulerConfig::default())
            .build();
        assert!(matches!(result, Err(BuildError::MissingNotifier)));

        let config = SchedulerConfig {
            dry_run: true,
            ..SchedulerConfig::default()
        };
        let reaper = ReaperBuilder::new(store())
            .with_scheduler(config)
            .build()
            .unwrap();
        assert!(reaper.scheduler().is_some());
        assert!(reaper.controller().is_none());
    }

    #[test]
    fn controller_without_watcher_fails() {
        let result = ReaperBuilder::new(store())
            .with_controller(ControllerConfig::default())
            .build();
        assert!(matches!(result, Err(BuildError::MissingWatcher)));
    }

    #[test]
    fn lossy_time_format_is_rejected() {
        let mut config = ControllerConfig::default();
        config.labels.time_format = TimeFormat::new("%Y-%m-%d");
        let s = store();
        let result = ReaperBuilder::new(s.clone())
            .watcher(s)
            .with_controller(config)
            .build();
        assert!(matches!(
            result,
            Err(BuildError::InvalidConfig(ReaperError::Config(_)))
        ));
    }

    #[test]
    fn controller_and_scheduler_share_one_store() {
        let s = store();
        let reaper = ReaperBuilder::new(s.clone())
            .watcher(s)
            .notifier(Arc::new(LogNotifier))
            .with_scheduler(SchedulerConfig::default())
            .with_controller(ControllerConfig::default())
            .build()
            .unwrap();
        assert!(reaper.scheduler().is_some());
        assert!(reaper.controller().is_some());
        assert!(reaper.bootstrap().is_some());
    }
}
