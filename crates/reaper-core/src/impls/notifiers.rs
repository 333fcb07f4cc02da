//! Log / Recording notifiers
//!
//! - **LogNotifier**: tracing にログを出すだけ（dry run とローカル実行用）
//! - **RecordingNotifier**: 送った Notice を記録する。失敗を注入できる（テスト用）

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::info;

use crate::domain::ReaperError;
use crate::ports::{Notice, Notifier};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notice: &Notice) -> Result<(), ReaperError> {
        info!(
            claim = %notice.claim,
            checkpoint = notice.checkpoint,
            days_left = notice.days_left,
            delete_after = %notice.delete_after,
            "claim scheduled for deletion"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notice>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// While failing, `send` returns a transport error and records nothing.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Notice> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notice: &Notice) -> Result<(), ReaperError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ReaperError::Transport(format!(
                "notification to owner of {} rejected",
                notice.claim
            )));
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notice.clone());
        Ok(())
    }
}
