//! BootstrapScanner - controller 起動時の一回だけの走査
//!
//! watch は開始後のイベントしか届けないので、controller が動く前に orphan に
//! なっていた claim にはまだ tracking label がありません。起動時に一度だけ
//! unattached な claim を走査して、欠けている label だけを補います。
//!
//! 既存の label は上書きしないので、何度実行しても結果は同じです。

use std::sync::Arc;

use tracing::{Instrument, debug, info, info_span, warn};

use super::call::bounded;
use super::status::ScanSummary;
use crate::domain::tracking::INITIAL_NOTIF_COUNT;
use crate::domain::{ControllerConfig, ReaperError};
use crate::ports::{ClaimStore, Clock};

pub struct BootstrapScanner {
    store: Arc<dyn ClaimStore>,
    clock: Arc<dyn Clock>,
    config: ControllerConfig,
}

impl BootstrapScanner {
    pub fn new(store: Arc<dyn ClaimStore>, clock: Arc<dyn Clock>, config: ControllerConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub async fn scan(&self) -> Result<ScanSummary, ReaperError> {
        let span = info_span!(
            "bootstrap_scan",
            namespace = %self.config.namespace,
            storage_class = %self.config.storage_class,
        );

        async move {
            info!("checking for unattached claims");
            let claims = bounded(
                "list unattached claims",
                self.config.call_timeout,
                self.store
                    .list_unattached_claims(&self.config.namespace, &self.config.storage_class),
            )
            .await?;

            let labels = &self.config.labels;
            let orphaned_at = labels.time_format.format(self.clock.now());
            let mut summary = ScanSummary::default();

            for claim in &claims {
                summary.claims_seen += 1;
                let missing = [
                    (&labels.time_label, orphaned_at.as_str()),
                    (&labels.notif_label, INITIAL_NOTIF_COUNT),
                ];

                for (label, value) in missing {
                    if claim.has_label(label) {
                        continue;
                    }
                    match bounded(
                        "set label",
                        self.config.call_timeout,
                        self.store
                            .set_claim_label(&claim.namespace, &claim.name, label, value),
                    )
                    .await
                    {
                        Ok(()) => {
                            debug!(claim = %claim.key(), label = %label, "added missing label");
                            summary.labels_written += 1;
                        }
                        Err(err) => {
                            warn!(claim = %claim.key(), label = %label, error = %err, "failed to add label");
                            summary.errors += 1;
                        }
                    }
                }
            }

            info!(
                claims = summary.claims_seen,
                labels_written = summary.labels_written,
                errors = summary.errors,
                "initial scan complete"
            );
            Ok(summary)
        }
        .instrument(span)
        .await
    }
}
