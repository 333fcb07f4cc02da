//! Reconcile command - delete stale claims and send due notifications.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tokio::sync::watch;
use tracing::{info, warn};

use reaper_core::app::{ReaperBuilder, ReaperLoop};
use reaper_core::domain::config::{
    DEFAULT_CALL_TIMEOUT, DEFAULT_GRACE_PERIOD_DAYS, DEFAULT_NOTIF_TIMES,
};
use reaper_core::domain::{NotificationSchedule, SchedulerConfig};
use reaper_core::impls::{EmailConfig, HttpNotifier, LogNotifier};
use reaper_core::ports::Notifier;

use super::{open_store, report};
use crate::{Cli, snapshot};

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Days an unattached claim is kept before deletion.
    #[arg(long, env = "REAPER_GRACE_PERIOD", default_value_t = DEFAULT_GRACE_PERIOD_DAYS)]
    pub grace_period: u32,

    /// Days-before-deletion at which owners are notified.
    #[arg(
        long,
        env = "REAPER_NOTIF_TIMES",
        value_delimiter = ',',
        default_values_t = DEFAULT_NOTIF_TIMES
    )]
    pub notif_times: Vec<u32>,

    /// Log what would happen without deleting, notifying or writing labels.
    #[arg(long, env = "REAPER_DRY_RUN")]
    pub dry_run: bool,

    /// Keep running, one pass every N seconds, until interrupted.
    #[arg(long)]
    pub interval_secs: Option<u64>,

    /// Per-call timeout in seconds for cluster and notifier calls.
    #[arg(long, default_value_t = DEFAULT_CALL_TIMEOUT.as_secs())]
    pub call_timeout_secs: u64,

    /// Email API base URL. Without it notices are only logged.
    #[arg(long, env = "REAPER_EMAIL_BASE_URL")]
    pub email_base_url: Option<String>,

    #[arg(long, env = "REAPER_EMAIL_API_KEY", hide_env_values = true, default_value = "")]
    pub email_api_key: String,

    #[arg(long, env = "REAPER_EMAIL_TEMPLATE_ID", default_value = "")]
    pub email_template_id: String,

    /// Recipient used for every namespace.
    #[arg(long, env = "REAPER_EMAIL_RECIPIENT")]
    pub email_recipient: Option<String>,
}

impl ReconcileArgs {
    pub fn config(&self, cli: &Cli) -> SchedulerConfig {
        SchedulerConfig {
            namespace: cli.namespace.clone(),
            labels: cli.labels(),
            grace_period_days: self.grace_period,
            notif_times: NotificationSchedule::new(self.notif_times.iter().copied()),
            dry_run: self.dry_run,
            call_timeout: Duration::from_secs(self.call_timeout_secs),
        }
    }

    pub fn notifier(&self) -> Result<Arc<dyn Notifier>> {
        let Some(base_url) = &self.email_base_url else {
            return Ok(Arc::new(LogNotifier));
        };
        let config = EmailConfig {
            base_url: base_url.clone(),
            api_key: self.email_api_key.clone(),
            template_id: self.email_template_id.clone(),
            default_recipient: self.email_recipient.clone(),
            ..EmailConfig::default()
        };
        let notifier = HttpNotifier::new(config).context("invalid email configuration")?;
        Ok(Arc::new(notifier))
    }
}

/// Execute the reconcile command.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be read or written, the
/// configuration is invalid, or a single pass fails to list claims.
pub async fn execute(args: &ReconcileArgs, cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let reaper = ReaperBuilder::new(store.clone())
        .notifier(args.notifier()?)
        .with_scheduler(args.config(cli))
        .build()
        .context("invalid reconcile configuration")?;
    let scheduler = reaper.scheduler().context("scheduler was not built")?;

    let Some(secs) = args.interval_secs else {
        let summary = scheduler.run_pass().await?;
        snapshot::save(&cli.snapshot, &store).await?;
        return report(
            cli.output,
            &format!(
                "pass {}: {} claims, {} deleted, {} notified, {} untracked, {} errors",
                summary.pass_id,
                summary.claims_seen,
                summary.deletions,
                summary.notifications,
                summary.untracked,
                summary.errors
            ),
            &summary,
        );
    };

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, stopping after the current pass");
                let _ = tx.send(true);
            }
            Err(err) => {
                warn!(error = %err, "cannot listen for interrupts, running until killed");
                std::future::pending::<()>().await;
                drop(tx);
            }
        }
    });

    let passes = ReaperLoop::new(scheduler, Duration::from_secs(secs.max(1)))
        .run(rx)
        .await;
    snapshot::save(&cli.snapshot, &store).await?;

    report(
        cli.output,
        &format!("completed {passes} passes"),
        &serde_json::json!({ "passes": passes }),
    )
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::{Cli, Commands};

    fn parse(extra: &[&str]) -> Cli {
        let mut argv = vec![
            "reaper",
            "--snapshot",
            "c.json",
            "--namespace",
            "team-a",
            "reconcile",
        ];
        argv.extend_from_slice(extra);
        Cli::parse_from(argv)
    }

    #[test]
    fn defaults_match_stock_deployment() {
        let cli = parse(&[]);
        let Commands::Reconcile(args) = &cli.command else {
            panic!("expected reconcile");
        };
        let config = args.config(&cli);
        assert_eq!(config.namespace, "team-a");
        assert_eq!(config.grace_period_days, 180);
        assert_eq!(config.notif_times.as_slice(), &[30, 7, 4, 3, 2, 1]);
        assert_eq!(config.notif_times, SchedulerConfig::default().notif_times);
        assert_eq!(args.notif_times, DEFAULT_NOTIF_TIMES.to_vec());
        assert!(!config.dry_run);
        assert!(args.email_base_url.is_none());
    }

    #[test]
    fn schedule_flag_is_comma_separated() {
        let cli = parse(&["--notif-times", "1,7,3", "--grace-period", "10", "--dry-run"]);
        let Commands::Reconcile(args) = &cli.command else {
            panic!("expected reconcile");
        };
        let config = args.config(&cli);
        assert_eq!(config.notif_times.as_slice(), &[7, 3, 1]);
        assert_eq!(config.grace_period_days, 10);
        assert!(config.dry_run);
    }

    #[test]
    fn email_without_template_is_rejected() {
        let cli = parse(&["--email-base-url", "https://notify.example.com"]);
        let Commands::Reconcile(args) = &cli.command else {
            panic!("expected reconcile");
        };
        assert!(args.notifier().is_err());
    }
}
