use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use rallysplit_core::Core;
use rallysplit_types::models::OverdueObligation;

/// Delivery of a single reminder to the chat transport.
pub trait Notify {
    async fn notify(&self, obligation: &OverdueObligation) -> Result<()>;
}

/// Default notifier: posts each obligation to a configured webhook where the
/// chat transport turns it into a group nudge. Without a webhook the log
/// line is the delivery, which is enough for local runs.
pub enum Notifier {
    Webhook { client: reqwest::Client, url: String },
    Log,
}

impl Notifier {
    pub fn from_env() -> Self {
        match std::env::var("RALLYSPLIT_REMINDER_WEBHOOK") {
            Ok(url) if !url.is_empty() => {
                info!("Reminders will be delivered to {}", url);
                Notifier::Webhook {
                    client: reqwest::Client::new(),
                    url,
                }
            }
            _ => {
                info!("No reminder webhook configured, reminders go to the log");
                Notifier::Log
            }
        }
    }
}

impl Notify for Notifier {
    async fn notify(&self, obligation: &OverdueObligation) -> Result<()> {
        match self {
            Notifier::Webhook { client, url } => {
                client
                    .post(url)
                    .json(obligation)
                    .send()
                    .await?
                    .error_for_status()?;
                Ok(())
            }
            Notifier::Log => {
                info!(
                    "Reminder due: user {} owes {:.2} for session {} (deadline was {})",
                    obligation.user_id,
                    obligation.amount,
                    obligation.session_id,
                    obligation.payment_deadline
                );
                Ok(())
            }
        }
    }
}

/// Background task surfacing overdue obligations on an interval.
pub async fn run_reminder_loop<N: Notify>(core: Core, notifier: N, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        match sweep_once(&core, &notifier).await {
            Ok(count) => {
                if count > 0 {
                    info!("Reminder sweep: delivered {} reminders", count);
                }
            }
            Err(e) => {
                warn!("Reminder sweep error: {}", e);
            }
        }
    }
}

/// One sweep pass: notify, then flag. The flag is only set after a
/// successful delivery, so a failed send retries on the next tick
/// (at-least-once, which is fine for reminders).
pub async fn sweep_once<N: Notify>(core: &Core, notifier: &N) -> Result<usize> {
    let overdue = core.overdue(Utc::now())?;

    let mut delivered = 0;
    for obligation in &overdue {
        if let Err(e) = notifier.notify(obligation).await {
            warn!(
                "Failed to deliver reminder to user {} for session {}: {}",
                obligation.user_id, obligation.session_id, e
            );
            continue;
        }
        core.mark_reminder_sent(obligation.session_id, obligation.user_id, Utc::now())?;
        delivered += 1;
    }

    Ok(delivered)
}
