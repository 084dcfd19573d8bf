//! Ingestion loop
//!
//! Consumes decoded tag scans, resolves them against the registry, toggles
//! attendance state, refreshes the display and fires the email notification.
//! Every decision re-reads the stores; nothing is cached across scans.
//!
//! Store faults never stop the loop: the scan is logged, skipped and
//! acknowledged `failed` so the device still gives the user feedback.

use std::sync::mpsc::Sender as AckSender;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sqlx::SqlitePool;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error, info, warn};

use tagmark_common::db::{self, User};
use tagmark_common::events::AttendanceAction;
use tagmark_common::time;

use crate::display::DisplayBus;
use crate::notifier::EmailNotifier;
use crate::reader::{Ack, TagScan};

/// How long notices stay on screen
const NOTICE_DISMISS_AFTER: Duration = Duration::from_secs(3);

/// The attendance ingestion loop.
pub struct IngestLoop {
    pool: SqlitePool,
    display: DisplayBus,
    notifier: Option<Arc<EmailNotifier>>,
    ack_tx: AckSender<Ack>,
    duplicate_window: Duration,
    last_scan: Option<(String, Instant)>,
}

impl IngestLoop {
    pub fn new(
        pool: SqlitePool,
        display: DisplayBus,
        notifier: Option<Arc<EmailNotifier>>,
        ack_tx: AckSender<Ack>,
        duplicate_window: Duration,
    ) -> Self {
        Self {
            pool,
            display,
            notifier,
            ack_tx,
            duplicate_window,
            last_scan: None,
        }
    }

    /// Run until the reader side closes the scan channel.
    pub async fn run(mut self, mut scans: Receiver<TagScan>) {
        while let Some(scan) = scans.recv().await {
            self.handle_scan(scan).await;
        }
        debug!("Ingestion loop stopped");
    }

    async fn handle_scan(&mut self, scan: TagScan) {
        // Duplicate card reads of one presentation: drop before the toggle.
        // The first read already produced device feedback, so stay silent.
        if self.is_duplicate(&scan.hexcode) {
            debug!("Duplicate read of {} ignored", scan.hexcode);
            self.send_ack(Ack::Silent);
            return;
        }
        self.last_scan = Some((scan.hexcode.clone(), Instant::now()));

        let user = match db::lookup_user(&self.pool, &scan.hexcode).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                info!("Tag code {} not found in the registry", scan.hexcode);
                self.send_ack(Ack::Failed);
                self.display.notice("Invalid ID", NOTICE_DISMISS_AFTER);
                return;
            }
            Err(e) => {
                error!("Registry lookup failed for {}: {}", scan.hexcode, e);
                self.send_ack(Ack::Failed);
                return;
            }
        };

        let now = time::now_local();
        let action = match db::toggle_attendance(&self.pool, &user.name, now).await {
            Ok(action) => action,
            Err(e) => {
                error!("Attendance toggle failed for {}: {}", user.name, e);
                self.send_ack(Ack::Failed);
                return;
            }
        };
        info!("{}: {} at {}", user.name, action.label(), time::format_wall_time(now));

        if let Err(e) = self.refresh_display().await {
            warn!("Display refresh failed: {}", e);
        }
        self.notify(user, now, action);
        self.send_ack(Ack::Success);
        self.display.notice("Valid ID", NOTICE_DISMISS_AFTER);
    }

    fn is_duplicate(&self, hexcode: &str) -> bool {
        match &self.last_scan {
            Some((code, at)) => code == hexcode && at.elapsed() < self.duplicate_window,
            None => false,
        }
    }

    /// Re-read the full log and push it to the display queue.
    async fn refresh_display(&self) -> tagmark_common::Result<()> {
        let records = db::list_records(&self.pool).await?;
        self.display.render(records);
        Ok(())
    }

    /// Fire-and-forget email notification; failures are logged only.
    fn notify(&self, user: User, at: chrono::NaiveDateTime, action: AttendanceAction) {
        let Some(notifier) = self.notifier.clone() else {
            debug!("Email notification disabled");
            return;
        };
        tokio::spawn(async move {
            if let Err(e) = notifier.send(&user, at, action).await {
                warn!("Failed to send email to {}: {}", user.email, e);
            }
        });
    }

    fn send_ack(&self, ack: Ack) {
        if self.ack_tx.send(ack).is_err() {
            warn!("Reader acknowledgment channel closed");
        }
    }
}
