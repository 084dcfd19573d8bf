//! Display command bus and terminal front end
//!
//! The ingestion loop never touches display state directly; it posts
//! commands onto the bus and the display task drains them on its own
//! schedule. A fixed 1 s clock tick drives the header clock and expires
//! stale notices.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, Instant};
use tracing::debug;

use tagmark_common::db::AttendanceRecord;
use tagmark_common::time;

/// Clock tick cadence
const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Commands posted by the background side.
#[derive(Debug, Clone)]
pub enum DisplayCommand {
    /// Replace the attendance log view.
    Render(Vec<AttendanceRecord>),
    /// Show a transient notice.
    Notice {
        text: String,
        dismiss_after: Duration,
    },
}

/// Cloneable sending half of the display queue.
#[derive(Clone)]
pub struct DisplayBus {
    tx: mpsc::UnboundedSender<DisplayCommand>,
}

impl DisplayBus {
    /// Create a bus and its receiving half.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DisplayCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn render(&self, records: Vec<AttendanceRecord>) {
        let _ = self.tx.send(DisplayCommand::Render(records));
    }

    pub fn notice(&self, text: &str, dismiss_after: Duration) {
        let _ = self.tx.send(DisplayCommand::Notice {
            text: text.to_string(),
            dismiss_after,
        });
    }
}

/// Display state owned by the display task.
struct TerminalDisplay {
    records: Vec<AttendanceRecord>,
    notice: Option<(String, Instant)>,
}

impl TerminalDisplay {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            notice: None,
        }
    }

    /// Apply one command. Returns whether the screen needs repainting.
    fn apply(&mut self, cmd: DisplayCommand, now: Instant) -> bool {
        match cmd {
            DisplayCommand::Render(records) => {
                self.records = records;
                true
            }
            DisplayCommand::Notice {
                text,
                dismiss_after,
            } => {
                self.notice = Some((text, now + dismiss_after));
                true
            }
        }
    }

    /// Advance the clock: expire the active notice once its deadline passes.
    /// Returns whether the screen needs repainting.
    fn tick(&mut self, now: Instant) -> bool {
        let expired = matches!(&self.notice, Some((_, expires)) if now >= *expires);
        if expired {
            self.notice = None;
        }
        expired
    }

    /// One full frame: clock header, log table, active notice.
    fn format_frame(&self) -> String {
        let mut frame = String::new();
        frame.push_str(&format!(
            "== RFID Attendance System == {}\n",
            time::format_wall_time(time::now_local())
        ));
        frame.push_str(&format!(
            "{:<20} {:<24} {:<24}\n",
            "Name", "Time In", "Time Out"
        ));
        for record in &self.records {
            frame.push_str(&format!(
                "{:<20} {:<24} {:<24}\n",
                record.name,
                time::format_wall_time(record.time_in),
                time::format_wall_time_opt(record.time_out),
            ));
        }
        if let Some((text, _)) = &self.notice {
            frame.push_str(&format!(">> {}\n", text));
        }
        frame
    }

    fn paint(&self) {
        println!("{}", self.format_frame());
    }
}

/// Create the bus and spawn the display task.
pub fn spawn() -> (DisplayBus, tokio::task::JoinHandle<()>) {
    let (bus, mut rx) = DisplayBus::channel();

    let handle = tokio::spawn(async move {
        let mut display = TerminalDisplay::new();
        let mut clock = interval(CLOCK_TICK);

        loop {
            tokio::select! {
                cmd = rx.recv() => {
                    match cmd {
                        Some(cmd) => {
                            if display.apply(cmd, Instant::now()) {
                                display.paint();
                            }
                        }
                        None => break,
                    }
                }
                _ = clock.tick() => {
                    if display.tick(Instant::now()) {
                        display.paint();
                    }
                }
            }
        }
        debug!("Display task stopped");
    });

    (bus, handle)
}
