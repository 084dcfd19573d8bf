//! Serial tag reader
//!
//! Owns the serial connection to the RFID microcontroller. Serial I/O is
//! blocking, so the reader runs on a dedicated thread polling on a fixed
//! cadence. Decoded tag codes are handed to the ingestion loop over a
//! channel; the acknowledgment decision comes back over a second channel and
//! is written to the device as a single `success` or `failed` line so it can
//! drive its LED/buzzer feedback.
//!
//! A communication fault drops the connection and triggers a reconnect
//! attempt on the next tick; the loop never terminates on its own.

use once_cell::sync::Lazy;
use regex::Regex;
use serialport::SerialPort;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tracing::{debug, info, warn};

use tagmark_common::config::SerialConfig;

/// Read timeout on the open port; short so the poll loop never stalls
const READ_TIMEOUT_MS: u64 = 100;

/// How long the reader waits for an acknowledgment decision per scan
const ACK_TIMEOUT: Duration = Duration::from_secs(5);

static HEXCODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Received Hexcode:\s*([0-9A-Fa-f]+)").expect("valid pattern"));

/// A decoded tag scan handed to the ingestion loop.
#[derive(Debug, Clone)]
pub struct TagScan {
    pub hexcode: String,
}

/// Acknowledgment decision for one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// Write `success` to the device.
    Success,
    /// Write `failed` to the device.
    Failed,
    /// Write nothing (duplicate card reads).
    Silent,
}

impl Ack {
    fn line(&self) -> Option<&'static [u8]> {
        match self {
            Ack::Success => Some(b"success\n"),
            Ack::Failed => Some(b"failed\n"),
            Ack::Silent => None,
        }
    }
}

/// Extract the tag code from one line of reader output.
///
/// Lines that do not carry a hexcode yield `None`; upstream ignores them
/// without acknowledging.
pub fn decode_line(line: &str) -> Option<String> {
    HEXCODE_PATTERN
        .captures(line)
        .map(|caps| caps[1].to_string())
}

/// Serial connection state plus the line accumulator.
struct TagReader {
    port: Option<Box<dyn SerialPort>>,
    configured_port: Option<String>,
    baud_rate: u32,
    line_buf: Vec<u8>,
}

impl TagReader {
    fn new(configured_port: Option<String>, baud_rate: u32) -> Self {
        Self {
            port: None,
            configured_port,
            baud_rate,
            line_buf: Vec::new(),
        }
    }

    /// Open the configured port, or the first discovered one. On failure the
    /// connection stays unset and the next tick retries.
    fn connect(&mut self) {
        let name = match self.configured_port.clone().or_else(find_serial_port) {
            Some(name) => name,
            None => {
                debug!("No serial port available");
                return;
            }
        };

        match serialport::new(name.as_str(), self.baud_rate)
            .timeout(Duration::from_millis(READ_TIMEOUT_MS))
            .open()
        {
            Ok(port) => {
                info!("Serial connection established on {}", name);
                self.port = Some(port);
            }
            Err(e) => {
                warn!("Error opening serial port {}: {}", name, e);
                self.port = None;
            }
        }
    }

    /// Drain whatever bytes are waiting and return the completed lines.
    fn poll_lines(&mut self) -> Vec<String> {
        let Some(port) = self.port.as_mut() else {
            return Vec::new();
        };

        let pending = match port.bytes_to_read() {
            Ok(n) => n,
            Err(e) => {
                warn!("Serial communication error: {}", e);
                self.port = None;
                return Vec::new();
            }
        };
        if pending == 0 {
            return Vec::new();
        }

        let mut chunk = vec![0u8; pending as usize];
        match port.read(&mut chunk) {
            Ok(n) => self.line_buf.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => {
                warn!("Serial communication error: {}", e);
                self.port = None;
            }
        }

        self.take_lines()
    }

    /// Split completed lines out of the accumulator. Invalid byte sequences
    /// are dropped, not fatal.
    fn take_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(pos) = self.line_buf.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.line_buf.drain(..=pos).collect();
            let line: String = String::from_utf8_lossy(&raw)
                .chars()
                .filter(|&c| c != char::REPLACEMENT_CHARACTER)
                .collect();
            let line = line.trim().to_string();
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }

    /// Write the acknowledgment line back to the device.
    fn acknowledge(&mut self, ack: Ack) {
        let Some(line) = ack.line() else {
            return;
        };
        let Some(port) = self.port.as_mut() else {
            return;
        };
        if let Err(e) = port.write_all(line).and_then(|_| port.flush()) {
            warn!("Failed to acknowledge reader: {}", e);
            self.port = None;
        }
    }
}

/// Pick the first available port matching the platform naming convention.
fn find_serial_port() -> Option<String> {
    let ports = match serialport::available_ports() {
        Ok(ports) => ports,
        Err(e) => {
            warn!("Serial port enumeration failed: {}", e);
            return None;
        }
    };

    ports
        .into_iter()
        .map(|p| p.port_name)
        .find(|name| is_reader_port(name))
}

/// Platform naming convention for USB serial adapters.
fn is_reader_port(name: &str) -> bool {
    if cfg!(target_os = "windows") {
        name.starts_with("COM")
    } else if cfg!(target_os = "macos") {
        name.starts_with("/dev/cu.")
    } else {
        name.starts_with("/dev/ttyUSB") || name.starts_with("/dev/ttyACM")
    }
}

/// Spawn the reader thread.
///
/// `scan_tx` carries decoded scans to the ingestion loop; `ack_rx` returns
/// the acknowledgment decision for each scan sent. The thread exits when
/// `shutdown` is set or the ingestion side goes away; the port closes on
/// drop either way.
pub fn spawn(
    config: SerialConfig,
    scan_tx: Sender<TagScan>,
    ack_rx: Receiver<Ack>,
    shutdown: Arc<AtomicBool>,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("tag-reader".into())
        .spawn(move || {
            let mut reader = TagReader::new(config.port.clone(), config.baud_rate);
            let poll_interval = Duration::from_millis(config.poll_interval_ms);
            reader.connect();

            while !shutdown.load(Ordering::Relaxed) {
                if reader.port.is_none() {
                    reader.connect();
                }

                for line in reader.poll_lines() {
                    let Some(hexcode) = decode_line(&line) else {
                        debug!("Line from reader ignored: {}", line);
                        continue;
                    };
                    debug!("Hex code received: {}", hexcode);

                    if scan_tx.blocking_send(TagScan { hexcode }).is_err() {
                        // Ingestion side gone; nothing left to feed
                        info!("Tag reader stopped");
                        return;
                    }
                    match ack_rx.recv_timeout(ACK_TIMEOUT) {
                        Ok(ack) => reader.acknowledge(ack),
                        Err(RecvTimeoutError::Timeout) => {
                            warn!("No acknowledgment decision within {:?}", ACK_TIMEOUT)
                        }
                        Err(RecvTimeoutError::Disconnected) => {
                            info!("Tag reader stopped");
                            return;
                        }
                    }
                }

                std::thread::sleep(poll_interval);
            }
            info!("Tag reader stopped");
        })
}
