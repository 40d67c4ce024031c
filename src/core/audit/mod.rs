//! Audit stream for gate decisions
//!
//! Append-only and non-blocking: filters push one record per decision-worthy
//! event into a bounded queue and a background flush thread writes plain
//! text lines to the process's standard diagnostic stream. A full queue
//! displaces the oldest record instead of blocking the request path, and a
//! sink failure is ignored; audit trouble must never fail or stall the
//! surrounding request or instance handling.
//!
//! The literal decision strings in the lines are contract: operators grep
//! the stream for `"no access"`, `"Identity is removed"`, and
//! `"You should remove the identity"`.

use chrono::DateTime;
use crossbeam::queue::ArrayQueue;
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Single audit record carried through the queue
#[derive(Debug, Clone)]
pub struct AuditRecord {
    /// Microsecond timestamp since UNIX epoch
    pub timestamp_us: u64,
    /// Decision line, contract strings included
    pub line: String,
}

impl AuditRecord {
    /// Create a record stamped with the current time
    pub fn new(line: impl Into<String>) -> Self {
        let timestamp_us = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64;

        AuditRecord {
            timestamp_us,
            line: line.into(),
        }
    }

    /// Render as `<RFC3339 micros> <line>`
    pub fn render(&self) -> String {
        match DateTime::from_timestamp_micros(self.timestamp_us as i64) {
            Some(ts) => format!("{} {}", ts.format("%Y-%m-%dT%H:%M:%S%.6fZ"), self.line),
            None => self.line.clone(),
        }
    }
}

/// Non-blocking audit log with background flushing
pub struct AuditLog {
    /// Bounded queue between decision threads and the flush thread
    queue: Arc<ArrayQueue<AuditRecord>>,
    /// Background flush thread handle
    flush_thread: Option<JoinHandle<()>>,
    /// How often the flush thread drains the queue
    flush_interval: Duration,
    /// Whether the flush thread should keep running
    running: Arc<Mutex<bool>>,
}

impl AuditLog {
    /// Default queue capacity
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Default flush interval
    pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

    /// Create an audit log; call `start` or `start_stderr` to begin flushing
    pub fn new(capacity: usize, flush_interval: Duration) -> Self {
        AuditLog {
            queue: Arc::new(ArrayQueue::new(capacity.max(1))),
            flush_thread: None,
            flush_interval,
            running: Arc::new(Mutex::new(false)),
        }
    }

    /// Start the background flush thread with a custom sink
    ///
    /// The sink is called with batches of records in arrival order. After
    /// `stop` is requested the queue is drained once more so no accepted
    /// record is dropped on shutdown.
    pub fn start<F>(&mut self, sink: F)
    where
        F: Fn(&[AuditRecord]) + Send + 'static,
    {
        *self.running.lock() = true;

        let queue = Arc::clone(&self.queue);
        let flush_interval = self.flush_interval;
        let running = Arc::clone(&self.running);

        let flush_thread = thread::spawn(move || {
            while *running.lock() {
                thread::sleep(flush_interval);

                let records = drain(&queue, 1000);
                if !records.is_empty() {
                    sink(&records);
                }
            }

            // Final drain so stop() flushes the tail
            loop {
                let records = drain(&queue, 1000);
                if records.is_empty() {
                    break;
                }
                sink(&records);
            }
        });

        self.flush_thread = Some(flush_thread);
    }

    /// Start flushing to the standard diagnostic stream
    pub fn start_stderr(&mut self) {
        self.start(write_stderr);
    }

    /// Stop the flush thread, draining whatever is still queued
    pub fn stop(&mut self) {
        *self.running.lock() = false;

        if let Some(thread) = self.flush_thread.take() {
            let _ = thread.join();
        }
    }

    /// Append a record (non-blocking; displaces the oldest when full)
    pub fn log(&self, line: impl Into<String>) {
        let _ = self.queue.force_push(AuditRecord::new(line));
    }

    /// Number of records waiting for the flush thread
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Drop for AuditLog {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Pop up to `max_count` records from the queue
fn drain(queue: &ArrayQueue<AuditRecord>, max_count: usize) -> Vec<AuditRecord> {
    let mut batch = Vec::new();
    while batch.len() < max_count {
        match queue.pop() {
            Some(record) => batch.push(record),
            None => break,
        }
    }
    batch
}

/// Default sink: one line per record on stderr, write errors ignored
fn write_stderr(records: &[AuditRecord]) {
    let stderr = std::io::stderr();
    let mut out = stderr.lock();
    for record in records {
        let _ = writeln!(out, "{}", record.render());
    }
}
