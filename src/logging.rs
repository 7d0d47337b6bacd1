//! Asynchronous audit logging for the firing engine.
//!
//! A [`Logger`] queues messages from the calling thread and hands them to
//! a dedicated background thread, which opens the sink, drains whatever
//! has queued up, and closes it again. Besides the sink, every message is
//! also mirrored as a `tracing` event on the caller's thread for ambient
//! structured diagnostics, independent of whatever sink is configured.

use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::{SystemTime, UNIX_EPOCH};

use crossbeam_channel::{Receiver, Sender};

/// Where audit log messages end up. Implementors run entirely on the
/// logger's background thread; no synchronization is required between
/// `open`/`write`/`close` calls.
pub trait LogSink: Send {
    fn open(&mut self);
    fn write(&mut self, message: &str);
    fn close(&mut self);
}

/// Appends every drained batch to `folder/name.txt`.
pub struct FileLogSink {
    folder: PathBuf,
    name: String,
    file: Option<File>,
}

impl FileLogSink {
    pub fn new(folder: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        FileLogSink {
            folder: folder.into(),
            name: name.into(),
            file: None,
        }
    }

    fn path(&self) -> PathBuf {
        self.folder.join(format!("{}.txt", self.name))
    }
}

impl LogSink for FileLogSink {
    fn open(&mut self) {
        self.file = OpenOptions::new().create(true).append(true).open(self.path()).ok();
    }

    fn write(&mut self, message: &str) {
        if let Some(file) = self.file.as_mut() {
            let _ = writeln!(file, "{message}");
        }
    }

    fn close(&mut self) {
        self.file = None;
    }
}

/// Discards every message. Useful for callers who want a [`LogSink`] that
/// still exercises the background-thread machinery (e.g. in tests) but
/// writes nothing anywhere.
pub struct NullLogSink;

impl LogSink for NullLogSink {
    fn open(&mut self) {}
    fn write(&mut self, _message: &str) {}
    fn close(&mut self) {}
}

struct LogItem {
    time: SystemTime,
    message: String,
}

impl LogItem {
    fn format(&self) -> String {
        let micros = self
            .time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros())
            .unwrap_or(0);
        format!("{}.{:06} {}", micros / 1_000_000, micros % 1_000_000, self.message)
    }
}

/// The engine's handle onto the logging subsystem: queues messages for
/// the background sink and mirrors each one as a `tracing` event.
///
/// A net built without a configured log folder gets [`Logger::noop`],
/// which skips the background thread and channel entirely, so the
/// common default path pays nothing beyond a level check.
pub struct Logger {
    sender: Option<Sender<LogItem>>,
    handle: Option<JoinHandle<()>>,
    active: bool,
}

impl Logger {
    /// Spawns the background thread that drains `sink`. `channel_capacity`
    /// bounds the channel between caller and sink; a message submitted
    /// while the channel is full is dropped rather than blocking the
    /// caller.
    pub fn spawn(mut sink: impl LogSink + 'static, channel_capacity: usize) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(channel_capacity);
        let handle = std::thread::spawn(move || Self::drain(&mut sink, &receiver));
        Logger {
            sender: Some(sender),
            handle: Some(handle),
            active: true,
        }
    }

    /// A logger that discards everything, for tests and for nets built
    /// without a configured log folder. Spawns no thread and opens no
    /// channel.
    pub fn noop() -> Self {
        Logger {
            sender: None,
            handle: None,
            active: false,
        }
    }

    /// Logs a message, built lazily: `message` is only called if the
    /// logger is active or a `tracing` subscriber at debug level or
    /// above is listening, so the caller doesn't pay for formatting a
    /// message nobody will see.
    pub fn log(&self, message: impl FnOnce() -> String) {
        if !self.active && !tracing::enabled!(target: "petri_net", tracing::Level::DEBUG) {
            return;
        }
        let message = message();
        tracing::debug!(target: "petri_net", "{message}");
        if let Some(sender) = &self.sender {
            let _ = sender.try_send(LogItem {
                time: SystemTime::now(),
                message,
            });
        }
    }

    fn drain(sink: &mut dyn LogSink, receiver: &Receiver<LogItem>) {
        while let Ok(first) = receiver.recv() {
            sink.open();
            sink.write(&first.format());
            while let Ok(item) = receiver.try_recv() {
                sink.write(&item.format());
            }
            sink.close();
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        // Dropping the sender closes the channel, so `drain`'s `recv()`
        // returns `Err` and the background thread exits on its own.
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Convenience constructor used by [`crate::petri_net::net::PetriNet`]:
/// a file sink rooted at `folder`, or [`Logger::noop`] if none is
/// configured.
pub fn logger_for(folder: Option<&Path>, channel_capacity: usize) -> Logger {
    match folder {
        Some(folder) => Logger::spawn(FileLogSink::new(folder, "petri_net"), channel_capacity),
        None => Logger::noop(),
    }
}
