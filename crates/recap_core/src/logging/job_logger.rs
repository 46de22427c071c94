//! Per-job logger with file and callback output.
//!
//! Each compose job gets its own logger that writes to a dedicated log
//! file, echoes to an optional callback, and keeps a bounded tail buffer of
//! backend output. The tail buffer is what feeds the `backendTrace` field
//! of failure responses.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

/// Per-job logger with dual output (file + callback).
pub struct JobLogger {
    job_name: String,
    log_path: PathBuf,
    file_writer: Mutex<Option<BufWriter<File>>>,
    callback: Mutex<Option<LogCallback>>,
    config: LogConfig,
    /// Recent backend output lines, for error diagnosis.
    tail_buffer: Mutex<VecDeque<String>>,
    /// Last progress value logged (compact mode filtering).
    last_progress: Mutex<u32>,
}

impl JobLogger {
    /// Create a new job logger writing to `<log_dir>/<job_name>.log`.
    pub fn new(
        job_name: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> std::io::Result<Arc<Self>> {
        let job_name = job_name.into();
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let log_path = log_dir.join(format!("{}.log", sanitize_filename(&job_name)));
        let writer = BufWriter::new(File::create(&log_path)?);

        Ok(Arc::new(Self {
            job_name,
            log_path,
            file_writer: Mutex::new(Some(writer)),
            callback: Mutex::new(callback),
            config,
            tail_buffer: Mutex::new(VecDeque::with_capacity(64)),
            last_progress: Mutex::new(0),
        }))
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Log a message at the specified level.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }
        let formatted = self.format_message(message);
        self.emit(&formatted);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, &MessagePrefix::Warning.format(message));
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, &MessagePrefix::Error.format(message));
    }

    /// Log a command being executed.
    pub fn command(&self, command: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Command.format(command));
    }

    /// Log a pipeline phase marker.
    pub fn phase(&self, phase_name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Phase.format(phase_name));
    }

    pub fn success(&self, message: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Success.format(message));
    }

    /// Log a progress update, filtered to configured steps in compact mode.
    ///
    /// Returns true if the update was logged.
    pub fn progress(&self, percent: u32) -> bool {
        if self.config.compact {
            let mut last = self.last_progress.lock();
            let step = self.config.progress_step.max(1);
            if (percent / step) * step <= (*last / step) * step && percent < 100 {
                return false;
            }
            *last = percent;
        }
        self.log(LogLevel::Info, &format!("Progress: {}%", percent));
        true
    }

    /// Record a line of backend (ffmpeg/ffprobe) output.
    ///
    /// Always retained in the tail buffer; echoed to the log only outside
    /// compact mode.
    pub fn backend_line(&self, line: &str) {
        {
            let mut buffer = self.tail_buffer.lock();
            if buffer.len() >= self.config.error_tail.max(1) {
                buffer.pop_front();
            }
            buffer.push_back(line.to_string());
        }
        if !self.config.compact {
            self.emit(&self.format_message(&format!("[backend] {}", line)));
        }
    }

    /// Snapshot of the backend output tail, newline-joined.
    ///
    /// Empty result means no backend output was captured.
    pub fn backend_tail(&self) -> String {
        let buffer = self.tail_buffer.lock();
        buffer.iter().cloned().collect::<Vec<_>>().join("\n")
    }

    /// Clear the backend tail buffer (called between backend invocations).
    pub fn clear_tail(&self) {
        self.tail_buffer.lock().clear();
    }

    /// Flush the log file.
    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writer.flush();
        }
    }

    /// Close the logger and release the file handle.
    pub fn close(&self) {
        self.flush();
        *self.file_writer.lock() = None;
    }

    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
        } else {
            message.to_string()
        }
    }

    fn emit(&self, formatted: &str) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writeln!(writer, "{}", formatted);
        }
        if let Some(ref callback) = *self.callback.lock() {
            callback(formatted);
        }
    }
}

impl Drop for JobLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Sanitize a string to be safe for use as a filename.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}
