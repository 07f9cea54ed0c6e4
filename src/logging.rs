//! Structured logging for counter lifecycle events.
//!
//! Counters log only at their rare transitions (completion, lost claims,
//! underflow, rejected increments), never on the ordinary increment and
//! decrement path. Logging is off unless enabled through
//! [`LoggingConfig`](crate::config::LoggingConfig).

use crate::config::LoggingConfig;
use crate::error::{OutstandingOpsError, Result};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Log level for counter events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Trace-level logging (very verbose)
    Trace = 0,
    /// Debug-level logging
    Debug = 1,
    /// Info-level logging
    Info = 2,
    /// Warning-level logging
    Warn = 3,
    /// Error-level logging
    Error = 4,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// A single structured log record.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Timestamp when the entry was created
    pub timestamp: SystemTime,
    /// Log level
    pub level: LogLevel,
    /// Component that generated the entry
    pub component: String,
    /// Name of the counter, if it has one
    pub counter: Option<String>,
    /// Outstanding count observed when the event happened
    pub outstanding: Option<u64>,
    /// Message content
    pub message: String,
    /// Additional structured data, kept sorted for stable output
    pub metadata: BTreeMap<String, String>,
}

impl LogEntry {
    /// Create a new log entry.
    pub fn new(level: LogLevel, component: &str, message: &str) -> Self {
        Self {
            timestamp: SystemTime::now(),
            level,
            component: component.to_string(),
            counter: None,
            outstanding: None,
            message: message.to_string(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach the counter name.
    pub fn with_counter(mut self, name: &str) -> Self {
        self.counter = Some(name.to_string());
        self
    }

    /// Attach the observed outstanding count.
    pub fn with_outstanding(mut self, outstanding: u64) -> Self {
        self.outstanding = Some(outstanding);
        self
    }

    /// Add metadata to the log entry.
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    fn millis(&self) -> u128 {
        self.timestamp
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
    }

    /// Format the log entry as a human-readable line.
    pub fn format(&self) -> String {
        let mut parts = vec![
            format!("[{}]", self.millis()),
            self.level.to_string(),
            self.component.clone(),
        ];

        if let Some(counter) = &self.counter {
            parts.push(format!("counter:{}", counter));
        }

        if let Some(outstanding) = self.outstanding {
            parts.push(format!("outstanding:{}", outstanding));
        }

        parts.push(self.message.clone());

        if !self.metadata.is_empty() {
            let metadata_str = self
                .metadata
                .iter()
                .map(|(k, v)| format!("{}:{}", k, v))
                .collect::<Vec<_>>()
                .join(",");
            parts.push(format!("metadata:{{{}}}", metadata_str));
        }

        parts.join(" ")
    }

    /// Format the log entry as a single JSON object.
    pub fn format_json(&self) -> String {
        let mut json_parts = vec![
            format!("\"timestamp\":{}", self.millis()),
            format!("\"level\":\"{}\"", self.level),
            format!("\"component\":\"{}\"", escape_json(&self.component)),
            format!("\"message\":\"{}\"", escape_json(&self.message)),
        ];

        if let Some(counter) = &self.counter {
            json_parts.push(format!("\"counter\":\"{}\"", escape_json(counter)));
        }

        if let Some(outstanding) = self.outstanding {
            json_parts.push(format!("\"outstanding\":{}", outstanding));
        }

        if !self.metadata.is_empty() {
            let metadata_json = self
                .metadata
                .iter()
                .map(|(k, v)| format!("\"{}\":\"{}\"", escape_json(k), escape_json(v)))
                .collect::<Vec<_>>()
                .join(",");
            json_parts.push(format!("\"metadata\":{{{}}}", metadata_json));
        }

        format!("{{{}}}", json_parts.join(","))
    }
}

fn escape_json(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if c < '\u{20}' => escaped.push_str(&format!("\\u{:04x}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Destination for log entries.
pub trait LogOutput: Send + Sync {
    /// Write a log entry to the output.
    fn write(&self, entry: &LogEntry) -> Result<()>;

    /// Flush any buffered output.
    fn flush(&self) -> Result<()>;
}

/// Writes entries to stderr.
#[derive(Debug, Default)]
pub struct ConsoleOutput {
    json_format: bool,
}

impl ConsoleOutput {
    /// Create a console output with text format.
    pub fn new() -> Self {
        Self { json_format: false }
    }

    /// Create a console output with JSON format.
    pub fn new_json() -> Self {
        Self { json_format: true }
    }
}

impl LogOutput for ConsoleOutput {
    fn write(&self, entry: &LogEntry) -> Result<()> {
        let formatted = if self.json_format {
            entry.format_json()
        } else {
            entry.format()
        };

        eprintln!("{}", formatted);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        use std::io::Write;
        std::io::stderr().flush()?;
        Ok(())
    }
}

/// Appends entries to a file, opening it per write.
#[derive(Debug)]
pub struct FileOutput {
    path: std::path::PathBuf,
    json_format: bool,
}

impl FileOutput {
    /// Create a file output with text format.
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            json_format: false,
        }
    }

    /// Create a file output with JSON format.
    pub fn new_json<P: AsRef<std::path::Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            json_format: true,
        }
    }
}

impl LogOutput for FileOutput {
    fn write(&self, entry: &LogEntry) -> Result<()> {
        use std::io::Write;

        let formatted = if self.json_format {
            entry.format_json()
        } else {
            entry.format()
        };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(file, "{}", formatted)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        // Each write opens and closes the file.
        Ok(())
    }
}

/// Keeps entries in memory.
///
/// Clones share the same buffer, so a handle can be kept while another is
/// handed to a [`Logger`].
#[derive(Debug, Clone, Default)]
pub struct MemoryOutput {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemoryOutput {
    /// Create an empty in-memory output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far.
    pub fn entries(&self) -> Result<Vec<LogEntry>> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .map_err(|_| OutstandingOpsError::LockPoisoned)
    }

    /// Whether any entry's message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries()
            .map(|entries| entries.iter().any(|e| e.message.contains(needle)))
            .unwrap_or(false)
    }
}

impl LogOutput for MemoryOutput {
    fn write(&self, entry: &LogEntry) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| OutstandingOpsError::LockPoisoned)?
            .push(entry.clone());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Fan-out logger owned by a counter.
pub struct Logger {
    min_level: LogLevel,
    outputs: Vec<Box<dyn LogOutput>>,
}

impl Logger {
    /// Create a logger with no outputs.
    pub fn silent() -> Self {
        Self {
            min_level: LogLevel::Info,
            outputs: Vec::new(),
        }
    }

    /// Build a logger from configuration.
    ///
    /// Returns `None` when logging is disabled. Console output is always
    /// attached; a configured log file adds a [`FileOutput`].
    pub fn from_config(config: &LoggingConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }

        let mut logger = Self::silent();
        logger.set_level(config.level);

        if config.json_format {
            logger.add_output(Box::new(ConsoleOutput::new_json()));
        } else {
            logger.add_output(Box::new(ConsoleOutput::new()));
        }

        if let Some(path) = &config.log_file {
            if config.json_format {
                logger.add_output(Box::new(FileOutput::new_json(path)));
            } else {
                logger.add_output(Box::new(FileOutput::new(path)));
            }
        }

        Some(logger)
    }

    /// Set the minimum log level.
    pub fn set_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    /// Minimum level that will be written.
    pub fn level(&self) -> LogLevel {
        self.min_level
    }

    /// Add an output destination.
    pub fn add_output(&mut self, output: Box<dyn LogOutput>) {
        self.outputs.push(output);
    }

    /// Whether an entry at `level` would be written.
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level && !self.outputs.is_empty()
    }

    /// Log a message at the specified level.
    pub fn log(&self, level: LogLevel, component: &str, message: &str) {
        if self.enabled(level) {
            self.write_entry(&LogEntry::new(level, component, message));
        }
    }

    /// Log a counter event with its name and observed count.
    pub fn log_event(
        &self,
        level: LogLevel,
        counter: Option<&str>,
        outstanding: u64,
        message: &str,
    ) {
        if !self.enabled(level) {
            return;
        }

        let mut entry = LogEntry::new(level, "counter", message).with_outstanding(outstanding);
        if let Some(name) = counter {
            entry = entry.with_counter(name);
        }
        self.write_entry(&entry);
    }

    /// Write a prepared entry to every output.
    ///
    /// Output failures are reported on stderr and never reach the caller.
    pub fn write_entry(&self, entry: &LogEntry) {
        for output in &self.outputs {
            if let Err(e) = output.write(entry) {
                eprintln!("Failed to write log entry: {}", e);
            }
        }
    }

    /// Flush all outputs.
    pub fn flush(&self) {
        for output in &self.outputs {
            if let Err(e) = output.flush() {
                eprintln!("Failed to flush log output: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.min_level)
            .field("outputs", &self.outputs.len())
            .finish()
    }
}
