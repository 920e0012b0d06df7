//! Log forwarding to the inspector.
//!
//! A [`Logger`] does two things with every call: it writes the arguments to
//! a local [`LogSink`] (the device's own console), and it pushes a
//! `new-log` record to the inspector.
//!
//! | Entry point | Forwarded when |
//! |-------------|----------------|
//! | [`Logger::debug`] / `info` / `warn` / `error` | always |
//! | [`Logger::console`] (intercepted console calls) | the matching [`ConsoleHooks`] switch is on |
//! | [`Logger::report_error`] (uncaught errors) | [`ConsoleHooks::global_errors`] is on |
//!
//! With no active connection the record is dropped and
//! `"No active connection"` is written to the sink.

// ============================================================================
// Imports
// ============================================================================

use std::error::Error as StdError;
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::protocol::{LogLevel, LogRecord, Message, timestamp_now};

use super::Outbox;

// ============================================================================
// LogSink
// ============================================================================

/// Local output for log lines.
pub trait LogSink: Send + Sync {
    /// Writes one line.
    fn write(&self, level: LogLevel, line: &str);
}

/// Sink writing through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, level: LogLevel, line: &str) {
        match level {
            LogLevel::Debug => debug!(target: "kaiware::console", "{line}"),
            LogLevel::Info => info!(target: "kaiware::console", "{line}"),
            LogLevel::Warn => warn!(target: "kaiware::console", "{line}"),
            LogLevel::Error => error!(target: "kaiware::console", "{line}"),
        }
    }
}

// ============================================================================
// ConsoleHooks
// ============================================================================

/// Which intercepted console channels are forwarded.
///
/// All off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsoleHooks {
    /// Forward `console.log` as `info`.
    pub log: bool,
    /// Forward `console.warn`.
    pub warn: bool,
    /// Forward `console.error`.
    pub error: bool,
    /// Forward uncaught errors.
    pub global_errors: bool,
}

impl ConsoleHooks {
    /// Every switch on.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            log: true,
            warn: true,
            error: true,
            global_errors: true,
        }
    }
}

/// Intercepted console channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleMethod {
    /// `console.log`
    Log,
    /// `console.warn`
    Warn,
    /// `console.error`
    Error,
}

impl ConsoleMethod {
    /// Level a forwarded call is recorded at.
    #[must_use]
    pub const fn level(self) -> LogLevel {
        match self {
            Self::Log => LogLevel::Info,
            Self::Warn => LogLevel::Warn,
            Self::Error => LogLevel::Error,
        }
    }
}

// ============================================================================
// LogArg
// ============================================================================

/// One logged argument.
#[derive(Debug, Clone, PartialEq)]
pub enum LogArg {
    /// Sent verbatim.
    Text(String),
    /// Sent as `{"message", "name"}` JSON.
    Error {
        /// Error type name.
        name: String,
        /// Error message.
        message: String,
    },
    /// Sent as JSON.
    Value(Value),
}

impl LogArg {
    /// Captures an error value, named after its type.
    pub fn error<E: StdError>(err: &E) -> Self {
        let full = std::any::type_name::<E>();
        // Path of the type itself, without generic arguments.
        let base = full.split('<').next().unwrap_or(full);
        let name = base.rsplit("::").next().filter(|s| !s.is_empty()).unwrap_or("Error");
        Self::Error {
            name: name.to_string(),
            message: err.to_string(),
        }
    }

    /// Renders the argument for the wire.
    #[must_use]
    pub fn stringify(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Error { name, message } => json!({ "message": message, "name": name }).to_string(),
            Self::Value(value) => value.to_string(),
        }
    }
}

impl From<&str> for LogArg {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for LogArg {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Value> for LogArg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

// ============================================================================
// Logger
// ============================================================================

/// Forwards log calls to the inspector.
///
/// Cheap to clone; clones share the sink and outbox.
#[derive(Clone)]
pub struct Logger {
    source: String,
    hooks: ConsoleHooks,
    sink: Arc<dyn LogSink>,
    outbox: Arc<dyn Outbox>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("source", &self.source)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

impl Logger {
    /// Creates a logger.
    pub fn new(
        source: impl Into<String>,
        hooks: ConsoleHooks,
        sink: Arc<dyn LogSink>,
        outbox: Arc<dyn Outbox>,
    ) -> Self {
        Self {
            source: source.into(),
            hooks,
            sink,
            outbox,
        }
    }

    /// Returns the source id stamped on records.
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the hook switches.
    #[inline]
    #[must_use]
    pub fn hooks(&self) -> ConsoleHooks {
        self.hooks
    }

    /// Logs at debug level.
    pub fn debug<I, A>(&self, args: I)
    where
        I: IntoIterator<Item = A>,
        A: Into<LogArg>,
    {
        self.forward(LogLevel::Debug, collect(args));
    }

    /// Logs at info level.
    pub fn info<I, A>(&self, args: I)
    where
        I: IntoIterator<Item = A>,
        A: Into<LogArg>,
    {
        self.forward(LogLevel::Info, collect(args));
    }

    /// Logs at warn level.
    pub fn warn<I, A>(&self, args: I)
    where
        I: IntoIterator<Item = A>,
        A: Into<LogArg>,
    {
        self.forward(LogLevel::Warn, collect(args));
    }

    /// Logs at error level.
    pub fn error<I, A>(&self, args: I)
    where
        I: IntoIterator<Item = A>,
        A: Into<LogArg>,
    {
        self.forward(LogLevel::Error, collect(args));
    }

    /// Handles an intercepted console call.
    ///
    /// Always echoed to the sink; forwarded only when its hook is on.
    pub fn console<I, A>(&self, method: ConsoleMethod, args: I)
    where
        I: IntoIterator<Item = A>,
        A: Into<LogArg>,
    {
        let enabled = match method {
            ConsoleMethod::Log => self.hooks.log,
            ConsoleMethod::Warn => self.hooks.warn,
            ConsoleMethod::Error => self.hooks.error,
        };
        let args = collect(args);

        if enabled {
            self.forward(method.level(), args);
        } else {
            self.echo(method.level(), &args);
        }
    }

    /// Handles an uncaught error.
    pub fn report_error<E: StdError>(&self, err: &E) {
        let args = vec![LogArg::error(err)];
        if self.hooks.global_errors {
            self.forward(LogLevel::Error, args);
        } else {
            self.echo(LogLevel::Error, &args);
        }
    }

    fn forward(&self, level: LogLevel, args: Vec<LogArg>) {
        self.echo(level, &args);

        let record = LogRecord {
            source: self.source.clone(),
            level,
            data: args.iter().map(LogArg::stringify).collect(),
            timestamp: timestamp_now(),
        };

        match self.outbox.push(Message::NewLog(record)) {
            Ok(()) => {}
            Err(Error::NoActiveConnection) => {
                self.sink.write(LogLevel::Error, "No active connection");
            }
            Err(e) => warn!(error = %e, "Failed to forward log record"),
        }
    }

    fn echo(&self, level: LogLevel, args: &[LogArg]) {
        let line = args
            .iter()
            .map(LogArg::stringify)
            .collect::<Vec<_>>()
            .join(" ");
        self.sink.write(level, &line);
    }
}

fn collect<I, A>(args: I) -> Vec<LogArg>
where
    I: IntoIterator<Item = A>,
    A: Into<LogArg>,
{
    args.into_iter().map(Into::into).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::tests::RecordingOutbox;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct MemorySink {
        lines: Mutex<Vec<(LogLevel, String)>>,
    }

    impl LogSink for MemorySink {
        fn write(&self, level: LogLevel, line: &str) {
            self.lines.lock().push((level, line.to_string()));
        }
    }

    fn logger(hooks: ConsoleHooks, outbox: Arc<RecordingOutbox>) -> (Logger, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        (Logger::new("my-app", hooks, sink.clone(), outbox), sink)
    }

    fn records(outbox: &RecordingOutbox) -> Vec<LogRecord> {
        outbox
            .pushed
            .lock()
            .iter()
            .filter_map(|m| match m {
                Message::NewLog(record) => Some(record.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_explicit_api_always_forwards() {
        let outbox = RecordingOutbox::connected();
        let (logger, sink) = logger(ConsoleHooks::default(), outbox.clone());

        logger.warn(["disk", "low"]);

        let records = records(&outbox);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, "my-app");
        assert_eq!(records[0].level, LogLevel::Warn);
        assert_eq!(records[0].data, vec!["disk", "low"]);
        assert_eq!(sink.lines.lock()[0], (LogLevel::Warn, "disk low".to_string()));
    }

    #[test]
    fn test_console_respects_hooks() {
        let outbox = RecordingOutbox::connected();
        let hooks = ConsoleHooks {
            warn: true,
            ..ConsoleHooks::default()
        };
        let (logger, sink) = logger(hooks, outbox.clone());

        logger.console(ConsoleMethod::Log, ["quiet"]);
        logger.console(ConsoleMethod::Warn, ["loud"]);

        let records = records(&outbox);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data, vec!["loud"]);
        // Both calls still reach the local console.
        assert_eq!(sink.lines.lock().len(), 2);
    }

    #[test]
    fn test_console_log_records_info() {
        let outbox = RecordingOutbox::connected();
        let (logger, _) = logger(ConsoleHooks::all(), outbox.clone());

        logger.console(ConsoleMethod::Log, ["hello"]);

        assert_eq!(records(&outbox)[0].level, LogLevel::Info);
    }

    #[test]
    fn test_stringify_rules() {
        let outbox = RecordingOutbox::connected();
        let (logger, _) = logger(ConsoleHooks::default(), outbox.clone());

        logger.info([
            LogArg::from("plain"),
            LogArg::from(serde_json::json!({"a": 1})),
            LogArg::from(serde_json::json!(3)),
            LogArg::Error {
                name: "TypeError".into(),
                message: "x is undefined".into(),
            },
        ]);

        let data = &records(&outbox)[0].data;
        assert_eq!(data[0], "plain");
        assert_eq!(data[1], r#"{"a":1}"#);
        assert_eq!(data[2], "3");
        assert_eq!(data[3], r#"{"message":"x is undefined","name":"TypeError"}"#);
    }

    #[test]
    fn test_error_name_ignores_generic_arguments() {
        #[derive(Debug)]
        struct Wrapped<T>(T);

        impl<T: std::fmt::Debug> std::fmt::Display for Wrapped<T> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "wrapped {:?}", self.0)
            }
        }

        impl<T: std::fmt::Debug> StdError for Wrapped<T> {}

        let arg = LogArg::error(&Wrapped(std::io::ErrorKind::NotFound));
        assert_eq!(
            arg,
            LogArg::Error {
                name: "Wrapped".into(),
                message: "wrapped NotFound".into(),
            }
        );

        let arg = LogArg::error(&std::io::Error::other("boom"));
        assert!(matches!(arg, LogArg::Error { ref name, .. } if name == "Error"));
    }

    #[test]
    fn test_report_error_gated() {
        let outbox = RecordingOutbox::connected();
        let (logger, _) = logger(ConsoleHooks::default(), outbox.clone());
        let err = std::io::Error::other("boom");

        logger.report_error(&err);
        assert!(records(&outbox).is_empty());

        let (logger, _) = logger_with_globals(outbox.clone());
        logger.report_error(&err);
        let records = records(&outbox);
        assert_eq!(records.len(), 1);
        assert!(records[0].data[0].contains(r#""message":"boom""#));
    }

    fn logger_with_globals(outbox: Arc<RecordingOutbox>) -> (Logger, Arc<MemorySink>) {
        let hooks = ConsoleHooks {
            global_errors: true,
            ..ConsoleHooks::default()
        };
        logger(hooks, outbox)
    }

    #[test]
    fn test_no_connection_reports_to_sink() {
        let outbox = Arc::new(RecordingOutbox::default());
        let (logger, sink) = logger(ConsoleHooks::default(), outbox.clone());

        logger.error(["lost"]);

        assert!(records(&outbox).is_empty());
        let lines = sink.lines.lock();
        assert_eq!(lines.last(), Some(&(LogLevel::Error, "No active connection".to_string())));
    }

    #[test]
    fn test_timestamp_is_rfc3339() {
        let outbox = RecordingOutbox::connected();
        let (logger, _) = logger(ConsoleHooks::default(), outbox.clone());

        logger.debug(["t"]);

        let ts = &records(&outbox)[0].timestamp;
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
    }
}
