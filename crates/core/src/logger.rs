//! Human-readable progress sink
//!
//! The cache reports hits, misses, and bucket choices as plain strings
//! through a [`Logger`]. Sink failures never abort a cache operation.
//! Structured diagnostics additionally go through `tracing`.

use std::io::Write;

/// Single-argument sink for progress and diagnostic strings
pub trait Logger: Send + Sync {
    /// Deliver one message. Implementations must not panic on delivery
    /// failure; dropping the message is acceptable.
    fn log(&self, message: &str);
}

/// Writes each message to standard output, best effort
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutLogger;

impl Logger for StdoutLogger {
    fn log(&self, message: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{message}");
    }
}

/// Discards every message
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Capture(Mutex<Vec<String>>);

    impl Logger for Capture {
        fn log(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn custom_sinks_receive_messages() {
        let capture = Capture(Mutex::new(Vec::new()));
        capture.log("hello");
        capture.log("world");
        assert_eq!(*capture.0.lock().unwrap(), vec!["hello", "world"]);
    }

    #[test]
    fn null_logger_is_silent() {
        NullLogger.log("dropped");
    }
}
