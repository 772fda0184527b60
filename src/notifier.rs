//! Notification sinks for upstream purchase failures
//!
//! The parser raises at most one alert per run (see
//! [`ResponseExtractor`](crate::response::ResponseExtractor)). Delivery is best-effort:
//! a sink has no way to fail the query that triggered it.

use std::sync::{Arc, Mutex};
use tracing::error;

pub trait Notifier: Send {
    fn notify(&self, message: &str);
}

/// Default sink, reports the alert through the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        error!(alert = message, "Purchase job reported an error");
    }
}

impl<F> Notifier for F
where
    F: Fn(&str) + Send,
{
    fn notify(&self, message: &str) {
        self(message)
    }
}

/// Keeps every message in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemoryNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(messages) => messages.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, message: &str) {
        match self.messages.lock() {
            Ok(mut messages) => messages.push(message.to_string()),
            Err(poisoned) => poisoned.into_inner().push(message.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_notifier_shares_buffer() {
        let notifier = MemoryNotifier::new();
        let handle = notifier.clone();
        notifier.notify("Insufficient funds");
        assert_eq!(handle.messages(), vec!["Insufficient funds".to_string()]);
    }

    #[test]
    fn test_closure_notifier() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |message: &str| seen.lock().unwrap().push(message.to_string())
        };
        sink.notify("Invalid key");
        assert_eq!(seen.lock().unwrap().as_slice(), ["Invalid key".to_string()]);
    }
}
