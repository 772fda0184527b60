//! Response line extraction
//!
//! Each purchase attempt logs the exchange's JSON reply on a single line. A reply is
//! only trusted when its `error` field is empty; a populated `error` poisons the whole
//! block it sits in.

use crate::error::{ParseError, Result};
use crate::models::{LogLine, ResponseRecord};
use crate::notifier::Notifier;
use serde_json::Value;
use tracing::{debug, warn};

pub struct ResponseExtractor {
    notifier: Box<dyn Notifier>,
    recognized_errors: Vec<String>,
    has_error: bool,
}

impl ResponseExtractor {
    pub fn new(notifier: Box<dyn Notifier>, recognized_errors: Vec<String>) -> Self {
        Self {
            notifier,
            recognized_errors,
            has_error: false,
        }
    }

    /// Decode a line without side effects. Anything that is not a JSON object with an
    /// `error` key is not a response line.
    pub fn decode(line: &str) -> Result<ResponseRecord> {
        let value: Value =
            serde_json::from_str(line).map_err(|_| ParseError::NotApplicable("response"))?;
        match value {
            Value::Object(object) => {
                ResponseRecord::from_object(object).ok_or(ParseError::NotApplicable("response"))
            }
            _ => Err(ParseError::NotApplicable("response")),
        }
    }

    /// Decode a line and gate on its `error` field.
    ///
    /// The first error seen by this extractor triggers the notifier when it matches a
    /// recognized category. Later errors are only logged.
    pub fn extract(&mut self, line: &LogLine) -> Result<ResponseRecord> {
        let record = Self::decode(&line.text)?;
        match record.error_message() {
            Some(message) => {
                warn!(line = line.index, error = %message, "Response reported an error");
                self.on_first_error(&message);
                Err(ParseError::Response { message })
            }
            None => Ok(record),
        }
    }

    /// Recognized category contained in `message`, if any
    pub fn categorize(&self, message: &str) -> Option<&str> {
        self.recognized_errors
            .iter()
            .find(|category| message.contains(category.as_str()))
            .map(String::as_str)
    }

    /// Whether any response error has been seen yet
    pub fn has_error(&self) -> bool {
        self.has_error
    }

    fn on_first_error(&mut self, message: &str) {
        if self.has_error {
            return;
        }
        self.has_error = true;

        match self.categorize(message) {
            Some(category) => self.notifier.notify(category),
            None => debug!(error = message, "Unrecognized response error, no alert sent"),
        }
    }
}
