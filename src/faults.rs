use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;
use tracing::error;

use crate::error::HummError;

pub const PANIC_CODE: &str = "E_PANIC";

/// One fault raised while handling a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    /// Stage or component where the fault happened
    pub location: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>, location: &str) -> Self {
        ErrorInfo {
            code: code.to_string(),
            message: message.into(),
            location: location.to_string(),
        }
    }

    pub fn from_error(err: &HummError, location: &str) -> Self {
        ErrorInfo::new(err.code(), err.to_string(), location)
    }

    pub fn from_panic(payload: &(dyn Any + Send), location: &str) -> Self {
        let message = if let Some(text) = payload.downcast_ref::<&str>() {
            text.to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "panic with a non-string payload".to_string()
        };
        ErrorInfo::new(PANIC_CODE, message, location)
    }

    /// `CODE: message (location)`
    pub fn summary(&self) -> String {
        format!("{}: {} ({})", self.code, self.message, self.location)
    }
}

/// Faults collected during one request
#[derive(Debug, Default)]
pub struct ErrorHandler {
    errors: Vec<ErrorInfo>,
}

impl ErrorHandler {
    pub fn new() -> Self {
        ErrorHandler::default()
    }

    pub fn record(&mut self, info: ErrorInfo) {
        error!(code = %info.code, location = %info.location, "{}", info.message);
        self.errors.push(info);
    }

    pub fn record_error(&mut self, err: &HummError, location: &str) {
        self.record(ErrorInfo::from_error(err, location));
    }

    /// Run `stage`, recording a panic instead of unwinding
    ///
    /// Returns `None` when the stage panicked.
    pub fn catch<R>(&mut self, location: &str, stage: impl FnOnce() -> R) -> Option<R> {
        match panic::catch_unwind(AssertUnwindSafe(stage)) {
            Ok(value) => Some(value),
            Err(payload) => {
                self.record(ErrorInfo::from_panic(payload.as_ref(), location));
                None
            }
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ErrorInfo] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ErrorInfo> {
        self.errors
    }
}
