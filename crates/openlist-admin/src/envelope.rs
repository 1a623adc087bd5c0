//! The `{code, message, data}` envelope and the handler that unwraps it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AdminError, Result};
use crate::notify::{Notification, Notifier};

/// Success code used by OpenList backends.
pub const DEFAULT_SUCCESS_CODE: i64 = 200;

/// Uniform wrapper around every backend response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,

    #[serde(default)]
    pub message: String,

    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: DEFAULT_SUCCESS_CODE,
            message: "success".to_owned(),
            data: Some(data),
        }
    }

    pub fn empty() -> Self {
        Self {
            code: DEFAULT_SUCCESS_CODE,
            message: "success".to_owned(),
            data: None,
        }
    }

    pub fn failure(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// Unwraps envelopes and reports failures to the user.
///
/// Owns the success-code contract: callers never compare codes themselves.
#[derive(Clone)]
pub struct ResponseHandler {
    notifier: Arc<dyn Notifier>,
    success_code: i64,
}

impl ResponseHandler {
    pub fn new(notifier: Arc<dyn Notifier>, success_code: i64) -> Self {
        Self {
            notifier,
            success_code,
        }
    }

    /// The sink failures are reported to.
    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Hand `data` to `on_success`, or notify and return the failure.
    ///
    /// Transport errors and non-success envelopes both produce exactly one
    /// error notification carrying the transport or backend message.
    pub fn handle<T, R>(
        &self,
        response: Result<Envelope<T>>,
        on_success: impl FnOnce(Option<T>) -> R,
    ) -> Result<R> {
        match response {
            Ok(env) if env.code == self.success_code => Ok(on_success(env.data)),
            Ok(env) => {
                tracing::warn!(code = env.code, message = %env.message, "backend reported failure");
                self.notifier.notify(Notification::error(env.message.clone()));
                Err(AdminError::Backend {
                    code: env.code,
                    message: env.message,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "request failed");
                self.notifier.notify(Notification::error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Report an error that did not come out of an envelope.
    pub fn report(&self, error: &AdminError) {
        self.notifier.notify(Notification::error(error.to_string()));
    }
}

impl std::fmt::Debug for ResponseHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseHandler")
            .field("success_code", &self.success_code)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
