// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Errors returned by credentials, the resolver and the ID token verifier.
//!
//! Every fallible operation in this crate returns a [CredentialsError]. Its
//! [kind](CredentialsError::kind) tells applications what went wrong:
//!
//! * [ErrorKind::Configuration]: a credential file or JSON object is missing
//!   required fields, names an unknown credential type, or the path does not
//!   point to a readable file.
//! * [ErrorKind::Exhausted]: no source in the Application Default Credentials
//!   chain produced credentials.
//! * [ErrorKind::Transport]: a call to a token, metadata or certificate
//!   endpoint failed.
//! * [ErrorKind::Validation]: an ID token failed verification. See
//!   [CredentialsError::validation_error] for the detailed reason.

use crate::build_errors::Error as BuildError;
use crate::credentials::idtoken::verifier::ValidationError;
use http::StatusCode;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub(crate) type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// The category of a [CredentialsError].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Invalid or incomplete credential configuration.
    Configuration,
    /// No credential source succeeded.
    Exhausted,
    /// A network or HTTP failure.
    Transport,
    /// A token failed verification.
    Validation,
}

/// Represents an error creating or using [Credentials](crate::credentials::Credentials).
#[derive(Clone, Debug)]
pub struct CredentialsError {
    kind: ErrorKind,

    /// Whether a new attempt may succeed.
    ///
    /// This crate never retries on its own. Applications and client
    /// libraries decide if, and when, to try again.
    is_transient: bool,

    /// The HTTP status, when the error was produced from an HTTP response.
    status: Option<StatusCode>,

    message: Option<String>,
    source: Option<Arc<dyn Error + Send + Sync + 'static>>,
}

impl CredentialsError {
    fn new(
        kind: ErrorKind,
        is_transient: bool,
        message: Option<String>,
        source: Option<BoxError>,
    ) -> Self {
        Self {
            kind,
            is_transient,
            status: None,
            message,
            source: source.map(Arc::from),
        }
    }

    /// Creates a transport error from a message.
    ///
    /// Useful in tests and in custom
    /// [CredentialsProvider](crate::credentials::CredentialsProvider)
    /// implementations.
    pub fn from_msg<T: Into<String>>(is_transient: bool, message: T) -> Self {
        Self::new(ErrorKind::Transport, is_transient, Some(message.into()), None)
    }

    /// Creates a transport error from another error.
    pub fn from_source<T: Into<BoxError>>(is_transient: bool, source: T) -> Self {
        Self::new(ErrorKind::Transport, is_transient, None, Some(source.into()))
    }

    pub(crate) fn configuration<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::Configuration, false, None, Some(source.into()))
    }

    pub(crate) fn configuration_msg<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::Configuration, false, Some(message.into()), None)
    }

    pub(crate) fn exhausted<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::Exhausted, false, Some(message.into()), None)
    }

    pub(crate) fn transport<M: Into<String>, T: Into<BoxError>>(
        is_transient: bool,
        message: M,
        source: T,
    ) -> Self {
        Self::new(
            ErrorKind::Transport,
            is_transient,
            Some(message.into()),
            Some(source.into()),
        )
    }

    pub(crate) fn from_status<T: Into<String>>(status: StatusCode, message: T) -> Self {
        let mut error = Self::from_msg(is_retryable(status), message);
        error.status = Some(status);
        error
    }

    pub(crate) fn validation(source: ValidationError) -> Self {
        Self::new(ErrorKind::Validation, false, None, Some(source.into()))
    }

    /// Prefixes the message with `context`, keeping the kind and source.
    pub(crate) fn with_context<T: Into<String>>(mut self, context: T) -> Self {
        let context = context.into();
        self.message = Some(match self.message.take() {
            Some(message) => format!("{context}: {message}"),
            None => context,
        });
        self
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns `true` if a future attempt may succeed.
    pub fn is_transient(&self) -> bool {
        self.is_transient
    }

    /// Returns `true` for invalid credential files or JSON objects.
    pub fn is_configuration(&self) -> bool {
        self.kind == ErrorKind::Configuration
    }

    /// Returns `true` when no credential source succeeded.
    pub fn is_exhausted(&self) -> bool {
        self.kind == ErrorKind::Exhausted
    }

    /// Returns `true` for network and HTTP failures.
    pub fn is_transport(&self) -> bool {
        self.kind == ErrorKind::Transport
    }

    /// Returns `true` if a token failed verification.
    pub fn is_validation(&self) -> bool {
        self.kind == ErrorKind::Validation
    }

    /// The HTTP status code that produced this error, if any.
    pub fn http_status(&self) -> Option<StatusCode> {
        self.status
    }

    /// The reason an ID token was rejected.
    pub fn validation_error(&self) -> Option<&ValidationError> {
        self.source
            .as_deref()
            .and_then(|e| e.downcast_ref::<ValidationError>())
    }

    /// The detailed configuration problem, if this error came from loading
    /// a credential file or JSON object.
    pub fn build_error(&self) -> Option<&BuildError> {
        self.source
            .as_deref()
            .and_then(|e| e.downcast_ref::<BuildError>())
    }
}

impl From<BuildError> for CredentialsError {
    fn from(value: BuildError) -> Self {
        Self::configuration(value)
    }
}

impl Error for CredentialsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn Error + 'static))
    }
}

impl Display for CredentialsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.message, &self.source) {
            (Some(message), Some(source)) => write!(f, "{message}: {source}"),
            (Some(message), None) => f.write_str(message),
            (None, Some(source)) => write!(f, "{source}"),
            (None, None) => write!(f, "{:?} error", self.kind),
        }
    }
}

pub(crate) fn is_retryable(c: StatusCode) -> bool {
    match c {
        // Internal server errors do not indicate that there is anything wrong
        // with our request, so a new attempt may succeed.
        StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::REQUEST_TIMEOUT
        | StatusCode::TOO_MANY_REQUESTS => true,
        _ => false,
    }
}

/// Converts a non-success HTTP response into an error.
///
/// Google APIs and OAuth2 endpoints report errors in the body. When the body
/// holds several error messages they are joined with newlines.
pub(crate) fn from_http_response(status: StatusCode, body: &[u8], context: &str) -> CredentialsError {
    let detail = collapse_error_messages(body)
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());
    let message = if detail.is_empty() {
        format!("{context}, status: {status}")
    } else {
        format!("{context}, status: {status}: {detail}")
    };
    CredentialsError::from_status(status, message)
}

fn collapse_error_messages(body: &[u8]) -> Option<String> {
    let value = serde_json::from_slice::<Value>(body).ok()?;
    match value.get("error")? {
        // OAuth2 endpoints: `{"error": "invalid_grant", "error_description": "..."}`
        Value::String(code) => match value.get("error_description").and_then(Value::as_str) {
            Some(description) => Some(format!("{code}: {description}")),
            None => Some(code.clone()),
        },
        // Google APIs: `{"error": {"message": "...", "errors": [{"message": "..."}]}}`
        Value::Object(error) => {
            let nested = error
                .get("errors")
                .and_then(Value::as_array)
                .map(|errors| {
                    errors
                        .iter()
                        .filter_map(|e| e.get("message").and_then(Value::as_str))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            if nested.len() > 1 {
                return Some(nested.join("\n"));
            }
            error
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| nested.first().copied())
                .map(str::to_string)
        }
        _ => None,
    }
}
