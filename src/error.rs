/*

Copyright 2020 The Johns Hopkins University Applied Physics Laboratory

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.

*/

/// Error module.
///
/// Every failure a cutout request can hit is described by one `BossError`:
/// an HTTP status, one of the `ErrorCode` values below, and a message for
/// the user. The same value is returned through `Result` in request code and
/// embedded in an error payload inside renderers, so there is only one thing
/// to convert into a response.
use crate::recorder::{self, ErrorRecorder};
use crate::response::CutoutResponse;
use serde::Serialize;
use thiserror::Error;


/// Status used for any code that isn't in the mapping table.
pub const DEFAULT_STATUS: u16 = 400;

/// Enumeration of error codes, grouped by category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    // Url validation
    InvalidUrl = 1000,
    InvalidCutoutArgs = 1001,
    TypeError = 1002,
    InvalidPostArgument = 1003,

    // Forbidden
    MissingRole = 2000,

    // Unauthorized
    MissingPermission = 3000,
    UnrecognizedPermission = 3001,

    // Database
    ResourceNotFound = 4000,
    GroupNotFound = 4001,
    UserNotFound = 4002,
    IntegrityError = 4003,

    // IO
    IoError = 5000,
    UnsupportedTransportFormat = 5001,
    SerializationError = 5002,
    DeserializationError = 5003,

    // Already exists
    GroupExists = 6001,
    ResourceExists = 6002,

    // Reserved for things that aren't implemented yet
    Future = 9000,
}

impl ErrorCode {
    /// Every code, in numeric order.
    pub const ALL: [ErrorCode; 18] = [
        ErrorCode::InvalidUrl,
        ErrorCode::InvalidCutoutArgs,
        ErrorCode::TypeError,
        ErrorCode::InvalidPostArgument,
        ErrorCode::MissingRole,
        ErrorCode::MissingPermission,
        ErrorCode::UnrecognizedPermission,
        ErrorCode::ResourceNotFound,
        ErrorCode::GroupNotFound,
        ErrorCode::UserNotFound,
        ErrorCode::IntegrityError,
        ErrorCode::IoError,
        ErrorCode::UnsupportedTransportFormat,
        ErrorCode::SerializationError,
        ErrorCode::DeserializationError,
        ErrorCode::GroupExists,
        ErrorCode::ResourceExists,
        ErrorCode::Future,
    ];

    /// The integer sent over the wire.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// The HTTP status this code maps to.
    pub fn status(self) -> u16 {
        match self {
            ErrorCode::InvalidUrl
            | ErrorCode::InvalidCutoutArgs
            | ErrorCode::TypeError
            | ErrorCode::InvalidPostArgument => 400,
            ErrorCode::MissingRole | ErrorCode::MissingPermission => 403,
            ErrorCode::UnrecognizedPermission
            | ErrorCode::ResourceNotFound
            | ErrorCode::GroupNotFound
            | ErrorCode::UserNotFound
            | ErrorCode::IntegrityError
            | ErrorCode::IoError
            | ErrorCode::UnsupportedTransportFormat
            | ErrorCode::SerializationError
            | ErrorCode::DeserializationError
            | ErrorCode::GroupExists
            | ErrorCode::ResourceExists
            | ErrorCode::Future => 404,
        }
    }

    /// Look up a code by its integer value.
    pub fn from_code(code: u32) -> Option<ErrorCode> {
        ErrorCode::ALL.iter().copied().find(|c| c.code() == code)
    }
}

/// Map a raw integer code to its HTTP status, defaulting to 400.
pub fn status_for_code(code: u32) -> u16 {
    match ErrorCode::from_code(code) {
        Some(known) => known.status(),
        None => DEFAULT_STATUS,
    }
}

/// An immutable `(status, code, message)` triple.
///
/// Serializes to exactly the JSON error body: `{status, code, message}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct BossError {
    status: u16,
    code: u32,
    message: String,
}

impl BossError {
    /// Create an error and record it with the process-wide recorder.
    ///
    /// # Arguments:
    ///
    /// * `message` - Feedback for the user
    /// * `code` - Identifies the kind of failure; also picks the HTTP status
    pub fn new(message: impl Into<String>, code: ErrorCode) -> BossError {
        BossError::with_code_recorded(message, code.code(), recorder::default_recorder())
    }

    /// Create an error from a raw integer code.  Codes outside of
    /// `ErrorCode` get a 400 status.
    pub fn with_code(message: impl Into<String>, code: u32) -> BossError {
        BossError::with_code_recorded(message, code, recorder::default_recorder())
    }

    /// Same as `new()`, but records with the given recorder.
    pub fn new_recorded(
        message: impl Into<String>,
        code: ErrorCode,
        recorder: &dyn ErrorRecorder,
    ) -> BossError {
        BossError::with_code_recorded(message, code.code(), recorder)
    }

    /// Every constructor ends up here, so every error is recorded exactly
    /// once.
    pub fn with_code_recorded(
        message: impl Into<String>,
        code: u32,
        recorder: &dyn ErrorRecorder,
    ) -> BossError {
        let error = BossError {
            status: status_for_code(code),
            code,
            message: message.into(),
        };
        recorder.record(error.status, error.code, &error.message);
        error
    }

    /// The object the user asked for doesn't exist.
    pub fn resource_not_found(name: &str) -> BossError {
        BossError::new(format!("{} does not exist.", name), ErrorCode::ResourceNotFound)
    }

    pub fn user_not_found(name: &str) -> BossError {
        BossError::new(
            format!("{} does not exist. Ensure that the user has logged in", name),
            ErrorCode::UserNotFound,
        )
    }

    pub fn group_not_found(name: &str) -> BossError {
        BossError::new(format!("{} does not exist.", name), ErrorCode::GroupNotFound)
    }

    /// The user lacks `permission` on `resource`.
    pub fn permission_denied(permission: &str, resource: &str) -> BossError {
        BossError::new(
            format!(
                "Missing {} permissions on the resource {}",
                permission, resource
            ),
            ErrorCode::MissingPermission,
        )
    }

    /// Bad arguments in a service URL.
    ///
    /// # Arguments:
    ///
    /// * `service` - Name of the service, e.g. `cutout`
    /// * `args` - The offending arguments, as the user sent them
    pub fn invalid_rest_args(service: &str, args: &str) -> BossError {
        BossError::new(
            format!("Invalid {} arguments in request {}.", service, args),
            ErrorCode::InvalidUrl,
        )
    }

    /// Wrap a failure from an upstream service, attaching its response body
    /// for context when there is one.
    pub fn from_upstream(
        message: &str,
        code: ErrorCode,
        upstream_body: Option<&str>,
    ) -> BossError {
        match upstream_body {
            Some(body) => BossError::new(format!("{}. Error Message: {}", message, body), code),
            None => BossError::new(message, code),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    /// The `ErrorCode` for this error, if its code is one we know.
    pub fn kind(&self) -> Option<ErrorCode> {
        ErrorCode::from_code(self.code)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The JSON error body, `{status, code, message}`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// The JSON error body as bytes, keys in `status, code, message` order.
    pub fn to_body(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Convert to a transport response.  This does not record anything;
    /// the error was already recorded when it was built.
    pub fn to_response(&self) -> CutoutResponse {
        CutoutResponse::from_error(self)
    }
}
