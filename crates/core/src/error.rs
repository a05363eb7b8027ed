// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The client-facing error taxonomy shared by every crate that can reject a request.

use serde::{Deserialize, Serialize};

/// One of the error kinds a client-facing response can carry. Every crate-local
/// error type (`jobctl_engine::EngineError`, ...) maps its variants onto this
/// small, stable set so the wire protocol never leaks implementation detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Entity id absent or owned by a different user.
    NotFound,
    /// Malformed input, duplicate ids in a bulk patch, unknown field, violated constraint.
    ValidationError,
    /// State-machine rejection.
    InvalidTransition,
    /// Frozen-field write on a started BatchJob without `revert`; duplicate unique key.
    Conflict,
    /// Bulk delete of BatchJobs via filter, or any other unsupported bulk shape.
    NotImplemented,
    /// Missing or invalid credentials.
    AuthFailure,
}

impl ErrorKind {
    /// The HTTP status an external transport should map this kind to (§6/§7).
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::ValidationError => 400,
            ErrorKind::InvalidTransition => 400,
            ErrorKind::Conflict => 409,
            ErrorKind::NotImplemented => 501,
            ErrorKind::AuthFailure => 401,
        }
    }
}
