// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The transactional core's error type (§7, §7.1): one variant per client
//! error kind, plus one for the durability layer.

use jobctl_core::{ErrorKind, InvalidTransition};
use jobctl_query::QueryError;
use thiserror::Error;

/// Errors a `jobctl-engine` service method can return. Every variant maps
/// onto exactly one [`ErrorKind`] via [`EngineError::kind`] for serialization
/// into a `Response::Error` (§6.1).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("not found")]
    NotFound,
    #[error("validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not implemented: {0}")]
    NotImplemented(String),
    #[error("auth failure")]
    AuthFailure,
    #[error("storage error: {0}")]
    Storage(#[from] jobctl_storage::WalError),
}

impl EngineError {
    /// The §7 error kind this error maps to, for wire serialization.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NotFound => ErrorKind::NotFound,
            EngineError::Validation(_) => ErrorKind::ValidationError,
            EngineError::InvalidTransition(_) => ErrorKind::InvalidTransition,
            EngineError::Conflict(_) => ErrorKind::Conflict,
            EngineError::NotImplemented(_) => ErrorKind::NotImplemented,
            EngineError::AuthFailure => ErrorKind::AuthFailure,
            // No real database exists in this realization (§5.1, §7.1); a
            // local WAL append failure is closest in spirit to a rejected
            // write and is surfaced to the client as a validation failure
            // rather than invented a ninth wire kind.
            EngineError::Storage(_) => ErrorKind::ValidationError,
        }
    }
}

impl From<QueryError> for EngineError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::DoesNotExist => EngineError::NotFound,
            QueryError::MultipleObjects(n) => {
                EngineError::Validation(format!("{n} matching rows, expected exactly one"))
            }
        }
    }
}
