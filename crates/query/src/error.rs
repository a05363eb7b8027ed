// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors from the `get`/`count` contract shared by every collection (§4.1).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("no matching row")]
    DoesNotExist,
    #[error("{0} matching rows, expected exactly one")]
    MultipleObjects(usize),
}
