// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Offset/limit pagination request, `limit` bounded by the caller against a
/// configured maximum page size before it ever reaches a query function.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Paginator {
    pub offset: usize,
    pub limit: usize,
}

impl Paginator {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self { offset: 0, limit: 100 }
    }
}

/// The generic `{count, results}` envelope every list endpoint returns (§4.1, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Size of the full filtered set, not just this page.
    pub count: usize,
    pub results: Vec<T>,
}

/// Apply a paginator to an already filtered-and-ordered vector.
pub fn paginate<T>(mut items: Vec<T>, paginator: Paginator) -> Page<T> {
    let count = items.len();
    let end = paginator.offset.saturating_add(paginator.limit).min(items.len());
    let start = paginator.offset.min(items.len());
    let results = if start < end {
        items.drain(start..end).collect()
    } else {
        Vec::new()
    };
    Page { count, results }
}

/// `get` returns exactly one entity or fails with `DoesNotExist`/`MultipleObjects` (§4.1).
pub fn get_one<T>(mut items: Vec<T>) -> Result<T, QueryError> {
    match items.len() {
        0 => Err(QueryError::DoesNotExist),
        1 => items.pop().ok_or(QueryError::DoesNotExist),
        n => Err(QueryError::MultipleObjects(n)),
    }
}
