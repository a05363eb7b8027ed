// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jobctl-query: typed filter/ordering/pagination structs per collection
//! (§4.1, §4.1.1), translating them into scans over
//! [`jobctl_storage::MaterializedState`]. Every list/get/count function is
//! owner-scoped first, before any other predicate is applied (§8 invariant 3).

pub mod apps;
pub mod batch_jobs;
pub mod error;
pub mod events;
pub mod jobs;
pub mod order;
pub mod page;
pub mod sessions;
pub mod sites;
pub mod transfer_items;

pub use error::QueryError;
pub use page::{get_one, paginate, Page, Paginator};
