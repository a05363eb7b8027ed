// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! App / AppBackend entities (§3) and the pure merge computation behind
//! `POST /apps/merge` (§4.2.1, §6).

use serde::{Deserialize, Serialize};

use crate::ids::{AppId, SiteId};
use crate::owned::Owned;
use crate::UserId;

/// Value object embedded in [`App`]: binds an App to a Site with an
/// executor class name. `site_hostname`/`site_path` are denormalized,
/// read-only projections filled in by the repository layer at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppBackend {
    pub site_ref: SiteId,
    pub class_name: String,
    #[serde(default)]
    pub site_hostname: String,
    #[serde(default)]
    pub site_path: String,
}

/// An owner-scoped logical computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct App {
    pub id: AppId,
    pub owner_id: UserId,
    /// Unique per owner.
    pub name: String,
    /// At least one.
    pub backends: Vec<AppBackend>,
    /// Ordered list of parameter names.
    pub parameters: Vec<String>,
}

impl Owned for App {
    fn owner_id(&self) -> &UserId {
        &self.owner_id
    }
}

/// The union of several same-owner Apps' backends and parameters (§4.2.1):
/// backends concatenated then deduplicated by `(site_ref, class_name)`,
/// parameters deduplicated with order preserved by first appearance.
///
/// `apps` must be non-empty and share an owner; the caller (the bulk
/// mutation service) is responsible for checking that invariant and for
/// rewriting `Job::app_ref` on any job referencing a merged-away app.
pub fn merge_backends_and_parameters(apps: &[App]) -> (Vec<AppBackend>, Vec<String>) {
    let mut backends: Vec<AppBackend> = Vec::new();
    for app in apps {
        for backend in &app.backends {
            if !backends
                .iter()
                .any(|b| b.site_ref == backend.site_ref && b.class_name == backend.class_name)
            {
                backends.push(backend.clone());
            }
        }
    }

    let mut parameters: Vec<String> = Vec::new();
    for app in apps {
        for p in &app.parameters {
            if !parameters.contains(p) {
                parameters.push(p.clone());
            }
        }
    }

    (backends, parameters)
}
