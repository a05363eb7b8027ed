// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Site CRUD and the backfill-report boundary a scheduler adapter calls
//! (§4.4.1).

use std::collections::BTreeMap;

use jobctl_core::{BackfillWindow, Clock, Event, IdGen, Site, SiteId, SiteStatus, UserId};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::notifier::{Action, Entity, Notification};
use crate::store::Engine;

/// `POST /sites/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteCreateSpec {
    pub hostname: String,
    pub path: String,
}

/// `PUT /sites/{id}` writable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SitePatch {
    pub hostname: Option<String>,
    pub path: Option<String>,
    pub status: Option<SiteStatus>,
}

pub fn create<C: Clock, G: IdGen>(
    engine: &Engine<C, G>,
    owner_id: &UserId,
    spec: SiteCreateSpec,
) -> Result<Site, EngineError> {
    let site = engine.commit(|state| {
        let dup = state.sites.values().any(|s| {
            s.owner_id == *owner_id && s.hostname == spec.hostname && s.path == spec.path
        });
        if dup {
            return Err(EngineError::Conflict(format!(
                "site {}:{} already exists for this owner",
                spec.hostname, spec.path
            )));
        }

        let site = Site {
            id: SiteId::new(engine.new_id("site")),
            owner_id: owner_id.clone(),
            hostname: spec.hostname,
            path: spec.path,
            status: SiteStatus::default(),
            last_refresh: engine.now(),
        };

        Ok((site.clone(), vec![Event::SiteCreated { site: site.clone() }]))
    })?;

    engine.notifier.publish(Notification {
        owner_id: owner_id.clone(),
        action: Action::BulkCreate,
        entity: Entity::Site,
        ids: vec![site.id.as_str().to_string()],
    });

    Ok(site)
}

pub fn update<C: Clock, G: IdGen>(
    engine: &Engine<C, G>,
    owner_id: &UserId,
    id: &SiteId,
    patch: SitePatch,
) -> Result<Site, EngineError> {
    let site = engine.commit(|state| {
        let mut site = state
            .get_site(id.as_str())
            .filter(|s| s.owner_id == *owner_id)
            .cloned()
            .ok_or(EngineError::NotFound)?;

        let next_hostname = patch.hostname.clone().unwrap_or_else(|| site.hostname.clone());
        let next_path = patch.path.clone().unwrap_or_else(|| site.path.clone());
        if (patch.hostname.is_some() || patch.path.is_some())
            && (next_hostname != site.hostname || next_path != site.path)
        {
            let dup = state.sites.values().any(|s| {
                s.id != site.id
                    && s.owner_id == *owner_id
                    && s.hostname == next_hostname
                    && s.path == next_path
            });
            if dup {
                return Err(EngineError::Conflict(format!(
                    "site {next_hostname}:{next_path} already exists for this owner"
                )));
            }
        }

        if let Some(v) = patch.hostname {
            site.hostname = v;
        }
        if let Some(v) = patch.path {
            site.path = v;
        }
        if let Some(v) = patch.status {
            site.status = v;
        }

        Ok((site.clone(), vec![Event::SiteReplaced { site: site.clone() }]))
    })?;

    engine.notifier.publish(Notification {
        owner_id: owner_id.clone(),
        action: Action::BulkUpdate,
        entity: Entity::Site,
        ids: vec![site.id.as_str().to_string()],
    });

    Ok(site)
}

pub fn delete<C: Clock, G: IdGen>(engine: &Engine<C, G>, owner_id: &UserId, id: &SiteId) -> Result<(), EngineError> {
    engine.commit(|state| {
        state
            .get_site(id.as_str())
            .filter(|s| s.owner_id == *owner_id)
            .ok_or(EngineError::NotFound)?;
        Ok(((), vec![Event::SiteDeleted { id: id.clone() }]))
    })?;

    engine.notifier.publish(Notification {
        owner_id: owner_id.clone(),
        action: Action::BulkDelete,
        entity: Entity::Site,
        ids: vec![id.as_str().to_string()],
    });

    Ok(())
}

/// The boundary a scheduler adapter calls after reducing a node-list report
/// to a per-queue cumulative-capacity curve (§4.4.1). Not a client-facing
/// route; no event fan-out beyond the standard Site update notification.
pub fn report_backfill<C: Clock, G: IdGen>(
    engine: &Engine<C, G>,
    owner_id: &UserId,
    id: &SiteId,
    queue_windows: BTreeMap<String, Vec<BackfillWindow>>,
) -> Result<Site, EngineError> {
    let site = engine.commit(|state| {
        let mut site = state
            .get_site(id.as_str())
            .filter(|s| s.owner_id == *owner_id)
            .cloned()
            .ok_or(EngineError::NotFound)?;

        site.apply_backfill_report(queue_windows, engine.now());

        Ok((site.clone(), vec![Event::SiteReplaced { site: site.clone() }]))
    })?;

    engine.notifier.publish(Notification {
        owner_id: owner_id.clone(),
        action: Action::BulkUpdate,
        entity: Entity::Site,
        ids: vec![site.id.as_str().to_string()],
    });

    Ok(site)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_engine;

    #[test]
    fn create_rejects_duplicate_owner_hostname_path() {
        let engine = test_engine();
        let owner = UserId::new("u1");
        create(
            &engine,
            &owner,
            SiteCreateSpec { hostname: "theta".into(), path: "/proj".into() },
        )
        .unwrap();

        let err = create(
            &engine,
            &owner,
            SiteCreateSpec { hostname: "theta".into(), path: "/proj".into() },
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[test]
    fn different_owners_may_share_hostname_and_path() {
        let engine = test_engine();
        create(
            &engine,
            &UserId::new("u1"),
            SiteCreateSpec { hostname: "theta".into(), path: "/proj".into() },
        )
        .unwrap();
        create(
            &engine,
            &UserId::new("u2"),
            SiteCreateSpec { hostname: "theta".into(), path: "/proj".into() },
        )
        .unwrap();
    }

    #[test]
    fn report_backfill_updates_status_and_last_refresh() {
        let engine = test_engine();
        let owner = UserId::new("u1");
        let site = create(
            &engine,
            &owner,
            SiteCreateSpec { hostname: "theta".into(), path: "/proj".into() },
        )
        .unwrap();

        let mut windows = BTreeMap::new();
        windows.insert("default".to_string(), vec![(10, 60), (4, 120)]);
        let updated = report_backfill(&engine, &owner, &site.id, windows.clone()).unwrap();
        assert_eq!(updated.status.backfill_windows, windows);
    }

    #[test]
    fn update_cross_owner_is_not_found() {
        let engine = test_engine();
        let site = create(
            &engine,
            &UserId::new("u1"),
            SiteCreateSpec { hostname: "theta".into(), path: "/proj".into() },
        )
        .unwrap();

        let err = update(
            &engine,
            &UserId::new("u2"),
            &site.id,
            SitePatch { hostname: Some("other".into()), ..Default::default() },
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::NotFound));
    }
}
