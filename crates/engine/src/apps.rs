// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! App CRUD and `POST /apps/merge` (§4.2.1): union several same-owner
//! Apps' backends/parameters into a survivor and rewrite any Job
//! referencing a merged-away app.

use jobctl_core::{merge_backends_and_parameters, App, AppBackend, AppId, Clock, Event, IdGen, UserId};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::notifier::{Action, Entity, Notification};
use crate::store::Engine;

/// `POST /apps/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppCreateSpec {
    pub name: String,
    pub backends: Vec<AppBackend>,
    pub parameters: Vec<String>,
}

/// `PUT /apps/{id}` writable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppPatch {
    pub name: Option<String>,
    pub backends: Option<Vec<AppBackend>>,
    pub parameters: Option<Vec<String>>,
}

pub fn create<C: Clock, G: IdGen>(
    engine: &Engine<C, G>,
    owner_id: &UserId,
    spec: AppCreateSpec,
) -> Result<App, EngineError> {
    if spec.backends.is_empty() {
        return Err(EngineError::Validation("an app must have at least one backend".into()));
    }

    let app = engine.commit(|state| {
        let dup = state
            .apps
            .values()
            .any(|a| a.owner_id == *owner_id && a.name == spec.name);
        if dup {
            return Err(EngineError::Conflict(format!(
                "app named {:?} already exists for this owner",
                spec.name
            )));
        }

        let app = App {
            id: AppId::new(engine.new_id("app")),
            owner_id: owner_id.clone(),
            name: spec.name,
            backends: spec.backends,
            parameters: spec.parameters,
        };

        Ok((app.clone(), vec![Event::AppCreated { app: app.clone() }]))
    })?;

    engine.notifier.publish(Notification {
        owner_id: owner_id.clone(),
        action: Action::BulkCreate,
        entity: Entity::App,
        ids: vec![app.id.as_str().to_string()],
    });

    Ok(app)
}

pub fn update<C: Clock, G: IdGen>(
    engine: &Engine<C, G>,
    owner_id: &UserId,
    id: &AppId,
    patch: AppPatch,
) -> Result<App, EngineError> {
    let app = engine.commit(|state| {
        let mut app = state
            .get_app(id.as_str())
            .filter(|a| a.owner_id == *owner_id)
            .cloned()
            .ok_or(EngineError::NotFound)?;

        if let Some(v) = patch.name {
            let dup = state
                .apps
                .values()
                .any(|a| a.id != app.id && a.owner_id == *owner_id && a.name == v);
            if dup {
                return Err(EngineError::Conflict(format!("app named {v:?} already exists for this owner")));
            }
            app.name = v;
        }
        if let Some(v) = patch.backends {
            if v.is_empty() {
                return Err(EngineError::Validation("an app must have at least one backend".into()));
            }
            app.backends = v;
        }
        if let Some(v) = patch.parameters {
            app.parameters = v;
        }

        Ok((app.clone(), vec![Event::AppReplaced { app: app.clone() }]))
    })?;

    engine.notifier.publish(Notification {
        owner_id: owner_id.clone(),
        action: Action::BulkUpdate,
        entity: Entity::App,
        ids: vec![app.id.as_str().to_string()],
    });

    Ok(app)
}

pub fn delete<C: Clock, G: IdGen>(engine: &Engine<C, G>, owner_id: &UserId, id: &AppId) -> Result<(), EngineError> {
    engine.commit(|state| {
        state
            .get_app(id.as_str())
            .filter(|a| a.owner_id == *owner_id)
            .ok_or(EngineError::NotFound)?;
        Ok(((), vec![Event::AppDeleted { id: id.clone() }]))
    })?;

    engine.notifier.publish(Notification {
        owner_id: owner_id.clone(),
        action: Action::BulkDelete,
        entity: Entity::App,
        ids: vec![id.as_str().to_string()],
    });

    Ok(())
}

/// `POST /apps/merge` (§4.2.1). `ids` must all belong to `owner_id` and
/// number at least two. The lexicographically-lowest id survives and is
/// replaced in place with the union of backends/parameters; the others
/// are removed and any Job whose `app_ref` pointed at one of them is
/// rewritten to point at the survivor.
pub fn merge<C: Clock, G: IdGen>(
    engine: &Engine<C, G>,
    owner_id: &UserId,
    ids: &[AppId],
) -> Result<App, EngineError> {
    if ids.len() < 2 {
        return Err(EngineError::Validation("merge requires at least two apps".into()));
    }

    let survivor = engine.commit(|state| {
        let mut apps = Vec::with_capacity(ids.len());
        for id in ids {
            let app = state
                .get_app(id.as_str())
                .filter(|a| a.owner_id == *owner_id)
                .cloned()
                .ok_or(EngineError::NotFound)?;
            apps.push(app);
        }

        let survivor_id = ids.iter().min().expect("checked non-empty above").clone();
        let removed_ids: Vec<AppId> = ids.iter().filter(|id| **id != survivor_id).cloned().collect();

        let (backends, parameters) = merge_backends_and_parameters(&apps);
        let survivor_name = apps
            .iter()
            .find(|a| a.id == survivor_id)
            .expect("survivor id drawn from ids")
            .name
            .clone();

        let surviving = App {
            id: survivor_id.clone(),
            owner_id: owner_id.clone(),
            name: survivor_name,
            backends,
            parameters,
        };

        let rewritten_jobs: Vec<jobctl_core::Job> = state
            .jobs
            .values()
            .filter(|job| removed_ids.contains(&job.app_ref))
            .cloned()
            .map(|mut job| {
                job.app_ref = survivor_id.clone();
                job
            })
            .collect();

        Ok((
            surviving.clone(),
            vec![Event::AppsMerged {
                surviving,
                removed_ids,
                rewritten_jobs,
            }],
        ))
    })?;

    engine.notifier.publish(Notification {
        owner_id: owner_id.clone(),
        action: Action::BulkUpdate,
        entity: Entity::App,
        ids: vec![survivor.id.as_str().to_string()],
    });

    Ok(survivor)
}
