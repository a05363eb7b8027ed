// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state built from WAL replay (§5.1).
//!
//! `apply_event` is the single idempotent replay function used both for live
//! application (immediately after a mutation commits) and for WAL replay on
//! restart. Handlers assign rather than mutate-in-place so that replaying
//! the same event twice is always a no-op.

use std::collections::HashMap;

use jobctl_core::{App, BatchJob, Event, Job, LogEvent, Session, Site, TransferItem};
use serde::{Deserialize, Serialize};

/// Materialized state derived by replaying the event log.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub sites: HashMap<String, Site>,
    pub apps: HashMap<String, App>,
    pub batch_jobs: HashMap<String, BatchJob>,
    pub jobs: HashMap<String, Job>,
    pub transfer_items: HashMap<String, TransferItem>,
    pub sessions: HashMap<String, Session>,
    /// Keyed by LogEvent id so replaying an already-applied event is a no-op.
    pub log_events: HashMap<String, LogEvent>,
    /// Commit order of log event ids; ties broken by id ascending (§5).
    #[serde(default)]
    pub log_event_order: Vec<String>,
}

impl MaterializedState {
    pub fn get_job(&self, id: &str) -> Option<&Job> {
        self.jobs.get(id)
    }

    pub fn get_site(&self, id: &str) -> Option<&Site> {
        self.sites.get(id)
    }

    pub fn get_app(&self, id: &str) -> Option<&App> {
        self.apps.get(id)
    }

    pub fn get_batch_job(&self, id: &str) -> Option<&BatchJob> {
        self.batch_jobs.get(id)
    }

    pub fn get_session(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// LogEvents for a single job, in commit order.
    pub fn events_for_job(&self, job_id: &str) -> Vec<&LogEvent> {
        self.log_event_order
            .iter()
            .filter_map(|id| self.log_events.get(id))
            .filter(|e| e.job_ref.as_str() == job_id)
            .collect()
    }

    fn append_log_event(&mut self, event: LogEvent) {
        let id = event.id.as_str().to_string();
        if self.log_events.insert(id.clone(), event).is_none() {
            self.log_event_order.push(id);
        }
    }

    /// Apply an event to derive state changes. Must be idempotent: applying
    /// the same event twice produces the same state as applying it once.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::SiteCreated { site } | Event::SiteReplaced { site } => {
                self.sites.insert(site.id.as_str().to_string(), site.clone());
            }
            Event::SiteDeleted { id } => {
                self.sites.remove(id.as_str());
            }

            Event::AppCreated { app } | Event::AppReplaced { app } => {
                self.apps.insert(app.id.as_str().to_string(), app.clone());
            }
            Event::AppDeleted { id } => {
                self.apps.remove(id.as_str());
            }
            Event::AppsMerged {
                surviving,
                removed_ids,
                rewritten_jobs,
            } => {
                self.apps.insert(surviving.id.as_str().to_string(), surviving.clone());
                for id in removed_ids {
                    self.apps.remove(id.as_str());
                }
                for job in rewritten_jobs {
                    self.jobs.insert(job.id.as_str().to_string(), job.clone());
                }
            }

            Event::BatchJobCreated { batch_job } | Event::BatchJobReplaced { batch_job } => {
                self.batch_jobs
                    .insert(batch_job.id.as_str().to_string(), batch_job.clone());
            }
            Event::BatchJobDeleted { id } => {
                self.batch_jobs.remove(id.as_str());
            }

            Event::JobCreated {
                job,
                transfer_items,
                log_events,
            } => {
                self.jobs.insert(job.id.as_str().to_string(), job.clone());
                for item in transfer_items {
                    self.transfer_items
                        .insert(item.id.as_str().to_string(), item.clone());
                }
                for log_event in log_events {
                    self.append_log_event(log_event.clone());
                }
            }
            Event::JobsReplaced { jobs, log_events } => {
                for job in jobs {
                    self.jobs.insert(job.id.as_str().to_string(), job.clone());
                }
                for log_event in log_events {
                    self.append_log_event(log_event.clone());
                }
            }
            Event::JobsDeleted { ids } => {
                for id in ids {
                    self.jobs.remove(id.as_str());
                    self.transfer_items.retain(|_, item| item.job_ref != *id);
                    let removed_event_ids: Vec<String> = self
                        .log_events
                        .iter()
                        .filter(|(_, e)| e.job_ref == *id)
                        .map(|(k, _)| k.clone())
                        .collect();
                    for eid in removed_event_ids {
                        self.log_events.remove(&eid);
                    }
                    self.log_event_order.retain(|eid| self.log_events.contains_key(eid));
                }
            }

            Event::TransferItemReplaced { item } => {
                self.transfer_items
                    .insert(item.id.as_str().to_string(), item.clone());
            }
            Event::TransferItemsDeleted { ids } => {
                for id in ids {
                    self.transfer_items.remove(id.as_str());
                }
            }

            Event::SessionOpened { session } => {
                self.sessions
                    .insert(session.id.as_str().to_string(), session.clone());
            }
            Event::SessionTicked { id, heartbeat } => {
                if let Some(session) = self.sessions.get_mut(id.as_str()) {
                    session.heartbeat = *heartbeat;
                }
            }
            Event::SessionJobsAcquired { id, job_refs } => {
                if let Some(session) = self.sessions.get_mut(id.as_str()) {
                    session.acquired_job_refs.extend(job_refs.iter().cloned());
                }
            }
            Event::SessionClosed { id } => {
                self.sessions.remove(id.as_str());
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
