use std::sync::Arc;

use super::machine::{self, Transition};
use crate::alerts::AlertDispatcher;
use crate::database::Store;
use crate::database::models::{Check, Incident, Site};
use crate::error::Result;

/// What a check did to the site's incidents
#[derive(Debug, Clone, PartialEq)]
pub enum IncidentReport {
    Unchanged,
    Opened { incident: Incident, superseded: Option<Incident> },
    Resolved(Incident),
}

/// Applies incident transitions and requests the matching notifications.
///
/// Callers must serialize `handle` per site; the executor does so with its
/// site locks.
pub struct IncidentHandler {
    store: Arc<dyn Store>,
    dispatcher: Arc<AlertDispatcher>,
}

impl IncidentHandler {
    pub fn new(store: Arc<dyn Store>, dispatcher: Arc<AlertDispatcher>) -> Self {
        Self { store, dispatcher }
    }

    pub async fn handle(&self, site: &Site, check: &Check) -> Result<IncidentReport> {
        let active = self.store.active_incident(site.id).await?;

        match machine::plan(active.as_ref(), check) {
            Transition::Stay => Ok(IncidentReport::Unchanged),

            Transition::Open { kind, supersedes } => {
                // Superseded incidents close silently; only full recovery notifies
                let superseded = match supersedes {
                    Some(previous) => {
                        let closed = self.store.resolve_incident(previous.id, check.timestamp).await?;
                        tracing::info!(
                            "Closed {} incident {} for site {} (superseded by {})",
                            closed.kind,
                            closed.id,
                            site.id,
                            kind
                        );
                        Some(closed)
                    }
                    None => None,
                };

                let incident = machine::open_incident(kind, check);
                self.store.insert_incident(&incident).await?;
                tracing::warn!("Opened {} incident {} for site {}: {}", kind, incident.id, site.url, incident.description);

                if let Err(e) = self.dispatcher.notify_opened(site, &incident).await {
                    tracing::error!("Alert dispatch failed for incident {}: {}", incident.id, e);
                }

                Ok(IncidentReport::Opened { incident, superseded })
            }

            Transition::Resolve(open) => {
                let resolved = self.store.resolve_incident(open.id, check.timestamp).await?;
                tracing::info!(
                    "Resolved {} incident {} for site {} after {}s",
                    resolved.kind,
                    resolved.id,
                    site.url,
                    resolved.duration_seconds(check.timestamp)
                );

                if let Err(e) = self.dispatcher.notify_resolved(site, &resolved).await {
                    tracing::error!("Recovery dispatch failed for incident {}: {}", resolved.id, e);
                }

                Ok(IncidentReport::Resolved(resolved))
            }
        }
    }
}
