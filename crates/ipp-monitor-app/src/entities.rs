// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Read-only entities rendered from a printer entry.
//
// Each entry exposes three: a status sensor, a last-print-job sensor and a
// simulation-mode binary sensor.  Their ids derive from the entry title.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};

use ipp_monitor_core::types::{EntityId, slugify};
use ipp_monitor_print::registry::PrinterEntry;

/// The entities every printer entry has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Status,
    LastPrintJob,
    SimulationMode,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [Self::Status, Self::LastPrintJob, Self::SimulationMode];

    fn domain(self) -> &'static str {
        match self {
            Self::Status | Self::LastPrintJob => "sensor",
            Self::SimulationMode => "binary_sensor",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::LastPrintJob => "last_print_job",
            Self::SimulationMode => "simulation_mode",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Status => "Status",
            Self::LastPrintJob => "Last Print Job",
            Self::SimulationMode => "Simulation Mode",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Self::Status => "mdi:printer",
            Self::LastPrintJob => "mdi:file-document-outline",
            Self::SimulationMode => "mdi:test-tube",
        }
    }

    /// `sensor.office_status` and friends.
    pub fn entity_id(self, title: &str) -> EntityId {
        EntityId::new(format!("{}.{}_{}", self.domain(), slugify(title), self.suffix()))
    }
}

/// Ids of all entities for `entry`.
pub fn entity_ids(entry: &PrinterEntry) -> Vec<EntityId> {
    EntityKind::ALL
        .iter()
        .map(|kind| kind.entity_id(&entry.title))
        .collect()
}

/// Rendered entity state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityState {
    pub entity_id: EntityId,
    pub name: String,
    pub state: String,
    pub attributes: Map<String, Value>,
    /// Whether the latest status poll succeeded.
    pub available: bool,
    pub icon: &'static str,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Render every entity of `entry` from its coordinator's current snapshot.
pub fn render(entry: &PrinterEntry) -> Vec<EntityState> {
    EntityKind::ALL
        .iter()
        .map(|kind| render_kind(entry, *kind))
        .collect()
}

/// Render one entity of `entry`.
pub fn render_kind(entry: &PrinterEntry, kind: EntityKind) -> EntityState {
    let (snapshot, health) = entry.coordinator.view();

    let mut attributes = Map::new();
    let state = match kind {
        EntityKind::Status => match &snapshot.status {
            Some(status) => {
                attributes.insert("message".into(), json!(status.message));
                attributes.insert("reasons".into(), json!(status.reasons));
                status.state.as_str().to_string()
            }
            None => "unknown".to_string(),
        },
        EntityKind::LastPrintJob => match &snapshot.last_job {
            Some(job) => {
                if let Ok(Value::Object(fields)) = serde_json::to_value(job) {
                    attributes = fields;
                }
                job.file_path.display().to_string()
            }
            None => "None".to_string(),
        },
        EntityKind::SimulationMode => {
            let on = entry.simulation_mode();
            (if on { "on" } else { "off" }).to_string()
        }
    };

    if kind == EntityKind::Status {
        attributes.insert(
            "configuration_url".into(),
            json!(entry.connection.configuration_url()),
        );
    }

    EntityState {
        entity_id: kind.entity_id(&entry.title),
        name: format!("{} {}", entry.title, kind.name()),
        state,
        attributes,
        available: health.last_update_success,
        icon: kind.icon(),
        last_updated: health.last_success_at,
    }
}
