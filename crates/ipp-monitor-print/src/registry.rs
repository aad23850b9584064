// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Configured printer entries and the entity bindings that point at them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use ipp_monitor_core::config::PrinterEntryConfig;
use ipp_monitor_core::error::{MonitorError, Result};
use ipp_monitor_core::types::{ConnectionConfig, EntityId, EntryId};

use crate::client::PrinterClient;
use crate::coordinator::Coordinator;

/// One configured printer.
#[derive(Debug)]
pub struct PrinterEntry {
    pub id: EntryId,
    /// Queue name.
    pub title: String,
    pub connection: Arc<ConnectionConfig>,
    simulation_mode: AtomicBool,
    pub coordinator: Arc<Coordinator>,
}

impl PrinterEntry {
    pub fn new(
        id: EntryId,
        title: impl Into<String>,
        connection: ConnectionConfig,
        simulation_mode: bool,
        client: Arc<dyn PrinterClient>,
    ) -> Self {
        let connection = Arc::new(connection);
        let coordinator = Arc::new(Coordinator::new(id, Arc::clone(&connection), client));
        Self {
            id,
            title: title.into(),
            connection,
            simulation_mode: AtomicBool::new(simulation_mode),
            coordinator,
        }
    }

    pub fn from_config(config: &PrinterEntryConfig, client: Arc<dyn PrinterClient>) -> Self {
        Self::new(
            config.id,
            config.name.clone(),
            config.connection.clone(),
            config.simulation_mode,
            client,
        )
    }

    /// Current value of the simulation option.
    pub fn simulation_mode(&self) -> bool {
        self.simulation_mode.load(Ordering::Acquire)
    }

    pub fn set_simulation_mode(&self, enabled: bool) {
        self.simulation_mode.store(enabled, Ordering::Release);
    }
}

/// Looks up the printer entry behind an entity.
pub trait EntityResolver: Send + Sync {
    /// `EntityNotBound` when the entity is unknown or not tied to an entry.
    fn resolve(&self, entity_id: &EntityId) -> Result<Arc<PrinterEntry>>;
}

/// All configured entries plus the entity → entry bindings.
#[derive(Debug, Default)]
pub struct EntryRegistry {
    entries: RwLock<HashMap<EntryId, Arc<PrinterEntry>>>,
    bindings: RwLock<HashMap<EntityId, EntryId>>,
}

impl EntryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an entry.
    pub fn add_entry(&self, entry: Arc<PrinterEntry>) {
        info!(entry_id = %entry.id, title = %entry.title, "printer entry added");
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entry.id, entry);
    }

    pub fn entry(&self, id: EntryId) -> Option<Arc<PrinterEntry>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// All entries, ordered by title.
    pub fn entries(&self) -> Vec<Arc<PrinterEntry>> {
        let mut all: Vec<_> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.title.cmp(&b.title));
        all
    }

    /// Tie an entity to an entry.  Fails if the entry does not exist.
    pub fn bind_entity(&self, entity_id: EntityId, entry_id: EntryId) -> Result<()> {
        if self.entry(entry_id).is_none() {
            return Err(MonitorError::EntryNotFound(entry_id.to_string()));
        }
        debug!(%entity_id, %entry_id, "entity bound");
        self.bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity_id, entry_id);
        Ok(())
    }

    /// Entities bound to an entry, sorted.
    pub fn entities_of(&self, entry_id: EntryId) -> Vec<EntityId> {
        let mut ids: Vec<_> = self
            .bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, e)| **e == entry_id)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Remove an entry and every binding that points at it.
    pub fn remove_entry(&self, id: EntryId) -> Option<Arc<PrinterEntry>> {
        let removed = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        if removed.is_some() {
            self.bindings
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|_, entry| *entry != id);
            info!(entry_id = %id, "printer entry removed");
        }
        removed
    }

    pub fn simulation_mode(&self, id: EntryId) -> Result<bool> {
        self.entry(id)
            .map(|e| e.simulation_mode())
            .ok_or_else(|| MonitorError::EntryNotFound(id.to_string()))
    }

    pub fn set_simulation_mode(&self, id: EntryId, enabled: bool) -> Result<()> {
        let entry = self
            .entry(id)
            .ok_or_else(|| MonitorError::EntryNotFound(id.to_string()))?;
        entry.set_simulation_mode(enabled);
        info!(entry_id = %id, enabled, "simulation mode changed");
        Ok(())
    }
}

impl EntityResolver for EntryRegistry {
    fn resolve(&self, entity_id: &EntityId) -> Result<Arc<PrinterEntry>> {
        let entry_id = self
            .bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity_id)
            .copied()
            .ok_or_else(|| MonitorError::EntityNotBound(entity_id.to_string()))?;
        // A binding can outlive its entry only transiently during removal.
        self.entry(entry_id)
            .ok_or_else(|| MonitorError::EntityNotBound(entity_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedClient;

    fn entry(title: &str) -> Arc<PrinterEntry> {
        Arc::new(PrinterEntry::new(
            EntryId::new(),
            title,
            ConnectionConfig::new("cups.local").for_queue(title),
            false,
            Arc::new(ScriptedClient::new()),
        ))
    }

    #[test]
    fn resolve_bound_entity() {
        let registry = EntryRegistry::new();
        let office = entry("Office");
        registry.add_entry(Arc::clone(&office));
        registry
            .bind_entity("sensor.office_status".into(), office.id)
            .unwrap();

        let resolved = registry.resolve(&"sensor.office_status".into()).unwrap();
        assert_eq!(resolved.id, office.id);
        assert!(Arc::ptr_eq(&resolved.coordinator, &office.coordinator));
    }

    #[test]
    fn unknown_entity_is_not_bound() {
        let registry = EntryRegistry::new();
        registry.add_entry(entry("Office"));
        assert!(matches!(
            registry.resolve(&"sensor.nope".into()),
            Err(MonitorError::EntityNotBound(id)) if id == "sensor.nope"
        ));
    }

    #[test]
    fn binding_to_missing_entry_fails() {
        let registry = EntryRegistry::new();
        assert!(matches!(
            registry.bind_entity("E1".into(), EntryId::new()),
            Err(MonitorError::EntryNotFound(_))
        ));
    }

    #[test]
    fn remove_entry_drops_bindings() {
        let registry = EntryRegistry::new();
        let office = entry("Office");
        registry.add_entry(Arc::clone(&office));
        registry.bind_entity("E1".into(), office.id).unwrap();
        registry.bind_entity("E2".into(), office.id).unwrap();
        assert_eq!(registry.entities_of(office.id).len(), 2);

        assert!(registry.remove_entry(office.id).is_some());
        assert!(registry.resolve(&"E1".into()).is_err());
        assert!(registry.entities_of(office.id).is_empty());
        assert!(registry.remove_entry(office.id).is_none());
    }

    #[test]
    fn simulation_mode_round_trips() {
        let registry = EntryRegistry::new();
        let office = entry("Office");
        registry.add_entry(Arc::clone(&office));

        assert!(!registry.simulation_mode(office.id).unwrap());
        registry.set_simulation_mode(office.id, true).unwrap();
        assert!(registry.simulation_mode(office.id).unwrap());
        assert!(office.simulation_mode());
        assert!(registry.set_simulation_mode(EntryId::new(), true).is_err());
    }

    #[test]
    fn entries_are_sorted_by_title() {
        let registry = EntryRegistry::new();
        registry.add_entry(entry("Warehouse"));
        registry.add_entry(entry("Office"));
        let titles: Vec<_> = registry.entries().iter().map(|e| e.title.clone()).collect();
        assert_eq!(titles, ["Office", "Warehouse"]);
    }
}
