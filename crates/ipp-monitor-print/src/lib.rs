// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ipp-monitor print: the IPP client, per-printer status coordinators with
// their pollers, the PDF job submitter and CUPS queue discovery.  Bridges the
// core domain types in `ipp-monitor-core` and the network.

pub mod cache;
pub mod client;
pub mod coordinator;
pub mod discovery;
pub mod health;
pub mod ipp_client;
pub mod poller;
pub mod registry;
pub mod submitter;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::StatusCache;
pub use client::PrinterClient;
pub use coordinator::{Coordinator, CoordinatorEvent};
pub use health::PollHealth;
pub use ipp_client::IppClient;
pub use poller::Poller;
pub use registry::{EntityResolver, EntryRegistry, PrinterEntry};
pub use submitter::JobSubmitter;
