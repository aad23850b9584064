// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ipp-monitor app: service wiring, entity rendering and the HTTP API.  The
// `ipp-monitor` binary adds the CLI on top.

pub mod entities;
pub mod http;
pub mod services;

pub use services::app_services::AppServices;
