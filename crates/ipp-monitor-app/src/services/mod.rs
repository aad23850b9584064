// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer: wires the print crate's coordinators, pollers and submitter
// together for the HTTP API and the CLI.

pub mod app_services;
pub mod data_dir;
pub mod upload;
