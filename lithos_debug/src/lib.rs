// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Report sinks for lithos diagnostics.
//!
//! Both sinks implement
//! [`CompositorReport`](lithos_core::report::CompositorReport) and
//! [`InputReport`](lithos_core::report::InputReport):
//!
//! - [`pretty::PrettyPrintReport`]: one human-readable line per event.
//! - [`tracing_report::TracingReport`]: forwards events to `tracing`.

pub mod pretty;
pub mod tracing_report;
