// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! atwf-adapters: the subprocess boundary.
//!
//! Two narrow contracts connect the orchestrator to the outside world:
//! [`Mux`] (terminal-multiplexer introspection and key injection) and
//! [`WorkerCtl`] (the worker lifecycle tool). Both carry fake
//! implementations behind the `test-support` feature so the engine can be
//! exercised without tmux on the box.

pub mod ctl;
pub mod session;
pub mod subprocess;

pub use ctl::{CtlError, CtlRouter, ProcessCtl, WorkerCtl};
pub use session::{Mux, SessionError, TmuxMux};

#[cfg(any(test, feature = "test-support"))]
pub use ctl::FakeCtl;
#[cfg(any(test, feature = "test-support"))]
pub use session::FakeMux;
