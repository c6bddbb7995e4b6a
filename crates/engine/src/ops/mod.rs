// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The operations the CLI surface exposes.
//!
//! One [`Engine`] per invocation: it snapshots policy + settings at
//! construction and loads the registry fresh per operation, mirroring the
//! short-lived-command model. Anything that injects text into a worker
//! session goes through the `WorkerCtl` adapter.

mod gather;
mod handoff;
mod inbox_ops;
mod messaging;
mod state_ops;

pub use gather::RespondOutcome;
pub use handoff::HandoffOutcome;
pub use inbox_ops::InboxRow;
pub use messaging::{IntentKind, ReceiptRow, TargetSelection};
pub use state_ops::StateRow;

use atwf_adapters::{Mux, WorkerCtl};
use atwf_core::{Clock, Member, Registry, Settings, TeamError, TeamPolicy};
use atwf_storage::{registry, TeamDir};

/// Operation context for one CLI invocation.
pub struct Engine<M: Mux, W: WorkerCtl, C: Clock> {
    team: TeamDir,
    policy: TeamPolicy,
    settings: Settings,
    mux: M,
    ctl: W,
    clock: C,
}

impl<M: Mux, W: WorkerCtl, C: Clock> Engine<M, W, C> {
    pub fn new(
        team: TeamDir,
        policy: TeamPolicy,
        settings: Settings,
        mux: M,
        ctl: W,
        clock: C,
    ) -> Self {
        Self {
            team,
            policy,
            settings,
            mux,
            ctl,
            clock,
        }
    }

    pub fn team(&self) -> &TeamDir {
        &self.team
    }

    pub fn policy(&self) -> &TeamPolicy {
        &self.policy
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn mux(&self) -> &M {
        &self.mux
    }

    pub fn ctl(&self) -> &W {
        &self.ctl
    }

    pub(crate) fn now(&self) -> chrono::NaiveDateTime {
        self.clock.now()
    }

    pub fn load_registry(&self) -> Result<Registry, TeamError> {
        registry::load(&self.team, self.now())
    }

    /// The member this invocation acts as: `--as <name>` when given,
    /// otherwise the surrounding mux session.
    pub async fn resolve_actor<'r>(
        &self,
        reg: &'r Registry,
        as_target: Option<&str>,
    ) -> Result<&'r Member, TeamError> {
        if let Some(name) = as_target.map(str::trim).filter(|s| !s.is_empty()) {
            return registry::require_member(reg, name);
        }
        let session = self.mux.self_session().await.ok_or_else(|| {
            TeamError::InvalidInput(
                "not inside a worker session (pass --as <full|base|role-member>)".into(),
            )
        })?;
        registry::require_member(reg, &session)
    }

    /// Whether this process runs inside a registered worker's session.
    pub async fn inside_worker_session(&self, reg: &Registry) -> bool {
        match self.mux.self_session().await {
            Some(session) => reg.resolve(&session).is_some(),
            None => false,
        }
    }
}
