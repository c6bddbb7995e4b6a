// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-invocation context: team dir, config, policy, settings, adapters.

use anyhow::Result;
use atwf_adapters::{CtlRouter, TmuxMux};
use atwf_core::{Config, Settings, SystemClock, TeamPolicy};
use atwf_engine::Engine;
use atwf_storage::TeamDir;
use std::path::PathBuf;

pub struct Context {
    pub team: TeamDir,
    pub config_path: PathBuf,
    pub policy: TeamPolicy,
    pub settings: Settings,
    pub mux: TmuxMux,
    pub ctl: CtlRouter,
}

impl Context {
    pub fn from_env() -> Result<Self> {
        let team = TeamDir::from_env();
        let config_path = team.config_path();
        let config = Config::load(&config_path);
        let policy = TeamPolicy::from_config(&config)?;
        let settings = Settings::load(&config, &policy);
        let ctl = CtlRouter::resolve(&config.get_str(&["team", "worker", "cmd"], ""));
        Ok(Self {
            team,
            config_path,
            policy,
            settings,
            mux: TmuxMux::new(),
            ctl,
        })
    }

    pub fn engine(&self) -> Engine<TmuxMux, CtlRouter, SystemClock> {
        Engine::new(
            self.team.clone(),
            self.policy.clone(),
            self.settings.clone(),
            self.mux.clone(),
            self.ctl.clone(),
            SystemClock,
        )
    }

    pub fn now(&self) -> chrono::NaiveDateTime {
        use atwf_core::Clock;
        SystemClock.now()
    }
}
