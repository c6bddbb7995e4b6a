// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests: a seeded team on a tempdir plus fake
//! adapters and a controllable clock.

use crate::ops::Engine;
use crate::watch::{WatchConfig, Watcher};
use atwf_adapters::{FakeCtl, FakeMux};
use atwf_core::time::parse_iso;
use atwf_core::{Clock, Config, FakeClock, Registry, Settings, TeamPolicy};
use atwf_storage::registry::{ensure_member, save_unlocked, MemberSpec};
use atwf_storage::TeamDir;
use serde_json::json;

pub const COORD: &str = "coord-20260301-110000-1";
pub const ADMIN: &str = "admin-b-20260301-110100-2";
pub const DEV_C: &str = "dev-c-20260301-110200-3";
pub const DEV_D: &str = "dev-d-20260301-110300-4";

pub const T0: &str = "2026-03-01T12:00:00";

pub struct Fixture {
    /// Keeps the tempdir alive for the fixture's lifetime.
    #[allow(dead_code)]
    dir: tempfile::TempDir,
    pub team: TeamDir,
    pub policy: TeamPolicy,
    pub settings: Settings,
    pub mux: FakeMux,
    pub ctl: FakeCtl,
    pub clock: FakeClock,
}

impl Fixture {
    /// Team dir + default policy/settings, no members yet.
    pub fn empty() -> Self {
        Self::with_config(json!({}))
    }

    pub fn with_config(config: serde_json::Value) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let team = TeamDir::new(dir.path().join("share"));
        team.ensure_layout().expect("layout");
        let cfg = Config::from_value(config);
        let policy = TeamPolicy::from_config(&cfg).expect("policy");
        let settings = Settings::load(&cfg, &policy);
        Self {
            dir,
            team,
            policy,
            settings,
            mux: FakeMux::new(),
            ctl: FakeCtl::new(),
            clock: FakeClock::at(T0),
        }
    }

    /// The standard four-member org chart:
    /// coord -> admin-b -> {dev-c, dev-d}. All sessions alive.
    pub fn seeded() -> Self {
        let fixture = Self::empty();
        fixture.seed_members();
        fixture
    }

    pub fn seed_members(&self) {
        let now = parse_iso(T0).expect("t0");
        let mut reg = Registry::default();
        for (full, base, role, parent) in [
            (COORD, "coord", "coord", None),
            (ADMIN, "admin-b", "admin", Some(COORD)),
            (DEV_C, "dev-c", "dev", Some(ADMIN)),
            (DEV_D, "dev-d", "dev", Some(ADMIN)),
        ] {
            ensure_member(
                &mut reg,
                full,
                MemberSpec {
                    base: Some(base),
                    role: Some(role),
                    parent,
                    ..MemberSpec::default()
                },
                now,
            );
        }
        {
            let _lock = self.team.lock_team().expect("lock");
            save_unlocked(&self.team, &mut reg, now).expect("save registry");
        }
        for full in [COORD, ADMIN, DEV_C, DEV_D] {
            self.mux.add_session(full);
        }
    }

    /// Add one extra member (with a live session) to the seeded registry.
    pub fn add_member(&self, full: &str, base: &str, role: &str, parent: Option<&str>) {
        let now = self.clock.now();
        let mut reg = atwf_storage::registry::load(&self.team, now).expect("load registry");
        ensure_member(
            &mut reg,
            full,
            MemberSpec {
                base: Some(base),
                role: Some(role),
                parent,
                ..MemberSpec::default()
            },
            now,
        );
        if let Some(parent) = parent {
            atwf_storage::registry::add_child(&mut reg, parent, full, now);
        }
        {
            let _lock = self.team.lock_team().expect("lock");
            save_unlocked(&self.team, &mut reg, now).expect("save registry");
        }
        self.mux.add_session(full);
    }

    pub fn engine(&self) -> Engine<FakeMux, FakeCtl, FakeClock> {
        Engine::new(
            self.team.clone(),
            self.policy.clone(),
            self.settings.clone(),
            self.mux.clone(),
            self.ctl.clone(),
            self.clock.clone(),
        )
    }

    pub fn watcher(&self) -> Watcher<FakeMux, FakeCtl, FakeClock> {
        self.watcher_with(WatchConfig::default())
    }

    pub fn watcher_with(&self, cfg: WatchConfig) -> Watcher<FakeMux, FakeCtl, FakeClock> {
        Watcher::new(
            self.team.clone(),
            self.policy.clone(),
            self.settings.clone(),
            self.team.config_path(),
            cfg,
            self.mux.clone(),
            self.ctl.clone(),
            self.clock.clone(),
        )
    }
}
