//! Test support utilities for latchkey integration tests.
//!
//! Every test gets its own in-memory vault, so tests run in parallel
//! without sharing remote state.

#![allow(dead_code)]

pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::*;

use latchkey::{Member, MemoryRemote, Provider};

/// A provider over a fresh in-memory vault.
pub struct Test {
    pub provider: Provider<MemoryRemote>,
}

/// Seeded user ids.
pub struct Team {
    pub alice: String,
    pub bob: String,
    pub carol: String,
}

impl Team {
    /// Alice manages, Bob is a regular member.
    pub fn members(&self) -> Vec<Member> {
        vec![Member::manager(self.alice.clone()), Member::regular(self.bob.clone())]
    }
}

impl Test {
    pub fn new() -> Self {
        Self {
            provider: Provider::new(MemoryRemote::new()),
        }
    }

    /// The in-memory vault, for seeding and call assertions.
    pub fn remote(&self) -> &MemoryRemote {
        self.provider.remote()
    }

    /// Seed three users.
    pub fn team(&self) -> Team {
        let remote = self.remote();
        Team {
            alice: remote.seed_user(ALICE, "Alice", "Doe", "admin").id,
            bob: remote.seed_user(BOB, "Bob", "Smith", "user").id,
            carol: remote.seed_user(CAROL, "Carol", "Jones", "user").id,
        }
    }

    /// Seed a group managed by a freshly seeded user.
    pub fn group(&self, name: &str) -> String {
        let manager = self
            .remote()
            .seed_user(&format!("{}-lead@example.com", name), "Lead", name, "user");
        self.remote().seed_group(name, &[manager.id.as_str()]).id
    }

    /// Forget calls recorded so far.
    pub fn quiet(&self) {
        self.remote().reset_calls();
    }
}
