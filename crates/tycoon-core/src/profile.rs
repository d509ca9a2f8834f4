//! Player profile store.
//!
//! Thin domain wrapper over the write-back cache: first-touch loading with
//! defaults, patch-based updates and the cash credit/debit paths used by the
//! build and simulation handlers.

use crate::errors::Rejection;
use crate::migrate::profile_key;
use crate::store::{KvBackend, WriteBackCache};
use crate::types::{PlayerId, PlayerProfile, ProfilePatch};

#[derive(Default)]
pub struct ProfileStore {
    cache: WriteBackCache<PlayerProfile>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Profile for `player_id`, creating a fresh one on first touch.
    pub fn ensure<B: KvBackend>(&mut self, backend: &B, player_id: &str, now: u64) -> &PlayerProfile {
        self.cache
            .ensure_with(backend, &profile_key(player_id), now, || {
                PlayerProfile::new(now)
            })
    }

    pub fn get(&self, player_id: &str) -> Option<&PlayerProfile> {
        self.cache.get(&profile_key(player_id))
    }

    /// Apply a patch to the cached profile, replacing the whole record.
    pub fn patch<B: KvBackend>(
        &mut self,
        backend: &B,
        player_id: &str,
        patch: ProfilePatch,
        now: u64,
    ) -> PlayerProfile {
        let current = self.ensure(backend, player_id, now).clone();
        let updated = patch.apply(&current, now);
        self.cache.write(&profile_key(player_id), updated.clone(), now);
        updated
    }

    /// Debit `cost` if affordable. Rejects without mutating otherwise.
    pub fn try_spend<B: KvBackend>(
        &mut self,
        backend: &B,
        player_id: &str,
        cost: i64,
        now: u64,
    ) -> Result<i64, Rejection> {
        let cash = self.ensure(backend, player_id, now).cash;
        if cash < cost {
            return Err(Rejection::InsufficientFunds { cost, cash });
        }
        let updated = self.patch(backend, player_id, ProfilePatch::cash(cash - cost), now);
        Ok(updated.cash)
    }

    /// Credit `amount` (refunds, order revenue). Returns the new balance.
    pub fn credit<B: KvBackend>(
        &mut self,
        backend: &B,
        player_id: &str,
        amount: i64,
        now: u64,
    ) -> i64 {
        let cash = self.ensure(backend, player_id, now).cash;
        self.patch(backend, player_id, ProfilePatch::cash(cash + amount), now)
            .cash
    }

    /// Whether `player_id` has unlocked `item` (dish or recipe id).
    pub fn has_unlock(&self, player_id: &PlayerId, item: &str) -> bool {
        self.get(player_id)
            .map(|p| p.unlocks.iter().any(|u| u == item))
            .unwrap_or(false)
    }

    pub fn flush_due<B: KvBackend>(&mut self, backend: &mut B, now: u64) {
        self.cache.flush_due(backend, now);
    }

    pub fn flush_all<B: KvBackend>(&mut self, backend: &mut B, now: u64) {
        self.cache.flush_all(backend, now);
    }

    pub fn dirty_count(&self) -> usize {
        self.cache.dirty_count()
    }

    /// All cached profiles with their player ids.
    pub fn cached(&self) -> Vec<(PlayerId, PlayerProfile)> {
        self.cache
            .iter()
            .filter_map(|(key, profile)| {
                key.strip_prefix("profile:")
                    .map(|player| (player.to_string(), profile.clone()))
            })
            .collect()
    }
}
