use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::RosterPlayer;

pub const RECENT_CAPACITY: usize = 50;
pub const RECENT_KEEP: usize = 25;
pub const MAX_ROUND_ATTEMPTS: usize = 5;

/// Ids shown recently, oldest first.
#[derive(Debug, Default, Clone)]
pub struct RecentlyShown {
    order: VecDeque<String>,
    ids: HashSet<String>,
}

impl RecentlyShown {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.ids.clear();
    }

    pub fn insert(&mut self, id: &str) {
        if !self.ids.insert(id.to_string()) {
            return;
        }
        self.order.push_back(id.to_string());
        if self.order.len() > RECENT_CAPACITY {
            while self.order.len() > RECENT_KEEP {
                if let Some(old) = self.order.pop_front() {
                    self.ids.remove(&old);
                }
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct RoundSampler {
    recent: RecentlyShown,
}

impl RoundSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recent(&self) -> &RecentlyShown {
        &self.recent
    }

    pub fn reset(&mut self) {
        self.recent.clear();
    }

    /// Pick a candidate not shown recently. When the whole pool has been seen
    /// the filter is dropped for this pick and the history starts over.
    pub fn pick_random_player<R: Rng + ?Sized>(
        &mut self,
        pool: &[RosterPlayer],
        rng: &mut R,
    ) -> Option<RosterPlayer> {
        if pool.is_empty() {
            return None;
        }
        let available: Vec<&RosterPlayer> =
            pool.iter().filter(|p| !self.recent.contains(&p.id)).collect();

        let pick = if available.is_empty() {
            self.recent.clear();
            pool.choose(rng)?
        } else {
            *available.choose(rng)?
        };

        self.recent.insert(&pick.id);
        Some(pick.clone())
    }
}

/// Identifies one round request. Only the most recent token is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundToken(u64);

/// Hands out round tokens. Cloned handles share the same counter, so any
/// holder can supersede an in-flight round from another thread.
#[derive(Debug, Clone, Default)]
pub struct RoundSequencer {
    current: Arc<Mutex<u64>>,
}

impl RoundSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self) -> MutexGuard<'_, u64> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn next(&self) -> RoundToken {
        let mut current = self.counter();
        *current += 1;
        RoundToken(*current)
    }

    /// Invalidate whatever round is in flight without starting a new one.
    /// Blocks while a round is being applied under
    /// [`RoundSequencer::apply_if_current`].
    pub fn invalidate(&self) {
        *self.counter() += 1;
    }

    pub fn is_current(&self, token: RoundToken) -> bool {
        *self.counter() == token.0
    }

    /// Run `apply` only if `token` is still current. The token cannot be
    /// superseded while `apply` runs.
    pub fn apply_if_current<R>(&self, token: RoundToken, apply: impl FnOnce() -> R) -> Option<R> {
        let current = self.counter();
        if *current != token.0 {
            return None;
        }
        let applied = apply();
        drop(current);
        Some(applied)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, mpsc};
    use std::thread;
    use std::time::Duration;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::{RECENT_KEEP, RecentlyShown, RoundSampler, RoundSequencer};
    use crate::model::RosterPlayer;

    fn pool(n: usize) -> Vec<RosterPlayer> {
        (0..n)
            .map(|i| RosterPlayer {
                id: format!("p{i}"),
                full_name: format!("Player {i}"),
                position: "QB".to_string(),
                headshot: String::new(),
            })
            .collect()
    }

    #[test]
    fn no_repeats_until_pool_exhausted() {
        let players = pool(10);
        let mut sampler = RoundSampler::new();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();
        for _ in 0..10 {
            let pick = sampler.pick_random_player(&players, &mut rng).expect("pick");
            assert!(seen.insert(pick.id), "repeated before pool exhausted");
        }
        // Everything is recent now; the next pick falls back to the full pool.
        assert!(sampler.pick_random_player(&players, &mut rng).is_some());
        assert_eq!(sampler.recent().len(), 1);
    }

    #[test]
    fn empty_pool_yields_none() {
        let mut sampler = RoundSampler::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(sampler.pick_random_player(&[], &mut rng).is_none());
    }

    #[test]
    fn single_player_pool_always_returns_it() {
        let players = pool(1);
        let mut sampler = RoundSampler::new();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..3 {
            assert_eq!(
                sampler.pick_random_player(&players, &mut rng).expect("pick").id,
                "p0"
            );
        }
    }

    #[test]
    fn recency_trims_to_most_recent_when_over_capacity() {
        let mut recent = RecentlyShown::default();
        for i in 0..51 {
            recent.insert(&format!("id{i}"));
        }
        assert_eq!(recent.len(), RECENT_KEEP);
        assert!(!recent.contains("id0"));
        assert!(!recent.contains("id25"));
        assert!(recent.contains("id26"));
        assert!(recent.contains("id50"));
    }

    #[test]
    fn newer_token_supersedes_older() {
        let seq = RoundSequencer::new();
        let first = seq.next();
        assert!(seq.is_current(first));
        let handle = seq.clone();
        let second = handle.next();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
        handle.invalidate();
        assert!(!seq.is_current(second));
    }

    #[test]
    fn stale_token_is_never_applied() {
        let seq = RoundSequencer::new();
        let stale = seq.next();
        let fresh = seq.next();
        assert_eq!(seq.apply_if_current(stale, || "applied"), None);
        assert_eq!(seq.apply_if_current(fresh, || "applied"), Some("applied"));
    }

    #[test]
    fn invalidate_waits_for_an_apply_in_progress() {
        let seq = RoundSequencer::new();
        let token = seq.next();
        let invalidated = Arc::new(AtomicBool::new(false));
        let (entered_tx, entered_rx) = mpsc::channel();
        let superseder = {
            let handle = seq.clone();
            let invalidated = Arc::clone(&invalidated);
            thread::spawn(move || {
                entered_rx.recv().expect("apply entered");
                handle.invalidate();
                invalidated.store(true, Ordering::SeqCst);
            })
        };
        let seen_during_apply = seq.apply_if_current(token, || {
            entered_tx.send(()).expect("signal");
            thread::sleep(Duration::from_millis(50));
            invalidated.load(Ordering::SeqCst)
        });
        superseder.join().expect("superseder");
        assert_eq!(seen_during_apply, Some(false));
        assert!(!seq.is_current(token));
    }
}
