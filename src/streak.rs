use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;

use crate::cache::CACHE_PREFIX;
use crate::model::{Difficulty, StreakData};
use crate::store::{DurableStore, best_effort};

/// Consecutive correct guesses per difficulty, persisted after every change.
pub struct StreakTracker {
    store: Arc<dyn DurableStore>,
    streaks: HashMap<Difficulty, StreakData>,
}

pub fn streak_key(difficulty: Difficulty) -> String {
    format!("{CACHE_PREFIX}streak-{}", difficulty.key())
}

impl StreakTracker {
    pub fn load(store: Arc<dyn DurableStore>) -> Self {
        let streaks = Difficulty::ALL
            .into_iter()
            .map(|d| (d, load_streak(store.as_ref(), d)))
            .collect();
        Self { store, streaks }
    }

    pub fn get(&self, difficulty: Difficulty) -> StreakData {
        self.streaks.get(&difficulty).copied().unwrap_or_default()
    }

    pub fn record_correct(&mut self, difficulty: Difficulty) -> StreakData {
        let prev = self.get(difficulty);
        let current = prev.current.saturating_add(1);
        let next = StreakData {
            current,
            best: prev.best.max(current),
        };
        self.save(difficulty, next);
        next
    }

    pub fn record_incorrect(&mut self, difficulty: Difficulty) -> StreakData {
        let next = StreakData {
            current: 0,
            ..self.get(difficulty)
        };
        self.save(difficulty, next);
        next
    }

    fn save(&mut self, difficulty: Difficulty, data: StreakData) {
        self.streaks.insert(difficulty, data);
        let write = serde_json::to_string(&data)
            .context("serialize streak")
            .and_then(|json| self.store.set(&streak_key(difficulty), &json));
        best_effort("streak save", write);
    }
}

fn load_streak(store: &dyn DurableStore, difficulty: Difficulty) -> StreakData {
    let Some(raw) = best_effort("streak load", store.get(&streak_key(difficulty))).flatten() else {
        return StreakData::default();
    };
    match serde_json::from_str::<StreakData>(&raw) {
        Ok(data) => StreakData {
            current: data.current,
            best: data.best.max(data.current),
        },
        Err(err) => {
            log::warn!("ignoring corrupt {} streak: {err}", difficulty.key());
            StreakData::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{StreakTracker, streak_key};
    use crate::model::{Difficulty, StreakData};
    use crate::store::{DurableStore, MemoryStore};

    #[test]
    fn best_never_below_current() {
        let store = Arc::new(MemoryStore::new());
        let mut tracker = StreakTracker::load(store);
        let outcomes = [true, true, false, true, true, true, false, false, true];
        for correct in outcomes {
            let data = if correct {
                tracker.record_correct(Difficulty::Easy)
            } else {
                tracker.record_incorrect(Difficulty::Easy)
            };
            assert!(data.best >= data.current);
        }
        assert_eq!(tracker.get(Difficulty::Easy), StreakData { current: 1, best: 3 });
    }

    #[test]
    fn incorrect_resets_current_keeps_best() {
        let store = Arc::new(MemoryStore::new());
        let mut tracker = StreakTracker::load(store);
        tracker.record_correct(Difficulty::Hard);
        tracker.record_correct(Difficulty::Hard);
        let data = tracker.record_incorrect(Difficulty::Hard);
        assert_eq!(data, StreakData { current: 0, best: 2 });
    }

    #[test]
    fn tiers_are_independent_and_persisted() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut tracker = StreakTracker::load(store.clone());
            tracker.record_correct(Difficulty::Master);
            tracker.record_correct(Difficulty::Easy);
            tracker.record_correct(Difficulty::Easy);
        }
        let tracker = StreakTracker::load(store.clone());
        assert_eq!(tracker.get(Difficulty::Easy), StreakData { current: 2, best: 2 });
        assert_eq!(tracker.get(Difficulty::Master), StreakData { current: 1, best: 1 });
        assert_eq!(tracker.get(Difficulty::Medium), StreakData::default());
        assert!(store.get("nfl-game-streak-easy").expect("get").is_some());
    }

    #[test]
    fn corrupt_or_inconsistent_records_are_repaired() {
        let store = Arc::new(MemoryStore::new());
        store.set(&streak_key(Difficulty::Easy), "garbage").expect("seed");
        store
            .set(&streak_key(Difficulty::Hard), r#"{"current":4,"best":2}"#)
            .expect("seed");
        let tracker = StreakTracker::load(store);
        assert_eq!(tracker.get(Difficulty::Easy), StreakData::default());
        assert_eq!(tracker.get(Difficulty::Hard), StreakData { current: 4, best: 4 });
    }
}
