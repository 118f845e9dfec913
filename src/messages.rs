//! Encouraging messages and break suggestions.

use crate::i18n::Translator;
use crate::models::SessionMode;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Number of suggestions shown during a break.
pub const SUGGESTIONS_SHOWN: usize = 3;

/// Moment a message is drawn for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageEvent {
    SessionStart,
    SessionComplete,
}

const WORK_START: [&str; 3] = ["workStartMessage1", "workStartMessage2", "workStartMessage3"];
const BREAK_START: [&str; 3] = ["breakStartMessage1", "breakStartMessage2", "breakStartMessage3"];
const WORK_COMPLETE: [&str; 3] = [
    "workCompleteMessage1",
    "workCompleteMessage2",
    "workCompleteMessage3",
];
const BREAK_COMPLETE: [&str; 3] = [
    "breakCompleteMessage1",
    "breakCompleteMessage2",
    "breakCompleteMessage3",
];
const SUGGESTIONS: [&str; 8] = [
    "takeABreath",
    "stretchYourBody",
    "drinkWater",
    "walkAround",
    "listenToMusic",
    "meditate",
    "readSomething",
    "checkYourMessages",
];

/// Localized message pools for one locale.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageCatalog {
    work_start: Vec<String>,
    break_start: Vec<String>,
    work_complete: Vec<String>,
    break_complete: Vec<String>,
    suggestions: Vec<String>,
}

impl MessageCatalog {
    pub fn load(translator: &Translator) -> Self {
        Self {
            work_start: translator.get_all(&WORK_START),
            break_start: translator.get_all(&BREAK_START),
            work_complete: translator.get_all(&WORK_COMPLETE),
            break_complete: translator.get_all(&BREAK_COMPLETE),
            suggestions: translator.get_all(&SUGGESTIONS),
        }
    }

    pub fn pool(&self, mode: SessionMode, event: MessageEvent) -> &[String] {
        match (mode.is_break(), event) {
            (false, MessageEvent::SessionStart) => &self.work_start,
            (true, MessageEvent::SessionStart) => &self.break_start,
            (false, MessageEvent::SessionComplete) => &self.work_complete,
            (true, MessageEvent::SessionComplete) => &self.break_complete,
        }
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }
}

/// Draws messages and suggestions from a seedable random source.
#[derive(Debug)]
pub struct MessagePicker {
    rng: StdRng,
}

impl MessagePicker {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Picks one entry uniformly, or `None` for an empty pool.
    pub fn choose(&mut self, pool: &[String]) -> Option<String> {
        pool.choose(&mut self.rng).cloned()
    }

    /// Shuffles a copy of the pool and keeps the first `count` entries.
    pub fn sample(&mut self, pool: &[String], count: usize) -> Vec<String> {
        let mut shuffled = pool.to_vec();
        shuffled.shuffle(&mut self.rng);
        shuffled.truncate(count);
        shuffled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Locale;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_pools() {
        let catalog = MessageCatalog::load(&Translator::new(Locale::En));
        assert_eq!(
            catalog.pool(SessionMode::Work, MessageEvent::SessionStart)[0],
            "Let's focus! You can do it."
        );
        // Both break kinds share the break pools.
        assert_eq!(
            catalog.pool(SessionMode::ShortBreak, MessageEvent::SessionComplete),
            catalog.pool(SessionMode::LongBreak, MessageEvent::SessionComplete)
        );
        assert_eq!(catalog.suggestions().len(), 8);
    }

    #[test]
    fn test_catalog_localized() {
        let catalog = MessageCatalog::load(&Translator::new(Locale::Pt));
        assert_eq!(
            catalog.pool(SessionMode::Work, MessageEvent::SessionStart)[0],
            "Vamos focar! Você consegue."
        );
    }

    #[test]
    fn test_choose_from_pool() {
        let catalog = MessageCatalog::load(&Translator::new(Locale::En));
        let pool = catalog.pool(SessionMode::Work, MessageEvent::SessionComplete);
        let mut picker = MessagePicker::seeded(7);
        for _ in 0..20 {
            let picked = picker.choose(pool).unwrap();
            assert!(pool.contains(&picked));
        }
        assert_eq!(picker.choose(&[]), None);
    }

    #[test]
    fn test_sample_without_replacement() {
        let catalog = MessageCatalog::load(&Translator::new(Locale::En));
        let mut picker = MessagePicker::seeded(42);
        for _ in 0..20 {
            let picked = picker.sample(catalog.suggestions(), SUGGESTIONS_SHOWN);
            assert_eq!(picked.len(), SUGGESTIONS_SHOWN);
            let unique: HashSet<_> = picked.iter().collect();
            assert_eq!(unique.len(), SUGGESTIONS_SHOWN);
        }
    }

    #[test]
    fn test_same_seed_same_draws() {
        let pool: Vec<String> = (0..8).map(|i| format!("s{i}")).collect();
        let mut a = MessagePicker::seeded(1);
        let mut b = MessagePicker::seeded(1);
        assert_eq!(a.sample(&pool, 3), b.sample(&pool, 3));
        assert_eq!(a.choose(&pool), b.choose(&pool));
    }
}
