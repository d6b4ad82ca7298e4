//! Kudos and affirmations.
//!
//! Text pools are loaded from `;`-separated files (first column per row) and
//! picked at random. The once-per-day affirmation gate is persisted through
//! a [`DailyMarkStore`] instead of living in process memory.

use std::path::Path;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::calendar::Timestamp;
use crate::error::Result;
use crate::model::{DailyMark, MarkKind};
use crate::storage::{DailyMarkStore, MotivationConfig};

/// A pool of phrases with a fallback for empty pools or blank picks.
#[derive(Debug, Clone, Default)]
pub struct PhrasePool {
    phrases: Vec<String>,
    fallback: String,
}

impl PhrasePool {
    pub fn new(phrases: Vec<String>, fallback: impl Into<String>) -> Self {
        Self {
            phrases,
            fallback: fallback.into(),
        }
    }

    /// Load the first column of each row of a `;`-separated file.
    pub fn load(path: &Path, fallback: impl Into<String>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::new(parse_rows(&content), fallback))
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        match self.phrases.choose(rng) {
            Some(phrase) if !phrase.trim().is_empty() => phrase,
            _ => &self.fallback,
        }
    }
}

fn parse_rows(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.split(';').next().unwrap_or_default().trim().to_string())
        .filter(|phrase| !phrase.is_empty())
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct Motivation {
    pub kudos: PhrasePool,
    pub affirmations: PhrasePool,
}

impl Motivation {
    /// Build pools from configuration. Missing file settings yield empty
    /// pools that always answer with the fallback.
    pub fn from_config(cfg: &MotivationConfig) -> Result<Self> {
        let pool = |file: &Option<String>, fallback: &str| -> Result<PhrasePool> {
            match file {
                Some(path) => PhrasePool::load(Path::new(path), fallback),
                None => Ok(PhrasePool::new(Vec::new(), fallback)),
            }
        };
        Ok(Self {
            kudos: pool(&cfg.kudos_file, &cfg.fallback_kudo)?,
            affirmations: pool(&cfg.affirmations_file, &cfg.fallback_affirmation)?,
        })
    }

    /// Empty pools answering with the configured fallback phrases.
    pub fn fallback(cfg: &MotivationConfig) -> Self {
        Self {
            kudos: PhrasePool::new(Vec::new(), cfg.fallback_kudo.clone()),
            affirmations: PhrasePool::new(Vec::new(), cfg.fallback_affirmation.clone()),
        }
    }

    pub fn random_kudo<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        self.kudos.pick(rng)
    }

    pub fn random_affirmation<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        self.affirmations.pick(rng)
    }
}

/// Once-per-day affirmation bookkeeping per user.
#[derive(Clone)]
pub struct AffirmationGate {
    marks: Arc<dyn DailyMarkStore>,
}

impl AffirmationGate {
    pub fn new(marks: Arc<dyn DailyMarkStore>) -> Self {
        Self { marks }
    }

    /// Record that the user received today's affirmation.
    ///
    /// Returns `true` if one had already been handed out on `when`'s date.
    pub fn check_and_mark(&self, user_id: &str, when: Timestamp) -> Result<bool> {
        let newly = self
            .marks
            .mark(&DailyMark::new(user_id, MarkKind::Affirmation, when))?;
        if !newly {
            debug!(user_id = %user_id, "affirmation already sent today");
        }
        Ok(!newly)
    }

    pub fn was_sent_today(&self, user_id: &str, when: Timestamp) -> Result<bool> {
        Ok(self
            .marks
            .is_marked(&DailyMark::new(user_id, MarkKind::Affirmation, when))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::{DateTime, Duration};
    use rand::SeedableRng;
    use rand_pcg::Pcg64;
    use std::io::Write;

    fn ts(s: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn rows_use_first_column() {
        let rows = parse_rows("Great job;extra\n\n  Keep going ;x;y\n;empty first\n");
        assert_eq!(rows, vec!["Great job", "Keep going"]);
    }

    #[test]
    fn empty_pool_uses_fallback() {
        let pool = PhrasePool::new(Vec::new(), "You can");
        let mut rng = Pcg64::seed_from_u64(7);
        assert_eq!(pool.pick(&mut rng), "You can");
    }

    #[test]
    fn pick_returns_pool_member() {
        let pool = PhrasePool::new(vec!["a".into(), "b".into(), "c".into()], "fallback");
        let mut rng = Pcg64::seed_from_u64(42);
        for _ in 0..20 {
            assert!(["a", "b", "c"].contains(&pool.pick(&mut rng)));
        }
    }

    #[test]
    fn loads_pools_from_config_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Well done;1").unwrap();
        let cfg = MotivationConfig {
            kudos_file: Some(file.path().to_string_lossy().into_owned()),
            ..Default::default()
        };

        let motivation = Motivation::from_config(&cfg).unwrap();
        let mut rng = Pcg64::seed_from_u64(1);
        assert_eq!(motivation.kudos.len(), 1);
        assert_eq!(motivation.random_kudo(&mut rng), "Well done");
        assert!(motivation.affirmations.is_empty());
        assert_eq!(
            motivation.random_affirmation(&mut rng),
            cfg.fallback_affirmation
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let cfg = MotivationConfig {
            kudos_file: Some("/definitely/not/here.csv".into()),
            ..Default::default()
        };
        assert!(Motivation::from_config(&cfg).is_err());
    }

    #[test]
    fn fallback_pools_use_configured_phrases() {
        let cfg = MotivationConfig {
            kudos_file: Some("/definitely/not/here.csv".into()),
            fallback_kudo: "Nice".into(),
            ..Default::default()
        };
        let motivation = Motivation::fallback(&cfg);
        let mut rng = Pcg64::seed_from_u64(3);
        assert!(motivation.kudos.is_empty());
        assert_eq!(motivation.random_kudo(&mut rng), "Nice");
        assert_eq!(
            motivation.random_affirmation(&mut rng),
            cfg.fallback_affirmation
        );
    }

    #[test]
    fn affirmation_gate_is_per_user_and_day() {
        let gate = AffirmationGate::new(Arc::new(MemoryStore::new()));
        let morning = ts("2024-05-01T08:00:00+02:00");

        assert!(!gate.was_sent_today("u1", morning).unwrap());
        assert!(!gate.check_and_mark("u1", morning).unwrap());
        assert!(gate.check_and_mark("u1", morning + Duration::hours(10)).unwrap());
        assert!(gate.was_sent_today("u1", morning).unwrap());

        assert!(!gate.check_and_mark("u2", morning).unwrap());
        assert!(!gate.check_and_mark("u1", morning + Duration::days(1)).unwrap());
    }
}
