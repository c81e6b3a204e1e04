//! The question-pool cache: primary/background pool pair, variety scoring,
//! rotation, and single-flight refresh bookkeeping.
//!
//! The pool pair and the in-flight flag form one unit of shared state and are
//! guarded by a single mutex; rotation and refresh completion never interleave
//! partially.

use std::{collections::HashSet, sync::Arc, time::SystemTime};

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use tokio::sync::Mutex;

use crate::dao::models::QuestionRecord;

/// Fraction of a pool that must remain unseen before rotation kicks in. A
/// variety score below `1 - threshold` promotes the background pool.
pub const DEFAULT_VARIETY_REFRESH_THRESHOLD: f64 = 0.5;

/// Earliest timestamp of the id-numbering range (first corpus seeding).
/// Question ids are `q` + zero-padded unix milliseconds, so lexical order
/// matches creation order and a random anchor lands inside the corpus.
const ID_RANGE_START_MS: u64 = 1_704_067_200_000;

/// Discrete anchor set for the text-ordered strategy. Letters chosen so each
/// slice starts roughly evenly through an English-language corpus.
const TEXT_ANCHORS: &[&str] = &["A", "D", "H", "I", "S", "W"];

/// Query shape used to fetch a pseudo-random slice of the corpus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchStrategy {
    /// Ordered by id starting at a random time-based anchor.
    AnchorId,
    /// Ordered by question text starting at a random anchor letter.
    AnchorText,
    /// Ordered by id from the beginning; also the fallback for unknown ids.
    Sequential,
}

impl FetchStrategy {
    /// Number of known strategies.
    pub const COUNT: u8 = 3;

    /// Map a numeric strategy id to a strategy, falling back to
    /// [`FetchStrategy::Sequential`] for anything out of range.
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => FetchStrategy::AnchorId,
            1 => FetchStrategy::AnchorText,
            _ => FetchStrategy::Sequential,
        }
    }

    /// Numeric id of this strategy.
    pub fn index(self) -> u8 {
        match self {
            FetchStrategy::AnchorId => 0,
            FetchStrategy::AnchorText => 1,
            FetchStrategy::Sequential => 2,
        }
    }

    /// Cyclic successor, used to resolve a collision with the primary pool's
    /// strategy when picking a refresh strategy.
    pub fn next(self) -> Self {
        Self::from_index((self.index() + 1) % Self::COUNT)
    }
}

/// Pick a strategy uniformly at random.
pub(crate) fn random_strategy(rng: &mut impl Rng) -> FetchStrategy {
    FetchStrategy::from_index(rng.random_range(0..FetchStrategy::COUNT))
}

/// Pick a refresh strategy that differs from `current` (cyclic increment on
/// collision) so the background pool samples the corpus differently.
pub(crate) fn refresh_strategy(rng: &mut impl Rng, current: FetchStrategy) -> FetchStrategy {
    let picked = random_strategy(rng);
    if picked == current { picked.next() } else { picked }
}

/// Random id anchor inside the known id-numbering range.
pub(crate) fn random_id_anchor(rng: &mut impl Rng, now_ms: u64) -> String {
    let upper = now_ms.max(ID_RANGE_START_MS + 1);
    format!("q{:013}", rng.random_range(ID_RANGE_START_MS..upper))
}

/// Random anchor letter from the discrete text-anchor set.
pub(crate) fn random_text_anchor(rng: &mut impl Rng) -> String {
    TEXT_ANCHORS[rng.random_range(0..TEXT_ANCHORS.len())].to_owned()
}

/// A bounded, immutable batch of lean question records cached for reuse
/// across many requests. Replacing a pool always means building a new one.
#[derive(Debug)]
pub struct Pool {
    /// Lean records that make up the pool.
    pub questions: Vec<QuestionRecord>,
    /// When the pool was fetched.
    pub created_at: SystemTime,
    /// Strategy that produced this pool.
    pub strategy_used: FetchStrategy,
}

impl Pool {
    /// Build a pool stamped with the current time.
    pub fn new(questions: Vec<QuestionRecord>, strategy_used: FetchStrategy) -> Self {
        Self {
            questions,
            created_at: SystemTime::now(),
            strategy_used,
        }
    }
}

/// Fraction of `pool` that remains unseen by `history`.
pub(crate) fn variety_score(pool: &Pool, history: &[String]) -> f64 {
    let history: HashSet<&str> = history.iter().map(String::as_str).collect();
    let seen = pool
        .questions
        .iter()
        .filter(|question| history.contains(question.id.as_str()))
        .count();
    1.0 - seen as f64 / pool.questions.len().max(1) as f64
}

struct PoolSlots {
    primary: Option<Arc<Pool>>,
    background: Option<Arc<Pool>>,
    background_loading: bool,
    rng: StdRng,
}

impl PoolSlots {
    fn new(rng: StdRng) -> Self {
        Self {
            primary: None,
            background: None,
            background_loading: false,
            rng,
        }
    }
}

/// Outcome of the rotation/refresh evaluation for one draw.
pub struct DrawPlan {
    /// Primary pool after a possible rotation; callers select from this
    /// snapshot so an in-flight draw keeps a consistent view even if the
    /// pool is replaced underneath it.
    pub snapshot: Option<Arc<Pool>>,
    /// Variety score computed against the pre-rotation primary.
    pub variety_score: f64,
    /// Whether the background pool was promoted.
    pub rotated: bool,
    /// Strategy to fetch a new background pool with, when this call won the
    /// single-flight slot.
    pub refresh: Option<FetchStrategy>,
}

/// Read-only view of the primary pool for the admin surface.
#[derive(Debug, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of records in the primary pool.
    pub pool_size: usize,
    /// Whole minutes since the primary pool was fetched.
    pub pool_age_minutes: u64,
    /// Ids of the primary pool members.
    pub pool_question_ids: Vec<String>,
    /// When the primary pool was fetched, if one is installed.
    pub pool_created_at: Option<SystemTime>,
}

impl PoolStats {
    fn empty() -> Self {
        Self {
            pool_size: 0,
            pool_age_minutes: 0,
            pool_question_ids: Vec::new(),
            pool_created_at: None,
        }
    }
}

/// Server-resident cache holding at most two pools: the primary pool being
/// served and a background pool prepared ahead of rotation.
///
/// The random source lives inside the same mutex as the pool slots, so any
/// step that both flips bookkeeping and draws randomness (claiming the
/// refresh slot, picking its strategy) is a single critical section with no
/// await point in between. A caller cancelled mid-call can never leave the
/// slot claimed.
pub struct PoolCache {
    slots: Mutex<PoolSlots>,
    draw_size: usize,
    variety_refresh_threshold: f64,
}

impl PoolCache {
    /// Build an empty cache with an entropy-seeded random source.
    pub fn new(draw_size: usize, variety_refresh_threshold: f64) -> Self {
        Self::with_rng(draw_size, variety_refresh_threshold, StdRng::from_os_rng())
    }

    /// Build an empty cache with an injected random source, so shuffles and
    /// strategy picks are reproducible in tests.
    pub fn with_rng(draw_size: usize, variety_refresh_threshold: f64, rng: StdRng) -> Self {
        Self {
            slots: Mutex::new(PoolSlots::new(rng)),
            draw_size,
            variety_refresh_threshold,
        }
    }

    /// Snapshot of the primary pool, if one is installed.
    pub async fn primary(&self) -> Option<Arc<Pool>> {
        let slots = self.slots.lock().await;
        slots.primary.clone()
    }

    /// Install a freshly fetched primary pool. Concurrent cold starts race
    /// here deliberately; the last writer wins.
    pub async fn install_primary(&self, pool: Pool) {
        let mut slots = self.slots.lock().await;
        slots.primary = Some(Arc::new(pool));
    }

    /// Uniformly random strategy for a cold-start fetch.
    pub async fn choose_cold_start_strategy(&self) -> FetchStrategy {
        let mut slots = self.slots.lock().await;
        random_strategy(&mut slots.rng)
    }

    /// Random anchor for the given strategy, or none when the strategy scans
    /// from the beginning.
    pub async fn anchor_for(&self, strategy: FetchStrategy, now_ms: u64) -> Option<String> {
        let mut slots = self.slots.lock().await;
        match strategy {
            FetchStrategy::AnchorId => Some(random_id_anchor(&mut slots.rng, now_ms)),
            FetchStrategy::AnchorText => Some(random_text_anchor(&mut slots.rng)),
            FetchStrategy::Sequential => None,
        }
    }

    /// Evaluate variety against `history`, rotate the background pool in if
    /// the primary has gone stale, and claim the single-flight refresh slot
    /// when the background slot needs filling.
    ///
    /// Rotation is at most one pool deep per call.
    pub async fn prepare_draw(&self, history: &[String]) -> DrawPlan {
        let mut slots = self.slots.lock().await;

        let mut score = 1.0;
        let mut rotated = false;
        if let Some(primary) = slots.primary.as_ref() {
            score = variety_score(primary, history);
            if score < 1.0 - self.variety_refresh_threshold
                && let Some(background) = slots.background.take()
            {
                slots.primary = Some(background);
                rotated = true;
            }
        }

        let refresh = if slots.background.is_none() && !slots.background_loading {
            match slots.primary.as_ref().map(|primary| primary.strategy_used) {
                Some(current) => {
                    slots.background_loading = true;
                    Some(refresh_strategy(&mut slots.rng, current))
                }
                None => None,
            }
        } else {
            None
        };

        DrawPlan {
            snapshot: slots.primary.clone(),
            variety_score: score,
            rotated,
            refresh,
        }
    }

    /// Finish a background refresh: install the pool (if the fetch produced
    /// one) and release the single-flight slot. Called on every exit path of
    /// the refresh task, including failure and panic.
    pub async fn complete_refresh(&self, pool: Option<Pool>) {
        let mut slots = self.slots.lock().await;
        if let Some(pool) = pool {
            slots.background = Some(Arc::new(pool));
        }
        slots.background_loading = false;
    }

    /// Drop both pools. The next draw starts from a cold fetch.
    pub async fn invalidate(&self) {
        let mut slots = self.slots.lock().await;
        slots.primary = None;
        slots.background = None;
    }

    /// Shuffle the pool members not present in `history` and keep at most the
    /// configured draw size. Short results are allowed; the excluded set is
    /// never used for padding.
    pub async fn select(&self, pool: &Pool, history: &[String]) -> Vec<QuestionRecord> {
        let history: HashSet<&str> = history.iter().map(String::as_str).collect();
        let mut candidates: Vec<QuestionRecord> = pool
            .questions
            .iter()
            .filter(|question| !history.contains(question.id.as_str()))
            .cloned()
            .collect();

        let mut slots = self.slots.lock().await;
        candidates.shuffle(&mut slots.rng);
        candidates.truncate(self.draw_size);
        candidates
    }

    /// Pure read of the primary pool; zeros when none is installed.
    pub async fn stats(&self) -> PoolStats {
        let slots = self.slots.lock().await;
        let Some(primary) = slots.primary.as_ref() else {
            return PoolStats::empty();
        };

        PoolStats {
            pool_size: primary.questions.len(),
            pool_age_minutes: primary
                .created_at
                .elapsed()
                .unwrap_or_default()
                .as_secs()
                / 60,
            pool_question_ids: primary
                .questions
                .iter()
                .map(|question| question.id.clone())
                .collect(),
            pool_created_at: Some(primary.created_at),
        }
    }

    #[cfg(test)]
    pub(crate) async fn background(&self) -> Option<Arc<Pool>> {
        let slots = self.slots.lock().await;
        slots.background.clone()
    }

    #[cfg(test)]
    pub(crate) async fn background_loading(&self) -> bool {
        let slots = self.slots.lock().await;
        slots.background_loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> QuestionRecord {
        QuestionRecord {
            id: id.into(),
            question_text: format!("Question {id}?"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            answer: "a".into(),
            storyline_hint_key: format!("lore-{id}"),
        }
    }

    fn pool_of(ids: &[&str], strategy: FetchStrategy) -> Pool {
        Pool::new(ids.iter().map(|id| record(id)).collect(), strategy)
    }

    fn seeded_cache(seed: u64) -> PoolCache {
        PoolCache::with_rng(
            10,
            DEFAULT_VARIETY_REFRESH_THRESHOLD,
            StdRng::seed_from_u64(seed),
        )
    }

    #[test]
    fn strategy_index_roundtrip_and_fallback() {
        assert_eq!(FetchStrategy::from_index(0), FetchStrategy::AnchorId);
        assert_eq!(FetchStrategy::from_index(1), FetchStrategy::AnchorText);
        assert_eq!(FetchStrategy::from_index(2), FetchStrategy::Sequential);
        // Unknown ids fall back to the default strategy.
        assert_eq!(FetchStrategy::from_index(7), FetchStrategy::Sequential);

        for index in 0..FetchStrategy::COUNT {
            assert_eq!(FetchStrategy::from_index(index).index(), index);
        }
    }

    #[test]
    fn strategy_next_cycles() {
        assert_eq!(FetchStrategy::AnchorId.next(), FetchStrategy::AnchorText);
        assert_eq!(FetchStrategy::AnchorText.next(), FetchStrategy::Sequential);
        assert_eq!(FetchStrategy::Sequential.next(), FetchStrategy::AnchorId);
    }

    #[test]
    fn refresh_strategy_never_matches_current() {
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            for current in [
                FetchStrategy::AnchorId,
                FetchStrategy::AnchorText,
                FetchStrategy::Sequential,
            ] {
                assert_ne!(refresh_strategy(&mut rng, current), current);
            }
        }
    }

    #[test]
    fn id_anchor_lands_inside_numbering_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let now_ms = ID_RANGE_START_MS + 86_400_000;
        for _ in 0..32 {
            let anchor = random_id_anchor(&mut rng, now_ms);
            assert_eq!(anchor.len(), 14);
            assert!(anchor.starts_with('q'));
            let millis: u64 = anchor[1..].parse().expect("numeric anchor");
            assert!((ID_RANGE_START_MS..now_ms).contains(&millis));
        }
    }

    #[test]
    fn text_anchor_comes_from_the_discrete_set() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..32 {
            let anchor = random_text_anchor(&mut rng);
            assert!(TEXT_ANCHORS.contains(&anchor.as_str()));
        }
    }

    #[test]
    fn variety_score_counts_unseen_fraction() {
        let pool = pool_of(&["q1", "q2", "q3", "q4"], FetchStrategy::Sequential);
        assert_eq!(variety_score(&pool, &[]), 1.0);
        assert_eq!(variety_score(&pool, &["q1".into(), "q2".into()]), 0.5);
        assert_eq!(
            variety_score(
                &pool,
                &["q1".into(), "q2".into(), "q3".into(), "q4".into()]
            ),
            0.0
        );

        // Ids outside the pool do not count as seen.
        assert_eq!(variety_score(&pool, &["q9".into()]), 1.0);

        // An empty pool scores 1.0 rather than dividing by zero.
        let empty = pool_of(&[], FetchStrategy::Sequential);
        assert_eq!(variety_score(&empty, &["q1".into()]), 1.0);
    }

    #[tokio::test]
    async fn stale_primary_rotates_to_background_strategy() {
        let cache = seeded_cache(7);
        cache
            .install_primary(pool_of(&["q1", "q2"], FetchStrategy::AnchorId))
            .await;
        cache
            .complete_refresh(Some(pool_of(&["q3", "q4"], FetchStrategy::AnchorText)))
            .await;

        let history = vec!["q1".into(), "q2".into()];
        let plan = cache.prepare_draw(&history).await;

        assert!(plan.rotated);
        assert_eq!(plan.variety_score, 0.0);
        let primary = plan.snapshot.expect("primary after rotation");
        assert_eq!(primary.strategy_used, FetchStrategy::AnchorText);
        // The old background slot is empty again, so this call claimed the
        // refresh slot with a strategy differing from the new primary's.
        let refresh = plan.refresh.expect("refresh claimed");
        assert_ne!(refresh, FetchStrategy::AnchorText);
    }

    #[tokio::test]
    async fn fresh_primary_does_not_rotate() {
        let cache = seeded_cache(8);
        cache
            .install_primary(pool_of(&["q1", "q2", "q3", "q4"], FetchStrategy::AnchorId))
            .await;
        cache
            .complete_refresh(Some(pool_of(&["q5"], FetchStrategy::Sequential)))
            .await;

        // One of four seen: variety 0.75, above the rotation cutoff.
        let plan = cache.prepare_draw(&["q1".into()]).await;
        assert!(!plan.rotated);
        assert_eq!(
            plan.snapshot.expect("primary").strategy_used,
            FetchStrategy::AnchorId
        );
        assert!(plan.refresh.is_none());
    }

    #[tokio::test]
    async fn refresh_slot_is_single_flight() {
        let cache = seeded_cache(9);
        cache
            .install_primary(pool_of(&["q1"], FetchStrategy::Sequential))
            .await;

        let first = cache.prepare_draw(&[]).await;
        assert!(first.refresh.is_some());
        assert!(cache.background_loading().await);

        // While the first flight is loading no other caller claims the slot.
        let second = cache.prepare_draw(&[]).await;
        assert!(second.refresh.is_none());

        // A failed fetch releases the slot and the next call retries.
        cache.complete_refresh(None).await;
        assert!(!cache.background_loading().await);
        let third = cache.prepare_draw(&[]).await;
        assert!(third.refresh.is_some());
    }

    #[tokio::test]
    async fn cancelled_caller_never_leaves_the_refresh_slot_claimed() {
        let cache = Arc::new(seeded_cache(14));
        cache
            .install_primary(pool_of(&["q1"], FetchStrategy::Sequential))
            .await;

        // Park a draw on its only await point by holding the slot lock, then
        // drop it mid-call the way a disconnecting client drops a handler.
        let guard = cache.slots.lock().await;
        let parked = tokio::spawn({
            let cache = cache.clone();
            async move {
                cache.prepare_draw(&[]).await;
            }
        });
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        parked.abort();
        let _ = parked.await;
        drop(guard);

        assert!(!cache.background_loading().await);
        let plan = cache.prepare_draw(&[]).await;
        assert!(
            plan.refresh.is_some(),
            "slot still claimable after a cancelled call"
        );
    }

    #[tokio::test]
    async fn select_excludes_history_and_caps_size() {
        let cache = seeded_cache(10);
        let ids: Vec<String> = (0..30).map(|i| format!("q{i:02}")).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let pool = pool_of(&id_refs, FetchStrategy::Sequential);

        let history: Vec<String> = ids[..5].to_vec();
        let picked = cache.select(&pool, &history).await;

        assert_eq!(picked.len(), 10);
        let mut unique: Vec<&str> = picked.iter().map(|q| q.id.as_str()).collect();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), picked.len(), "no duplicate ids");
        for question in &picked {
            assert!(!history.contains(&question.id));
        }
    }

    #[tokio::test]
    async fn select_returns_short_result_when_candidates_run_out() {
        let cache = seeded_cache(11);
        let pool = pool_of(&["q1", "q2", "q3"], FetchStrategy::Sequential);
        let picked = cache
            .select(&pool, &["q1".into(), "q3".into(), "q9".into()])
            .await;
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].id, "q2");
    }

    #[tokio::test]
    async fn invalidate_clears_both_pools() {
        let cache = seeded_cache(12);
        cache
            .install_primary(pool_of(&["q1"], FetchStrategy::AnchorId))
            .await;
        cache
            .complete_refresh(Some(pool_of(&["q2"], FetchStrategy::AnchorText)))
            .await;

        cache.invalidate().await;

        assert!(cache.primary().await.is_none());
        assert!(cache.background().await.is_none());
        assert_eq!(cache.stats().await, PoolStats::empty());
    }

    #[tokio::test]
    async fn stats_reads_are_idempotent() {
        let cache = seeded_cache(13);
        cache
            .install_primary(pool_of(&["q1", "q2", "q3"], FetchStrategy::Sequential))
            .await;

        let first = cache.stats().await;
        let second = cache.stats().await;
        assert_eq!(first.pool_question_ids, second.pool_question_ids);
        assert_eq!(first.pool_size, 3);
        assert_eq!(first.pool_age_minutes, 0);
    }
}
