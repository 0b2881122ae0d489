// File: src/core/ranking.rs
use crate::embedding::EmbeddingProvider;
use crate::error::GameResult;
use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Rank of every vocabulary word relative to one target (1 = closest).
/// Immutable once built.
#[derive(Debug)]
pub struct RankingTable {
    target: String,
    ranks: HashMap<String, u32>,
}

impl RankingTable {
    /// Ranks follow the provider's neighbour order exactly; ties are not re-sorted.
    pub fn compute(provider: &dyn EmbeddingProvider, target: &str) -> GameResult<Self> {
        info!("[ranking] Computing ranking for a {}-letter target", target.chars().count());
        let neighbours = provider.nearest_neighbors(target, provider.vocab_size())?;
        let ranks: HashMap<String, u32> = neighbours
            .into_iter()
            .enumerate()
            .map(|(i, (word, _))| (word, i as u32 + 1))
            .collect();
        info!("[ranking] Ranked {} words", ranks.len());
        Ok(Self { target: target.to_string(), ranks })
    }

    pub fn rank_of(&self, word: &str) -> Option<u32> {
        self.ranks.get(word).copied()
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

type Slot = Arc<Mutex<Option<Arc<RankingTable>>>>;

/// Memoises ranking tables, at most `capacity` targets.
///
/// The outer lock only guards the slot map; the expensive computation runs
/// under the per-target slot lock, so callers racing on one target wait for a
/// single computation while other targets proceed. Once full, new targets are
/// computed on every call and resident entries are never evicted.
pub struct RankingCache {
    capacity: usize,
    slots: Mutex<HashMap<String, Slot>>,
}

impl RankingCache {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, slots: Mutex::new(HashMap::new()) }
    }

    pub fn rankings_for(
        &self,
        provider: &dyn EmbeddingProvider,
        target: &str,
    ) -> GameResult<Arc<RankingTable>> {
        let slot = {
            let mut slots = self.slots.lock();
            match slots.get(target) {
                Some(slot) => Some(slot.clone()),
                None if slots.len() < self.capacity => {
                    let slot: Slot = Arc::new(Mutex::new(None));
                    slots.insert(target.to_string(), slot.clone());
                    Some(slot)
                }
                None => None,
            }
        };

        let Some(slot) = slot else {
            debug!("[ranking] Cache full ({}), computing uncached", self.capacity);
            return Ok(Arc::new(RankingTable::compute(provider, target)?));
        };

        let mut guard = slot.lock();
        if let Some(table) = guard.as_ref() {
            return Ok(table.clone());
        }
        match RankingTable::compute(provider, target) {
            Ok(table) => {
                let table = Arc::new(table);
                *guard = Some(table.clone());
                Ok(table)
            }
            Err(e) => {
                drop(guard);
                self.release_empty(target, &slot);
                Err(e)
            }
        }
    }

    /// Frees a reserved slot whose computation failed so it does not count
    /// against capacity. A slot another caller is filling is left alone.
    fn release_empty(&self, target: &str, slot: &Slot) {
        let mut slots = self.slots.lock();
        let still_ours = slots.get(target).is_some_and(|s| Arc::ptr_eq(s, slot));
        let empty = slot.try_lock().is_some_and(|s| s.is_none());
        if still_ours && empty {
            slots.remove(target);
        }
    }

    pub fn is_cached(&self, target: &str) -> bool {
        let slot = self.slots.lock().get(target).cloned();
        slot.is_some_and(|s| s.lock().is_some())
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{sample_model, VectorModel};
    use crate::error::GameError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts full-ranking requests made against the wrapped model.
    struct CountingProvider {
        inner: VectorModel,
        calls: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self { inner: sample_model(), calls: AtomicUsize::new(0) }
        }
    }

    impl EmbeddingProvider for CountingProvider {
        fn contains(&self, word: &str) -> bool {
            self.inner.contains(word)
        }
        fn similarity(&self, a: &str, b: &str) -> GameResult<f32> {
            self.inner.similarity(a, b)
        }
        fn nearest_neighbors(&self, word: &str, top_n: usize) -> GameResult<Vec<(String, f32)>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.nearest_neighbors(word, top_n)
        }
        fn vocab_size(&self) -> usize {
            self.inner.vocab_size()
        }
        fn words(&self) -> &[String] {
            self.inner.words()
        }
    }

    #[test]
    fn table_follows_provider_order() {
        let table = RankingTable::compute(&sample_model(), "mare").unwrap();
        assert_eq!(table.rank_of("oceano"), Some(1));
        assert_eq!(table.rank_of("spiaggia"), Some(2));
        assert_eq!(table.rank_of("fuoco"), Some(7));
        assert_eq!(table.rank_of("mare"), None);
        assert_eq!(table.len(), 7);
    }

    #[test]
    fn closer_words_never_rank_worse() {
        let model = sample_model();
        let table = RankingTable::compute(&model, "mare").unwrap();
        for a in model.words().iter().filter(|w| *w != "mare") {
            for b in model.words().iter().filter(|w| *w != "mare") {
                if model.similarity("mare", a).unwrap() > model.similarity("mare", b).unwrap() {
                    assert!(table.rank_of(a).unwrap() <= table.rank_of(b).unwrap());
                }
            }
        }
    }

    #[test]
    fn hits_reuse_the_table() {
        let provider = CountingProvider::new();
        let cache = RankingCache::new(4);
        let first = cache.rankings_for(&provider, "mare").unwrap();
        let second = cache.rankings_for(&provider, "mare").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_cached("mare"));
    }

    #[test]
    fn full_cache_keeps_residents_and_recomputes_newcomers() {
        let provider = CountingProvider::new();
        let cache = RankingCache::new(1);
        cache.rankings_for(&provider, "mare").unwrap();
        cache.rankings_for(&provider, "neve").unwrap();
        cache.rankings_for(&provider, "neve").unwrap();

        assert!(cache.is_cached("mare"));
        assert!(!cache.is_cached("neve"));
        assert_eq!(cache.len(), 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);

        cache.rankings_for(&provider, "mare").unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn failed_computation_frees_the_slot() {
        let provider = CountingProvider::new();
        let cache = RankingCache::new(1);
        let err = cache.rankings_for(&provider, "xyz").unwrap_err();
        assert!(matches!(err, GameError::InvalidInput(_)));
        assert!(cache.is_empty());
        cache.rankings_for(&provider, "mare").unwrap();
        assert!(cache.is_cached("mare"));
    }

    #[test]
    fn concurrent_callers_share_one_computation() {
        let provider = Arc::new(CountingProvider::new());
        let cache = Arc::new(RankingCache::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let provider = provider.clone();
                let cache = cache.clone();
                std::thread::spawn(move || cache.rankings_for(provider.as_ref(), "mare").unwrap().len())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 7);
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
