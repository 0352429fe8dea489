//! Identity-keyed single-slot caches for derivation stages.
//!
//! Every derivation stage is a pure function of a handful of input slices.
//! A stage cache remembers the identity of those inputs (the `Arc` pointer
//! for shared slices, the value for small scalars) together with the last
//! output. Re-deriving with untouched inputs returns the cached `Arc`
//! unchanged, which gives callers referential identity across calls — the
//! memoization contract the interactive host relies on.

use std::sync::Arc;

use crate::error::Result;

/// The identity of one `Arc`-held input slice.
///
/// Compares the allocation address, not the contents. State mutators must
/// therefore allocate a fresh `Arc` for every change; mutating through
/// `Arc::make_mut` would keep the address and leave stale cache hits behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ArcId(usize);

impl ArcId {
    /// Capture the identity of an input slice.
    pub(crate) fn of<T>(arc: &Arc<T>) -> Self {
        Self(Arc::as_ptr(arc) as usize)
    }
}

/// A one-entry cache for a single derivation stage.
#[derive(Debug)]
pub(crate) struct Stage<K, V> {
    slot: Option<(K, Arc<V>)>,
}

// A derived Default would bound both K and V on Default.
impl<K, V> Default for Stage<K, V> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<K: PartialEq, V> Stage<K, V> {
    /// Return the cached output if `key` matches the last computation,
    /// otherwise run `compute` and cache its result under `key`.
    pub(crate) fn get_or_compute(&mut self, key: K, compute: impl FnOnce() -> V) -> Arc<V> {
        if let Some((cached_key, cached)) = &self.slot {
            if *cached_key == key {
                return Arc::clone(cached);
            }
        }
        let value = Arc::new(compute());
        self.slot = Some((key, Arc::clone(&value)));
        value
    }

    /// Fallible variant of [`Stage::get_or_compute`]. Errors are not cached;
    /// the stage recomputes on the next call.
    pub(crate) fn get_or_try_compute(
        &mut self,
        key: K,
        compute: impl FnOnce() -> Result<V>,
    ) -> Result<Arc<V>> {
        if let Some((cached_key, cached)) = &self.slot {
            if *cached_key == key {
                return Ok(Arc::clone(cached));
            }
        }
        let value = Arc::new(compute()?);
        self.slot = Some((key, Arc::clone(&value)));
        Ok(value)
    }
}
