//! Build caching for [`MeshedSurface`](super::MeshedSurface).
//!
//! Two things are cached:
//! - the [`GridKey`] of the committed mesh, so a build request with a bit-identical
//!   grid is a no-op;
//! - the grid returned by the grid policy for each requested `ds` (keyed by the bits
//!   of `ds`), so repeated resolution requests skip the policy call.
//!
//! # Example
//! ```ignore
//! let mut cache = GridCache::new();
//! let grid = cache.get_or_insert_grid(0.1, || policy.grid(0.1));
//! if !cache.matches(&grid.key()) {
//!     // build, then
//!     cache.commit(grid.key());
//! }
//! println!("hit rate {:.2}", cache.stats().hit_rate());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use super::tessellation::{GridKey, ParamGrid};

#[derive(Debug, Default)]
pub struct GridCache {
    committed: Option<GridKey>,
    grids: HashMap<u64, Arc<ParamGrid>>,

    mesh_hits: usize,
    mesh_builds: usize,
    failed_builds: usize,
    grid_hits: usize,
    grid_misses: usize,
}

/// Counters for diagnostics and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshCacheStats {
    /// Build requests answered by the committed mesh.
    pub mesh_hits: usize,
    /// Builds that ran the pipeline and committed.
    pub mesh_builds: usize,
    /// Builds that ran the pipeline and rolled back.
    pub failed_builds: usize,
    /// Cached `ds -> grid` entries.
    pub grid_entries: usize,
    pub grid_hits: usize,
    pub grid_misses: usize,
}

impl MeshCacheStats {
    /// Share of build requests that were answered without rebuilding, in `0.0..=1.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.mesh_hits + self.mesh_builds + self.failed_builds;
        if total == 0 {
            0.0
        } else {
            self.mesh_hits as f64 / total as f64
        }
    }
}

impl GridCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stats(&self) -> MeshCacheStats {
        MeshCacheStats {
            mesh_hits: self.mesh_hits,
            mesh_builds: self.mesh_builds,
            failed_builds: self.failed_builds,
            grid_entries: self.grids.len(),
            grid_hits: self.grid_hits,
            grid_misses: self.grid_misses,
        }
    }

    /// Key of the grid the committed mesh was built from.
    #[must_use]
    pub fn committed(&self) -> Option<&GridKey> {
        self.committed.as_ref()
    }

    /// `true` if `key` is the committed grid; counts a hit when it is.
    pub fn matches(&mut self, key: &GridKey) -> bool {
        let hit = self.committed.as_ref() == Some(key);
        if hit {
            self.mesh_hits += 1;
        }
        hit
    }

    pub fn commit(&mut self, key: GridKey) {
        self.committed = Some(key);
        self.mesh_builds += 1;
    }

    /// Forgets the committed grid after a failed build.
    pub fn record_failure(&mut self) {
        self.committed = None;
        self.failed_builds += 1;
    }

    /// Forgets the committed grid without touching counters.
    pub fn invalidate(&mut self) {
        self.committed = None;
    }

    /// Returns the grid cached for `ds`, or computes it with `make` and caches it.
    pub fn get_or_insert_grid(&mut self, ds: f64, make: impl FnOnce() -> ParamGrid) -> Arc<ParamGrid> {
        let key = ds.to_bits();
        if let Some(cached) = self.grids.get(&key) {
            self.grid_hits += 1;
            return Arc::clone(cached);
        }
        self.grid_misses += 1;
        let grid = Arc::new(make());
        self.grids.insert(key, Arc::clone(&grid));
        grid
    }

    /// Drops cached `ds -> grid` entries, e.g. after the grid policy changed.
    pub fn clear_grids(&mut self) {
        self.grids.clear();
    }

    /// Drops everything and resets counters.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
