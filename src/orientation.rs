//! Orientation classification and the shared orientation cache.
//!
//! Layout consumers (masonry grids, the viewer, profile pages) all need to
//! agree on whether an asset is portrait, landscape or square. The first
//! successful decode of an asset decides; later observers read the stored
//! answer instead of recomputing it.
//!
//! [`OrientationStore`] is an explicitly passed handle, not a global, so tests
//! and independent sessions get their own. Writes are "set if absent": when
//! two observers race (a grid cell and the viewer decoding the same asset),
//! the first write wins and the second is discarded even if it disagrees.
//!
//! Both the three-way classifier and the two-way (portrait/landscape)
//! classifier write into the same map, so the two views can never diverge
//! for one id.

use crate::config::OrientationConfig;
use crate::types::{AssetId, Dimensions};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
    Square,
}

impl Orientation {
    /// Collapse to the two-way view. Square reads as landscape, matching what
    /// [`classify_two_way`] returns for an exact square.
    pub fn two_way(self) -> Orientation {
        match self {
            Orientation::Square => Orientation::Landscape,
            other => other,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
            Orientation::Square => "square",
        })
    }
}

/// Three-way classification.
///
/// `|h/w - 1| < tolerance` is square, taller is portrait, anything else is
/// landscape. A zero-width image is portrait if it has any height, square
/// if it has none.
pub fn classify(dims: Dimensions, tolerance: f64) -> Orientation {
    if dims.width == 0 {
        return if dims.height == 0 {
            Orientation::Square
        } else {
            Orientation::Portrait
        };
    }
    let ratio = dims.height as f64 / dims.width as f64;
    if (ratio - 1.0).abs() < tolerance {
        Orientation::Square
    } else if dims.height > dims.width {
        Orientation::Portrait
    } else {
        Orientation::Landscape
    }
}

/// Two-way classification: portrait if taller than wide, else landscape.
pub fn classify_two_way(dims: Dimensions) -> Orientation {
    if dims.height > dims.width {
        Orientation::Portrait
    } else {
        Orientation::Landscape
    }
}

/// Shared, write-once-per-id orientation cache.
///
/// Cloning yields another handle to the same map.
#[derive(Debug, Clone)]
pub struct OrientationStore {
    entries: Arc<RwLock<HashMap<AssetId, Orientation>>>,
    tolerance: f64,
}

impl OrientationStore {
    /// New empty store using `tolerance` for the square band.
    pub fn new(tolerance: f64) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            tolerance,
        }
    }

    pub fn from_config(config: &OrientationConfig) -> Self {
        Self::new(config.square_tolerance)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<AssetId, Orientation>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<AssetId, Orientation>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Classify (three-way) and store if absent. Returns the effective entry,
    /// which is the pre-existing one when the id was already classified.
    pub fn record(&self, id: &AssetId, dims: Dimensions) -> Orientation {
        self.set_if_absent(id, classify(dims, self.tolerance))
    }

    /// Classify (two-way) and store if absent, sharing the three-way map.
    pub fn record_two_way(&self, id: &AssetId, dims: Dimensions) -> Orientation {
        self.set_if_absent(id, classify_two_way(dims))
    }

    /// Store `orientation` unless `id` already has an entry.
    pub fn set_if_absent(&self, id: &AssetId, orientation: Orientation) -> Orientation {
        let mut entries = self.write();
        match entries.get(id) {
            Some(&existing) => {
                if existing != orientation {
                    tracing::debug!(
                        asset = %id,
                        %existing,
                        discarded = %orientation,
                        "Orientation already recorded, keeping first write"
                    );
                }
                existing
            }
            None => {
                entries.insert(id.clone(), orientation);
                orientation
            }
        }
    }

    pub fn get(&self, id: &AssetId) -> Option<Orientation> {
        self.read().get(id).copied()
    }

    /// Stored entry seen through the two-way classifier.
    pub fn get_two_way(&self, id: &AssetId) -> Option<Orientation> {
        self.get(id).map(Orientation::two_way)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy of every entry, sorted by id.
    pub fn snapshot(&self) -> Vec<(AssetId, Orientation)> {
        let mut entries: Vec<_> = self
            .read()
            .iter()
            .map(|(id, o)| (id.clone(), *o))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Teardown hook for a dataset or session reset (e.g. sign-out).
    pub fn clear(&self) {
        self.write().clear();
    }
}

impl Default for OrientationStore {
    fn default() -> Self {
        Self::from_config(&OrientationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions::new(width, height)
    }

    // =========================================================================
    // classify
    // =========================================================================

    #[test]
    fn classify_portrait() {
        assert_eq!(classify(dims(800, 1200), 0.05), Orientation::Portrait);
    }

    #[test]
    fn classify_landscape() {
        assert_eq!(classify(dims(1200, 800), 0.05), Orientation::Landscape);
    }

    #[test]
    fn classify_exact_square() {
        assert_eq!(classify(dims(1000, 1000), 0.05), Orientation::Square);
    }

    #[test]
    fn classify_near_square_within_tolerance() {
        // h/w = 1.04
        assert_eq!(classify(dims(1000, 1040), 0.05), Orientation::Square);
        // h/w = 0.96
        assert_eq!(classify(dims(1000, 960), 0.05), Orientation::Square);
    }

    #[test]
    fn classify_just_outside_tolerance() {
        // h/w = 1.06
        assert_eq!(classify(dims(1000, 1060), 0.05), Orientation::Portrait);
        // h/w = 0.94
        assert_eq!(classify(dims(1000, 940), 0.05), Orientation::Landscape);
    }

    #[test]
    fn classify_zero_tolerance_has_no_square_band() {
        assert_eq!(classify(dims(1000, 1000), 0.0), Orientation::Landscape);
    }

    #[test]
    fn classify_degenerate_dimensions() {
        assert_eq!(classify(dims(0, 10), 0.05), Orientation::Portrait);
        assert_eq!(classify(dims(0, 0), 0.05), Orientation::Square);
        assert_eq!(classify(dims(10, 0), 0.05), Orientation::Landscape);
    }

    #[test]
    fn classify_two_way_has_no_square() {
        assert_eq!(classify_two_way(dims(1000, 1000)), Orientation::Landscape);
        assert_eq!(classify_two_way(dims(1000, 1001)), Orientation::Portrait);
    }

    // =========================================================================
    // OrientationStore
    // =========================================================================

    #[test]
    fn first_write_wins() {
        let store = OrientationStore::default();
        let id = AssetId::from("x");
        assert_eq!(store.record(&id, dims(800, 1200)), Orientation::Portrait);
        // Reclassification from different dimensions is discarded
        assert_eq!(store.record(&id, dims(1200, 800)), Orientation::Portrait);
        assert_eq!(store.get(&id), Some(Orientation::Portrait));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn two_way_and_three_way_share_entries() {
        let store = OrientationStore::default();
        let id = AssetId::from("sq");
        assert_eq!(store.record(&id, dims(1000, 1010)), Orientation::Square);
        // Two-way writer sees the existing entry and doesn't overwrite it
        assert_eq!(store.record_two_way(&id, dims(1000, 1010)), Orientation::Square);
        assert_eq!(store.get(&id), Some(Orientation::Square));
        assert_eq!(store.get_two_way(&id), Some(Orientation::Landscape));
    }

    #[test]
    fn two_way_write_blocks_later_three_way_write() {
        let store = OrientationStore::default();
        let id = AssetId::from("p");
        store.record_two_way(&id, dims(1000, 1010));
        assert_eq!(store.record(&id, dims(1000, 1010)), Orientation::Portrait);
    }

    #[test]
    fn clones_share_the_same_map() {
        let store = OrientationStore::default();
        let grid = store.clone();
        let viewer = store.clone();
        let id = AssetId::from("shared");
        grid.record(&id, dims(600, 900));
        assert_eq!(viewer.record(&id, dims(900, 600)), Orientation::Portrait);
        assert_eq!(store.get(&id), Some(Orientation::Portrait));
    }

    #[test]
    fn separate_stores_are_isolated() {
        let a = OrientationStore::default();
        let b = OrientationStore::default();
        a.record(&AssetId::from("x"), dims(1, 2));
        assert!(b.is_empty());
    }

    #[test]
    fn clear_allows_reclassification() {
        let store = OrientationStore::default();
        let id = AssetId::from("x");
        store.record(&id, dims(800, 1200));
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.record(&id, dims(1200, 800)), Orientation::Landscape);
    }

    #[test]
    fn concurrent_writers_agree_on_one_entry() {
        let store = OrientationStore::default();
        let id = AssetId::from("race");
        let results: Vec<Orientation> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let store = store.clone();
                    let id = id.clone();
                    s.spawn(move || {
                        let d = if i % 2 == 0 { dims(600, 900) } else { dims(900, 600) };
                        store.record(&id, d)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        let stored = store.get(&id).unwrap();
        assert!(results.iter().all(|&o| o == stored));
    }

    #[test]
    fn snapshot_sorted_by_id() {
        let store = OrientationStore::default();
        store.record(&AssetId::from("b"), dims(2, 1));
        store.record(&AssetId::from("a"), dims(1, 2));
        let snap = store.snapshot();
        assert_eq!(snap[0], (AssetId::from("a"), Orientation::Portrait));
        assert_eq!(snap[1], (AssetId::from("b"), Orientation::Landscape));
    }
}
