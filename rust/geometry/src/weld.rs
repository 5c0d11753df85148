// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vertex welding
//!
//! Vertices are identified solely by their coordinates rounded to a fixed
//! number of decimals, stored as fixed-point integers. Two points get the
//! same index if and only if their keys are equal.

use nalgebra::Point3;
use rustc_hash::FxHashMap;

/// Quantized coordinate key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexKey(pub i64, pub i64, pub i64);

impl VertexKey {
    /// Quantize a point with `scale = 10^decimals`
    #[inline]
    pub fn quantize(p: &Point3<f64>, scale: f64) -> Self {
        // `as` saturates, so out-of-range input must be screened with
        // `try_quantize`; rounding -0.0 gives 0
        VertexKey(
            (p.x * scale).round() as i64,
            (p.y * scale).round() as i64,
            (p.z * scale).round() as i64,
        )
    }

    /// Like [`quantize`](Self::quantize), but `None` when a scaled
    /// coordinate is not finite or does not fit in an `i64`
    pub fn try_quantize(p: &Point3<f64>, scale: f64) -> Option<Self> {
        let fits = |c: f64| (c * scale).abs() < KEY_LIMIT;
        if fits(p.x) && fits(p.y) && fits(p.z) {
            Some(Self::quantize(p, scale))
        } else {
            None
        }
    }
}

/// 2^63: the first scaled magnitude an `i64` key cannot hold
const KEY_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Canonical vertex table: key -> dense index, positions in insertion order
#[derive(Debug, Clone)]
pub struct VertexTable {
    scale: f64,
    indices: FxHashMap<VertexKey, u32>,
    positions: Vec<Point3<f64>>,
}

impl VertexTable {
    /// Create an empty table welding at `decimals` decimal places
    pub fn new(decimals: u32) -> Self {
        Self {
            scale: 10f64.powi(decimals as i32),
            indices: FxHashMap::default(),
            positions: Vec::new(),
        }
    }

    /// Key a point would be stored under
    #[inline]
    pub fn key_of(&self, p: &Point3<f64>) -> VertexKey {
        VertexKey::quantize(p, self.scale)
    }

    /// Key for `p`, or `None` when `p` is out of range at this precision
    #[inline]
    pub fn try_key_of(&self, p: &Point3<f64>) -> Option<VertexKey> {
        VertexKey::try_quantize(p, self.scale)
    }

    /// Index for `p`, inserting it if no vertex with the same key exists.
    /// The first point inserted under a key is the one kept.
    pub fn weld(&mut self, p: &Point3<f64>) -> u32 {
        let key = self.key_of(p);
        self.weld_keyed(key, p)
    }

    /// Same as [`weld`](Self::weld) with a precomputed key
    pub fn weld_keyed(&mut self, key: VertexKey, p: &Point3<f64>) -> u32 {
        if let Some(&index) = self.indices.get(&key) {
            return index;
        }
        let index = self.positions.len() as u32;
        self.indices.insert(key, index);
        self.positions.push(*p);
        index
    }

    /// Existing index for `p`, without inserting
    pub fn lookup(&self, p: &Point3<f64>) -> Option<u32> {
        self.indices.get(&self.key_of(p)).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Unique positions in first-insertion order
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn clear(&mut self) {
        self.indices.clear();
        self.positions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weld_merges_within_precision() {
        let mut table = VertexTable::new(6);
        let a = table.weld(&Point3::new(0.5, 0.0, 0.5));
        let b = table.weld(&Point3::new(0.500_000_000_1, 0.0, 0.499_999_999_9));
        let c = table.weld(&Point3::new(0.500_01, 0.0, 0.5));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.len(), 2);
        // First point under a key wins
        assert_eq!(table.positions()[0], Point3::new(0.5, 0.0, 0.5));
    }

    #[test]
    fn test_indices_are_dense_in_insertion_order() {
        let mut table = VertexTable::new(6);
        let pts = [
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 2.0),
        ];
        let idx: Vec<u32> = pts.iter().map(|p| table.weld(p)).collect();
        assert_eq!(idx, vec![0, 1, 0, 2]);
        assert_eq!(table.lookup(&Point3::new(2.0, 0.0, 2.0)), Some(2));
        assert_eq!(table.lookup(&Point3::new(3.0, 0.0, 2.0)), None);
    }

    #[test]
    fn test_negative_zero_welds_with_zero() {
        let mut table = VertexTable::new(6);
        let a = table.weld(&Point3::new(0.0, 0.0, 0.0));
        let b = table.weld(&Point3::new(-0.0, -1e-9, 0.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_out_of_range_keys_are_refused() {
        let table = VertexTable::new(12);
        assert!(table.try_key_of(&Point3::new(1e6, -1e6, 0.0)).is_some());
        assert_eq!(table.try_key_of(&Point3::new(1e7, 0.0, 0.0)), None);
        assert_eq!(table.try_key_of(&Point3::new(0.0, 0.0, -1e7)), None);
        assert_eq!(table.try_key_of(&Point3::new(f64::NAN, 0.0, 0.0)), None);

        let coarse = VertexTable::new(6);
        let a = coarse.try_key_of(&Point3::new(1e7, 0.0, 0.0)).unwrap();
        let b = coarse.try_key_of(&Point3::new(1e7 + 5.0, 0.0, 0.0)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_coarser_precision() {
        let mut table = VertexTable::new(2);
        let a = table.weld(&Point3::new(0.101, 0.0, 0.0));
        let b = table.weld(&Point3::new(0.104, 0.0, 0.0));
        assert_eq!(a, b);
        table.clear();
        assert!(table.is_empty());
    }
}
