//! Broadphase candidate pair search.

use glam::Vec3;

use super::kdtree::KdTree;

/// How candidate pairs are found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BroadphaseMode {
    /// Every unordered pair (O(n^2)).
    Exhaustive,
    /// Only bodies whose origins lie within `radius` of a dynamic body.
    KdTree { radius: f32 },
}

impl Default for BroadphaseMode {
    fn default() -> Self {
        Self::Exhaustive
    }
}

/// What the broadphase needs to know about a body.
#[derive(Debug, Clone, Copy)]
pub struct BroadphaseEntry {
    pub position: Vec3,
    pub is_dynamic: bool,
}

/// Candidate pair finder.
#[derive(Debug, Clone, Default)]
pub struct Broadphase {
    mode: BroadphaseMode,
    tree: KdTree,
}

impl Broadphase {
    pub fn new(mode: BroadphaseMode) -> Self {
        Self {
            mode,
            tree: KdTree::new(),
        }
    }

    pub fn mode(&self) -> BroadphaseMode {
        self.mode
    }

    /// Index pairs into `entries` worth a narrowphase test.
    ///
    /// Pairs without a dynamic body are never returned. The kd-tree mode may
    /// report a pair in both orders; callers deduplicate contacts anyway.
    pub fn find_pairs(&mut self, entries: &[BroadphaseEntry]) -> Vec<(usize, usize)> {
        match self.mode {
            BroadphaseMode::Exhaustive => exhaustive_pairs(entries),
            BroadphaseMode::KdTree { radius } => self.kdtree_pairs(entries, radius),
        }
    }

    fn kdtree_pairs(&mut self, entries: &[BroadphaseEntry], radius: f32) -> Vec<(usize, usize)> {
        let positions: Vec<Vec3> = entries.iter().map(|e| e.position).collect();
        self.tree.set_points(&positions);

        let mut pairs = Vec::new();
        for (i, entry) in entries.iter().enumerate() {
            if !entry.is_dynamic {
                continue;
            }
            for neighbor in self.tree.radius(entry.position, radius) {
                if neighbor.index != i {
                    pairs.push((i, neighbor.index));
                }
            }
        }
        pairs
    }
}

fn exhaustive_pairs(entries: &[BroadphaseEntry]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..entries.len() {
        for j in (i + 1)..entries.len() {
            // Skip pairs that can never move
            if !entries[i].is_dynamic && !entries[j].is_dynamic {
                continue;
            }
            pairs.push((i, j));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(x: f32, is_dynamic: bool) -> BroadphaseEntry {
        BroadphaseEntry {
            position: Vec3::new(x, 0.0, 0.0),
            is_dynamic,
        }
    }

    #[test]
    fn test_exhaustive_skips_static_pairs() {
        let entries = [entry(0.0, false), entry(1.0, false), entry(50.0, true)];
        let pairs = Broadphase::new(BroadphaseMode::Exhaustive).find_pairs(&entries);
        assert_eq!(pairs, vec![(0, 2), (1, 2)]);
    }

    #[test]
    fn test_kdtree_prunes_distant_bodies() {
        let entries = [
            entry(0.0, true),
            entry(1.0, true),
            entry(10.0, true),
            entry(1.5, false),
        ];
        let mut broadphase = Broadphase::new(BroadphaseMode::KdTree { radius: 2.0 });
        let mut pairs: Vec<_> = broadphase
            .find_pairs(&entries)
            .into_iter()
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        pairs.sort_unstable();
        pairs.dedup();

        assert_eq!(pairs, vec![(0, 1), (0, 3), (1, 3)]);
    }

    #[test]
    fn test_kdtree_static_bodies_do_not_query() {
        let entries = [entry(0.0, false), entry(0.5, false)];
        let mut broadphase = Broadphase::new(BroadphaseMode::KdTree { radius: 2.0 });
        assert!(broadphase.find_pairs(&entries).is_empty());
    }
}
