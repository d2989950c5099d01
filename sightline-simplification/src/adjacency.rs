//! Vertex to triangle adjacency

use std::collections::BTreeSet;
use sightline_core::{Triangle, TriangleArena};

/// Live slots whose triangle references `vertex`, ascending, each slot once.
///
/// Pure scan over the current arena.
pub fn adjoining_triangles(triangles: &TriangleArena, vertex: usize) -> Vec<usize> {
    triangles
        .iter()
        .filter(|(_, tri)| tri.contains(&vertex))
        .map(|(slot, _)| slot)
        .collect()
}

/// Map from every vertex to the live slots that reference it.
///
/// Built from an arena, then updated through [`AdjacencyIndex::insert`] and
/// [`AdjacencyIndex::remove`] alongside every arena mutation so it never goes
/// stale. Slot sets are ordered, matching [`adjoining_triangles`].
#[derive(Debug, Clone, Default)]
pub struct AdjacencyIndex {
    vertex_triangles: Vec<BTreeSet<usize>>,
}

impl AdjacencyIndex {
    pub fn build(triangles: &TriangleArena, vertex_count: usize) -> Self {
        let mut index = Self {
            vertex_triangles: vec![BTreeSet::new(); vertex_count],
        };
        for (slot, tri) in triangles.iter() {
            index.insert(slot, tri);
        }
        index
    }

    /// Slots adjoining `vertex`, ascending
    pub fn adjoining(&self, vertex: usize) -> Vec<usize> {
        self.vertex_triangles
            .get(vertex)
            .map(|slots| slots.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether any live triangle references `vertex`
    pub fn is_referenced(&self, vertex: usize) -> bool {
        self.vertex_triangles
            .get(vertex)
            .is_some_and(|slots| !slots.is_empty())
    }

    /// Record that `slot` now holds `triangle`
    pub fn insert(&mut self, slot: usize, triangle: Triangle) {
        for v in triangle {
            if let Some(slots) = self.vertex_triangles.get_mut(v) {
                slots.insert(slot);
            }
        }
    }

    /// Forget `slot`, which held `triangle`
    pub fn remove(&mut self, slot: usize, triangle: Triangle) {
        for v in triangle {
            if let Some(slots) = self.vertex_triangles.get_mut(v) {
                slots.remove(&slot);
            }
        }
    }
}
