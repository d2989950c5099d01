//! Triangle storage with stable slot handles
//!
//! Triangles are kept in an arena: removing a triangle clears its live flag
//! instead of shifting the buffer, and new triangles are appended. Live slots
//! therefore keep the relative order a flat index buffer would have after the
//! same sequence of in-place deletions and appends. Slots are only renumbered
//! by [`TriangleArena::compact_slots`].

use crate::error::{Error, Result};
use serde::Serialize;

/// Sentinel for "no vertex" / "no slot"
pub const INVALID: usize = usize::MAX;

/// Three vertex ids in winding order
pub type Triangle = [usize; 3];

/// Arena of triangles addressed by stable slots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(into = "Vec<u32>")]
pub struct TriangleArena {
    slots: Vec<Triangle>,
    live: Vec<bool>,
    live_count: usize,
}

impl TriangleArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an arena holding `triangles`, all live, in order
    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        let n = triangles.len();
        Self {
            slots: triangles,
            live: vec![true; n],
            live_count: n,
        }
    }

    /// Build from a flat index buffer where each run of three entries is one triangle
    pub fn from_flat(indices: &[u32]) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(Error::InvalidData(format!(
                "Index buffer length {} is not divisible by 3",
                indices.len()
            )));
        }
        Ok(Self::from_triangles(
            indices
                .chunks_exact(3)
                .map(|c| [c[0] as usize, c[1] as usize, c[2] as usize])
                .collect(),
        ))
    }

    /// Number of live triangles
    pub fn len(&self) -> usize {
        self.live_count
    }

    /// Whether no triangle is live
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Number of slots ever allocated, live or not
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Offset of a slot in the equivalent flat index buffer
    pub fn offset(slot: usize) -> usize {
        slot * 3
    }

    /// Whether `slot` exists and still holds a triangle
    pub fn is_live(&self, slot: usize) -> bool {
        self.live.get(slot).copied().unwrap_or(false)
    }

    /// The triangle in `slot`, if the slot exists and is live
    pub fn get(&self, slot: usize) -> Option<Triangle> {
        if self.is_live(slot) {
            Some(self.slots[slot])
        } else {
            None
        }
    }

    /// Append a triangle and return its slot
    pub fn push(&mut self, triangle: Triangle) -> usize {
        let slot = self.slots.len();
        self.slots.push(triangle);
        self.live.push(true);
        self.live_count += 1;
        slot
    }

    /// Remove the triangle in `slot`, returning it if it was live
    pub fn remove(&mut self, slot: usize) -> Option<Triangle> {
        let triangle = self.get(slot)?;
        self.live[slot] = false;
        self.live_count -= 1;
        Some(triangle)
    }

    /// Live triangles with their slots, ascending
    pub fn iter(&self) -> impl Iterator<Item = (usize, Triangle)> + '_ {
        self.slots
            .iter()
            .zip(&self.live)
            .enumerate()
            .filter(|(_, (_, live))| **live)
            .map(|(slot, (tri, _))| (slot, *tri))
    }

    /// First live slot at or after `from`
    pub fn next_live(&self, from: usize) -> Option<usize> {
        (from..self.slots.len()).find(|&slot| self.live[slot])
    }

    /// Live triangles, in slot order
    pub fn triangles(&self) -> Vec<Triangle> {
        self.iter().map(|(_, tri)| tri).collect()
    }

    /// Live triangles as a flat index buffer
    pub fn to_flat(&self) -> Vec<u32> {
        self.iter()
            .flat_map(|(_, tri)| tri.map(|v| v as u32))
            .collect()
    }

    /// Largest vertex id referenced by a live triangle
    pub fn max_vertex(&self) -> Option<usize> {
        self.iter().flat_map(|(_, tri)| tri).max()
    }

    /// Drop dead slots so live triangles occupy slots `0..len()`, keeping order.
    pub fn compact_slots(&mut self) {
        if self.live_count == self.slots.len() {
            return;
        }
        let slots = self.triangles();
        *self = Self::from_triangles(slots);
    }

    /// Rewrite every live triangle's vertex ids through `remap`.
    /// Triangles touching a vertex mapped to [`INVALID`] are removed.
    pub fn remap_vertices(&mut self, remap: &[usize]) {
        for slot in 0..self.slots.len() {
            if !self.live[slot] {
                continue;
            }
            let tri = self.slots[slot].map(|v| remap.get(v).copied().unwrap_or(INVALID));
            if tri.contains(&INVALID) {
                self.remove(slot);
            } else {
                self.slots[slot] = tri;
            }
        }
    }
}

impl From<TriangleArena> for Vec<u32> {
    fn from(arena: TriangleArena) -> Self {
        arena.to_flat()
    }
}
