//! Boundary loop reconstruction and fan refilling
//!
//! Removing a vertex together with its adjoining triangles leaves a polygonal
//! hole. Each adjoining triangle contributes the directed edge opposite the
//! removed vertex; chained together these edges give the ordered hole
//! boundary, which a fan from its first vertex refills with the original
//! winding.

use itertools::Itertools;
use sightline_core::{Triangle, TriangleArena};

/// Fewest adjoining triangles whose boundary can be refilled by a fan
pub const MIN_LOOP_TRIANGLES: usize = 3;

/// The directed edge of `triangle` opposite `vertex`, in winding order:
/// `(next-after-vertex, next-after-that)`.
pub fn opposite_edge(triangle: Triangle, vertex: usize) -> Option<(usize, usize)> {
    let i = triangle.iter().position(|&v| v == vertex)?;
    Some((triangle[(i + 1) % 3], triangle[(i + 2) % 3]))
}

/// Ordered boundary cycle around `vertex`, or `None` when the neighborhood
/// is not a closed manifold fan.
///
/// `adjoining` must list the live slots that reference `vertex`. The result
/// lists each boundary vertex once; its last entry connects back to the first.
pub fn build_loop(triangles: &TriangleArena, adjoining: &[usize], vertex: usize) -> Option<Vec<usize>> {
    if adjoining.len() < MIN_LOOP_TRIANGLES {
        return None;
    }

    let mut pending: Vec<(usize, usize)> = adjoining
        .iter()
        .map(|&slot| triangles.get(slot).and_then(|tri| opposite_edge(tri, vertex)))
        .collect::<Option<_>>()?;

    // A triangle referencing `vertex` twice has no proper opposite edge.
    if pending.iter().any(|&(a, b)| a == vertex || b == vertex) {
        return None;
    }

    let (first, second) = pending.remove(0);
    let mut chain = vec![first, second];
    while !pending.is_empty() {
        let last = chain[chain.len() - 1];
        let next = pending.iter().position(|&(a, _)| a == last)?;
        let (_, b) = pending.remove(next);
        chain.push(b);
    }

    if chain.last() != chain.first() {
        return None;
    }
    chain.pop();

    if !chain.iter().all_unique() {
        return None;
    }
    Some(chain)
}

/// Fan triangles over a boundary loop, anchored at its first vertex:
/// `(v0, v1, v2), (v0, v2, v3), ... (v0, v[k-1], v[k])`.
pub fn fan_triangles(boundary: &[usize]) -> Vec<Triangle> {
    match boundary.split_first() {
        Some((&anchor, rest)) => rest
            .iter()
            .tuple_windows()
            .map(|(&a, &b)| [anchor, a, b])
            .collect(),
        None => Vec::new(),
    }
}
