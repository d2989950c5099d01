//! Removal of unreferenced vertices
//!
//! Compaction is the only step that renumbers vertex ids and triangle slots.

use sightline_core::{MeshRecord, INVALID};

/// Vertex counts before and after compaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactionReport {
    pub vertices_before: usize,
    pub vertices_after: usize,
}

impl CompactionReport {
    pub fn vertices_removed(&self) -> usize {
        self.vertices_before - self.vertices_after
    }
}

/// Old vertex id to new dense id, [`INVALID`] for vertices no live triangle
/// references. Referenced vertices keep their relative order.
pub fn vertex_remap(mesh: &MeshRecord) -> (Vec<usize>, usize) {
    let mut reference_count = vec![0usize; mesh.vertex_count()];
    for (_, tri) in mesh.triangles.iter() {
        for v in tri {
            reference_count[v] += 1;
        }
    }

    let mut next = 0;
    let remap = reference_count
        .into_iter()
        .map(|count| {
            if count > 0 {
                next += 1;
                next - 1
            } else {
                INVALID
            }
        })
        .collect();
    (remap, next)
}

fn gather<T: Copy>(values: &[T], remap: &[usize], new_len: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(new_len);
    out.extend(
        values
            .iter()
            .zip(remap)
            .filter(|(_, &new)| new != INVALID)
            .map(|(value, _)| *value),
    );
    out
}

/// Strip vertices no live triangle references, renumber the rest densely and
/// rebuild every attribute array in the new order.
///
/// Optional attributes whose length does not match the vertex count come out
/// absent. Running it twice changes nothing the second time.
pub fn compact(mesh: &mut MeshRecord) -> CompactionReport {
    let vertices_before = mesh.vertex_count();
    let (remap, vertices_after) = vertex_remap(mesh);

    mesh.triangles.remap_vertices(&remap);
    mesh.triangles.compact_slots();

    let normals_aligned = mesh.normals.len() == vertices_before;
    mesh.positions = gather(&mesh.positions, &remap, vertices_after);
    mesh.normals = if normals_aligned {
        gather(&mesh.normals, &remap, vertices_after)
    } else {
        log::warn!(
            "Mesh '{}' has {} normals for {} vertices; recomputing",
            mesh.name,
            mesh.normals.len(),
            vertices_before
        );
        MeshRecord::compute_vertex_normals(&mesh.positions, &mesh.triangles)
    };
    mesh.tangents = mesh
        .tangents
        .take()
        .filter(|t| t.len() == vertices_before)
        .map(|t| gather(&t, &remap, vertices_after));
    mesh.uvs = mesh
        .uvs
        .take()
        .filter(|u| u.len() == vertices_before)
        .map(|u| gather(&u, &remap, vertices_after));

    let report = CompactionReport {
        vertices_before,
        vertices_after,
    };
    log::debug!(
        "Compacted '{}': {} -> {} vertices",
        mesh.name,
        vertices_before,
        vertices_after
    );
    report
}
