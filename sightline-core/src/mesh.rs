//! Mesh record: vertex attributes plus the mutable triangle arena

use crate::error::{Error, Result};
use crate::point::*;
use crate::transform::WorldTransform;
use crate::triangles::{Triangle, TriangleArena};
use serde::Serialize;

/// One mesh undergoing optimization.
///
/// `normals` is always index-aligned with `positions`. `tangents` and `uvs`
/// are either absent or index-aligned; arrays of any other length are dropped
/// when set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshRecord {
    pub name: String,
    pub positions: Vec<Point3f>,
    pub normals: Vec<Vector3f>,
    pub tangents: Option<Vec<Tangent>>,
    pub uvs: Option<Vec<UV>>,
    pub triangles: TriangleArena,
}

impl MeshRecord {
    /// Create a mesh record, validating indices.
    ///
    /// Missing normals are recomputed as smooth vertex normals.
    pub fn new(
        positions: Vec<Point3f>,
        normals: Option<Vec<Vector3f>>,
        triangles: TriangleArena,
    ) -> Result<Self> {
        if let Some(max) = triangles.max_vertex() {
            if max >= positions.len() {
                return Err(Error::InvalidData(format!(
                    "Triangle references vertex {} but mesh has {} vertices",
                    max,
                    positions.len()
                )));
            }
        }

        let normals = match normals {
            Some(normals) if normals.len() == positions.len() => normals,
            Some(normals) => {
                return Err(Error::InvalidData(format!(
                    "Normal count mismatch: {} normals for {} vertices",
                    normals.len(),
                    positions.len()
                )))
            }
            None => Self::compute_vertex_normals(&positions, &triangles),
        };

        Ok(Self {
            name: String::new(),
            positions,
            normals,
            tangents: None,
            uvs: None,
            triangles,
        })
    }

    /// Create a mesh record from a flat index buffer
    pub fn from_flat(
        positions: Vec<Point3f>,
        normals: Option<Vec<Vector3f>>,
        indices: &[u32],
    ) -> Result<Self> {
        Self::new(positions, normals, TriangleArena::from_flat(indices)?)
    }

    /// Create a mesh record from triangles in winding order
    pub fn from_triangles(
        positions: Vec<Point3f>,
        normals: Option<Vec<Vector3f>>,
        triangles: Vec<Triangle>,
    ) -> Result<Self> {
        Self::new(positions, normals, TriangleArena::from_triangles(triangles))
    }

    /// Set the mesh name used in logs and reports
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Attach tangents, see [`MeshRecord::set_tangents`]
    pub fn with_tangents(mut self, tangents: Vec<Tangent>) -> Self {
        self.set_tangents(tangents);
        self
    }

    /// Attach UVs, see [`MeshRecord::set_uvs`]
    pub fn with_uvs(mut self, uvs: Vec<UV>) -> Self {
        self.set_uvs(uvs);
        self
    }

    /// Set tangents; a length mismatch leaves the mesh without tangents
    pub fn set_tangents(&mut self, tangents: Vec<Tangent>) {
        self.tangents = self.aligned_or_absent("tangents", tangents);
    }

    /// Set UVs; a length mismatch leaves the mesh without UVs
    pub fn set_uvs(&mut self, uvs: Vec<UV>) {
        self.uvs = self.aligned_or_absent("uvs", uvs);
    }

    fn aligned_or_absent<T>(&self, attribute: &str, values: Vec<T>) -> Option<Vec<T>> {
        if values.len() == self.positions.len() {
            Some(values)
        } else {
            log::warn!(
                "Dropping {} on mesh '{}': {} values for {} vertices",
                attribute,
                self.name,
                values.len(),
                self.positions.len()
            );
            None
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of live triangles
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Number of vertices referenced by at least one live triangle
    pub fn referenced_vertex_count(&self) -> usize {
        let mut seen = vec![false; self.positions.len()];
        for (_, tri) in self.triangles.iter() {
            for v in tri {
                seen[v] = true;
            }
        }
        seen.into_iter().filter(|&s| s).count()
    }

    /// Check if the mesh has no vertices or no triangles
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.triangles.is_empty()
    }

    /// Check the index and attribute invariants
    pub fn validate(&self) -> Result<()> {
        let n = self.positions.len();
        if self.normals.len() != n {
            return Err(Error::InvalidData(format!(
                "Normal count mismatch: {} normals for {} vertices",
                self.normals.len(),
                n
            )));
        }
        if let Some(max) = self.triangles.max_vertex() {
            if max >= n {
                return Err(Error::InvalidData(format!(
                    "Triangle references vertex {} but mesh has {} vertices",
                    max, n
                )));
            }
        }
        if self.tangents.as_ref().is_some_and(|t| t.len() != n)
            || self.uvs.as_ref().is_some_and(|u| u.len() != n)
        {
            return Err(Error::InvalidData(
                "Optional attribute length does not match vertex count".to_string(),
            ));
        }
        Ok(())
    }

    /// The world-space corners of the live triangle in `slot`
    pub fn world_triangle(&self, slot: usize, transform: &WorldTransform) -> Option<[Point3f; 3]> {
        let tri = self.triangles.get(slot)?;
        Some(tri.map(|v| transform.transform_point(&self.positions[v])))
    }

    /// Live triangles as a flat index buffer
    pub fn indices(&self) -> Vec<u32> {
        self.triangles.to_flat()
    }

    /// Smooth vertex normals: unnormalized face normals summed per vertex,
    /// then normalized. Vertices with no usable sum keep a zero normal.
    pub fn compute_vertex_normals(positions: &[Point3f], triangles: &TriangleArena) -> Vec<Vector3f> {
        let mut normals = vec![Vector3f::zeros(); positions.len()];

        for (_, face) in triangles.iter() {
            let v0 = positions[face[0]];
            let v1 = positions[face[1]];
            let v2 = positions[face[2]];

            let face_normal = (v1 - v0).cross(&(v2 - v0));
            for v in face {
                normals[v] += face_normal;
            }
        }

        for normal in &mut normals {
            *normal = normal.try_normalize(1e-12).unwrap_or_else(Vector3f::zeros);
        }
        normals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> MeshRecord {
        MeshRecord::from_flat(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            None,
            &[0, 1, 2, 0, 2, 3],
        )
        .unwrap()
    }

    #[test]
    fn test_normals_are_recomputed_when_missing() {
        let mesh = quad();
        assert_eq!(mesh.normals.len(), 4);
        for n in &mesh.normals {
            assert_relative_eq!(*n, Vector3f::z());
        }
    }

    #[test]
    fn test_rejects_out_of_range_indices() {
        let err = MeshRecord::from_flat(vec![Point3f::origin(); 2], None, &[0, 1, 2]);
        assert!(matches!(err, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_rejects_normal_count_mismatch() {
        let err = MeshRecord::from_flat(
            vec![Point3f::origin(); 3],
            Some(vec![Vector3f::z(); 2]),
            &[0, 1, 2],
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_mismatched_optional_attributes_are_dropped() {
        let mesh = quad()
            .with_uvs(vec![[0.0, 0.0]; 3])
            .with_tangents(vec![Tangent::default(); 4]);
        assert!(mesh.uvs.is_none());
        assert_eq!(mesh.tangents.as_ref().map(Vec::len), Some(4));
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_isolated_vertex_keeps_zero_normal() {
        let mut positions = quad().positions;
        positions.push(Point3f::new(5.0, 5.0, 5.0));
        let mesh = MeshRecord::from_flat(positions, None, &[0, 1, 2]).unwrap();
        assert_eq!(mesh.normals[4], Vector3f::zeros());
        assert_eq!(mesh.referenced_vertex_count(), 3);
    }

    #[test]
    fn test_world_triangle_applies_transform() {
        let mesh = quad();
        let transform = WorldTransform::translation(Vector3f::new(0.0, 2.0, 0.0));
        let corners = mesh.world_triangle(1, &transform).unwrap();
        assert_relative_eq!(corners[2], Point3f::new(0.0, 3.0, 0.0));
        assert!(mesh.world_triangle(7, &transform).is_none());
    }
}
