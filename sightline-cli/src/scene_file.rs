//! JSON scene files
//!
//! A scene is a viewpoint plus a node hierarchy. Nodes carry a local
//! transform and optionally a mesh; world transforms are composed down the
//! tree. Flattening assigns job indices in depth-first order, parents first.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sightline_core::{MeshRecord, Point3f, Tangent, TriangleArena, Vector3f, WorldTransform};
use sightline_pipeline::{MeshJob, MeshReport, MeshSettings, SceneNode};
use sightline_visibility::Viewpoint;

/// Translation, Euler rotation in degrees and scale of a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformFile {
    pub translation: [f32; 3],
    pub rotation_euler_degrees: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for TransformFile {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation_euler_degrees: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl TransformFile {
    pub fn to_world(&self) -> WorldTransform {
        WorldTransform::from_euler_degrees(
            Vector3f::from(self.translation),
            Vector3f::from(self.rotation_euler_degrees),
            Vector3f::from(self.scale),
        )
    }
}

/// Vertex attributes and a flat index buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshFile {
    pub positions: Vec<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normals: Option<Vec<[f32; 3]>>,
    /// `[x, y, z, handedness]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tangents: Option<Vec<[f32; 4]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uvs: Option<Vec<[f32; 2]>>,
    pub indices: Vec<u32>,
}

impl MeshFile {
    pub fn to_record(&self, name: &str) -> sightline_core::Result<MeshRecord> {
        let positions = self.positions.iter().map(|&p| Point3f::from(p)).collect();
        let normals = self
            .normals
            .as_ref()
            .map(|n| n.iter().map(|&v| Vector3f::from(v)).collect());
        let mut record = MeshRecord::new(positions, normals, TriangleArena::from_flat(&self.indices)?)?
            .with_name(name);
        if let Some(tangents) = &self.tangents {
            record.set_tangents(
                tangents
                    .iter()
                    .map(|t| Tangent::new(Vector3f::new(t[0], t[1], t[2]), t[3]))
                    .collect(),
            );
        }
        if let Some(uvs) = &self.uvs {
            record.set_uvs(uvs.clone());
        }
        Ok(record)
    }

    pub fn from_record(record: &MeshRecord) -> Self {
        Self {
            positions: record.positions.iter().map(|p| [p.x, p.y, p.z]).collect(),
            normals: Some(record.normals.iter().map(|n| [n.x, n.y, n.z]).collect()),
            tangents: record.tangents.as_ref().map(|tangents| {
                tangents
                    .iter()
                    .map(|t| [t.vector.x, t.vector.y, t.vector.z, t.handedness])
                    .collect()
            }),
            uvs: record.uvs.clone(),
            indices: record.indices(),
        }
    }
}

/// One node of the scene hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeFile {
    pub name: String,
    #[serde(default)]
    pub transform: TransformFile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<MeshFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<MeshSettings>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeFile>,
}

impl NodeFile {
    fn flatten_into(
        &self,
        parent: &WorldTransform,
        defaults: &MeshSettings,
        jobs: &mut Vec<MeshJob>,
    ) -> Result<SceneNode> {
        let world = parent.compose(&self.transform.to_world());
        let mut node = SceneNode::new(self.name.clone());
        if let Some(mesh) = &self.mesh {
            let record = mesh
                .to_record(&self.name)
                .with_context(|| format!("Invalid mesh in node '{}'", self.name))?;
            let settings = self.settings.unwrap_or(*defaults);
            node = node.with_job(jobs.len());
            jobs.push(MeshJob::new(self.name.clone(), record, world).with_settings(settings));
        }
        for child in &self.children {
            node = node.with_child(child.flatten_into(&world, defaults, jobs)?);
        }
        Ok(node)
    }

    /// Replace meshes in the same order [`SceneFile::flatten`] numbers them
    fn replace_meshes(&mut self, meshes: &mut impl Iterator<Item = MeshFile>) {
        if self.mesh.is_some() {
            self.mesh = meshes.next();
        }
        for child in &mut self.children {
            child.replace_meshes(meshes);
        }
    }
}

/// A whole scene file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneFile {
    pub viewpoint: Viewpoint,
    /// Settings for nodes that do not carry their own
    #[serde(default)]
    pub defaults: MeshSettings,
    pub root: NodeFile,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reports: Vec<MeshReport>,
}

impl SceneFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse scene {}", path.display()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("Failed to write scene {}", path.display()))
    }

    /// Mesh jobs with world transforms, plus the matching hierarchy
    pub fn flatten(&self) -> Result<(Vec<MeshJob>, SceneNode)> {
        let mut jobs = Vec::new();
        let tree = self
            .root
            .flatten_into(&WorldTransform::identity(), &self.defaults, &mut jobs)?;
        Ok((jobs, tree))
    }

    /// Copy of this scene with the meshes swapped for `meshes`, in job order
    pub fn with_meshes(&self, meshes: Vec<MeshFile>, reports: Vec<MeshReport>) -> Self {
        let mut scene = self.clone();
        scene.root.replace_meshes(&mut meshes.into_iter());
        scene.reports = reports;
        scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SCENE: &str = r#"{
        "viewpoint": { "position": [0.0, 10.0, 0.0] },
        "defaults": { "threshold_degrees": 25.0 },
        "root": {
            "name": "root",
            "transform": { "translation": [0.0, 2.0, 0.0] },
            "children": [
                {
                    "name": "quad",
                    "transform": { "scale": [2.0, 2.0, 2.0] },
                    "mesh": {
                        "positions": [[0,0,0],[0,0,1],[1,0,1],[1,0,0]],
                        "uvs": [[0,0],[0,1],[1,1],[1,0]],
                        "indices": [0,1,2, 0,2,3]
                    },
                    "settings": { "sample_resolution": 64 }
                },
                { "name": "empty" },
                {
                    "name": "tri",
                    "mesh": { "positions": [[0,0,0],[0,0,1],[1,0,0]], "indices": [0,1,2] }
                }
            ]
        }
    }"#;

    #[test]
    fn test_parse_and_flatten() {
        let scene: SceneFile = serde_json::from_str(SCENE).unwrap();
        assert_eq!(scene.viewpoint.fov_y_degrees, 60.0);
        let (jobs, tree) = scene.flatten().unwrap();
        assert_eq!(jobs.len(), 2);

        let quad = &jobs[0];
        assert_eq!(quad.name, "quad");
        assert_eq!(quad.settings.sample_resolution.pixels(), 64);
        assert_eq!(quad.settings.threshold_degrees, 40.0);
        assert!(quad.mesh.uvs.is_some());
        // Parent translation applied after the child's scale
        let corner = quad.transform.transform_point(&Point3f::new(1.0, 0.0, 1.0));
        assert_relative_eq!(corner, Point3f::new(2.0, 2.0, 2.0), epsilon = 1e-6);

        assert_eq!(jobs[1].settings.threshold_degrees, 25.0);
        assert_eq!(jobs[1].settings.sample_resolution.pixels(), 512);
        assert_eq!(tree.job_count(), 2);
        assert_eq!(tree.prune_empty().unwrap().children.len(), 2);
    }

    #[test]
    fn test_bad_resolution_is_rejected() {
        let bad = SCENE.replace("\"sample_resolution\": 64", "\"sample_resolution\": 100");
        assert!(serde_json::from_str::<SceneFile>(&bad).is_err());
    }

    #[test]
    fn test_bad_indices_are_reported() {
        let bad = SCENE.replace("[0,1,2, 0,2,3]", "[0,1,2, 0,2,9]");
        let scene: SceneFile = serde_json::from_str(&bad).unwrap();
        let err = scene.flatten().unwrap_err();
        assert!(format!("{:#}", err).contains("quad"));
    }

    #[test]
    fn test_with_meshes_keeps_structure() {
        let scene: SceneFile = serde_json::from_str(SCENE).unwrap();
        let (jobs, _) = scene.flatten().unwrap();
        let replaced: Vec<MeshFile> = jobs.iter().rev().map(|j| MeshFile::from_record(&j.mesh)).collect();
        let out = scene.with_meshes(replaced, Vec::new());
        assert_eq!(out.root.children[0].mesh.as_ref().unwrap().indices, vec![0, 1, 2]);
        assert!(out.root.children[1].mesh.is_none());
        assert_eq!(out.root.children[2].mesh.as_ref().unwrap().positions.len(), 4);
    }
}
