//! Scene hierarchy over mesh jobs

use serde::{Deserialize, Serialize};

/// A named node that may refer to a job by index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_job(mut self, job: usize) -> Self {
        self.job = Some(job);
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Whether this node or any descendant refers to a job
    pub fn has_jobs(&self) -> bool {
        self.job.is_some() || self.children.iter().any(SceneNode::has_jobs)
    }

    /// Number of job references in the subtree
    pub fn job_count(&self) -> usize {
        usize::from(self.job.is_some()) + self.children.iter().map(SceneNode::job_count).sum::<usize>()
    }

    /// True iff every job in the subtree satisfies `has_result`
    pub fn all_have_results<F>(&self, has_result: &F) -> bool
    where
        F: Fn(usize) -> bool,
    {
        self.job.map_or(true, has_result) && self.children.iter().all(|c| c.all_have_results(has_result))
    }

    /// Drop subtrees that contain no jobs. `None` if nothing is left.
    pub fn prune_empty(self) -> Option<Self> {
        if !self.has_jobs() {
            return None;
        }
        let children = self.children.into_iter().filter_map(SceneNode::prune_empty).collect();
        Some(Self {
            name: self.name,
            job: self.job,
            children,
        })
    }

    /// Depth-first `(depth, node)` pairs, parents before children
    pub fn walk(&self) -> Vec<(usize, &SceneNode)> {
        let mut out = Vec::new();
        let mut stack = vec![(0, self)];
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            stack.extend(node.children.iter().rev().map(|c| (depth + 1, c)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> SceneNode {
        SceneNode::new("root")
            .with_child(
                SceneNode::new("building")
                    .with_job(0)
                    .with_child(SceneNode::new("window").with_job(1))
                    .with_child(SceneNode::new("light")),
            )
            .with_child(SceneNode::new("empty").with_child(SceneNode::new("camera")))
            .with_child(SceneNode::new("tree").with_job(2))
    }

    #[test]
    fn test_all_have_results() {
        let root = tree();
        assert!(root.all_have_results(&|_| true));
        assert!(!root.all_have_results(&|job| job != 1));
        assert!(SceneNode::new("lonely").all_have_results(&|_| false));
    }

    #[test]
    fn test_prune_empty() {
        let pruned = tree().prune_empty().unwrap();
        let names: Vec<&str> = pruned.walk().iter().map(|(_, n)| n.name.as_str()).collect();
        assert_eq!(names, vec!["root", "building", "window", "tree"]);
        assert_eq!(pruned.job_count(), 3);
        assert!(SceneNode::new("empty").prune_empty().is_none());
    }

    #[test]
    fn test_walk_depths() {
        let depths: Vec<usize> = tree().walk().iter().map(|(d, _)| *d).collect();
        assert_eq!(depths, vec![0, 1, 2, 2, 1, 2, 1]);
    }
}
