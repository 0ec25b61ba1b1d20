#![forbid(unsafe_code)]

//! In-memory lineage DAG over exact artifact versions, plus the
//! workflow-internal stage dependency graph.

use std::collections::{HashMap, HashSet, VecDeque};


#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    Stage,
    Dataset,
    Workflow,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stage => "stage",
            Self::Dataset => "dataset",
            Self::Workflow => "workflow",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "stage" => Some(Self::Stage),
            "dataset" => Some(Self::Dataset),
            "workflow" => Some(Self::Workflow),
            _ => None,
        }
    }
}

/// Exact identity of one persisted artifact version.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArtifactRef {
    pub kind: ArtifactKind,
    pub workspace: String,
    pub name: String,
    pub version: String,
}

impl ArtifactRef {
    pub fn new(
        kind: ArtifactKind,
        workspace: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            workspace: workspace.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    /// `workspace.name@version` rendering used in messages and logs.
    pub fn label(&self) -> String {
        format!("{}.{}@{}", self.workspace, self.name, self.version)
    }
}

impl std::fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}@{}", self.workspace, self.name, self.version)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineageError {
    CycleDetected { producer: String, artifact: String },
}

impl std::fmt::Display for LineageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CycleDetected { producer, artifact } => write!(
                f,
                "edge {producer} -> {artifact} would close a lineage cycle"
            ),
        }
    }
}

impl std::error::Error for LineageError {}

/// Directed graph of `producer -> artifact` relations. Edges are inserted
/// one at a time and an edge that would close a cycle is refused, leaving
/// the graph unchanged.
#[derive(Debug, Default)]
pub struct LineageGraph {
    nodes: Vec<ArtifactRef>,
    index: HashMap<ArtifactRef, usize>,
    producers: Vec<Vec<usize>>,
}

impl LineageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, artifact: &ArtifactRef) -> bool {
        self.index.contains_key(artifact)
    }

    fn intern(&mut self, artifact: &ArtifactRef) -> usize {
        if let Some(&index) = self.index.get(artifact) {
            return index;
        }
        let index = self.nodes.len();
        self.nodes.push(artifact.clone());
        self.index.insert(artifact.clone(), index);
        self.producers.push(Vec::new());
        index
    }

    pub fn add_edge(
        &mut self,
        producer: &ArtifactRef,
        artifact: &ArtifactRef,
    ) -> Result<(), LineageError> {
        if producer == artifact {
            return Err(LineageError::CycleDetected {
                producer: producer.label(),
                artifact: artifact.label(),
            });
        }
        // The new edge makes `producer` an ancestor of `artifact`; if
        // `artifact` already sits in `producer`'s ancestry the edge closes
        // a loop. Checked before interning so a refused edge leaves no
        // trace, not even fresh nodes.
        if self.is_ancestor(artifact, producer) {
            return Err(LineageError::CycleDetected {
                producer: producer.label(),
                artifact: artifact.label(),
            });
        }
        let producer_index = self.intern(producer);
        let artifact_index = self.intern(artifact);
        if !self.producers[artifact_index].contains(&producer_index) {
            self.producers[artifact_index].push(producer_index);
        }
        Ok(())
    }

    /// Ancestors of `artifact` in breadth-first order, nearest first,
    /// deduplicated. The artifact itself is not included.
    pub fn ancestors(&self, artifact: &ArtifactRef) -> Vec<ArtifactRef> {
        let Some(&start) = self.index.get(artifact) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        seen.insert(start);
        let mut queue = VecDeque::from([start]);
        let mut out = Vec::new();
        while let Some(current) = queue.pop_front() {
            for &producer in &self.producers[current] {
                if seen.insert(producer) {
                    out.push(self.nodes[producer].clone());
                    queue.push_back(producer);
                }
            }
        }
        out
    }

    /// Whether `candidate` is a (transitive) producer of `artifact`.
    pub fn is_ancestor(&self, candidate: &ArtifactRef, artifact: &ArtifactRef) -> bool {
        let (Some(&candidate_index), Some(&start)) =
            (self.index.get(candidate), self.index.get(artifact))
        else {
            return false;
        };
        let mut seen = HashSet::new();
        seen.insert(start);
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for &producer in &self.producers[current] {
                if producer == candidate_index {
                    return true;
                }
                if seen.insert(producer) {
                    queue.push_back(producer);
                }
            }
        }
        false
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageDagError {
    DuplicateStage { name: String },
    UnknownStage { name: String },
    CycleDetected { upstream: String, downstream: String },
}

impl std::fmt::Display for StageDagError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateStage { name } => write!(f, "stage {name:?} declared twice"),
            Self::UnknownStage { name } => write!(f, "stage {name:?} is not declared"),
            Self::CycleDetected {
                upstream,
                downstream,
            } => write!(
                f,
                "dependency {upstream} -> {downstream} would close a cycle"
            ),
        }
    }
}

impl std::error::Error for StageDagError {}

/// The dependency DAG inside one workflow. Stages keep their declaration
/// order, which breaks ties in [`StageDag::topo_order`] so traversal is
/// reproducible across runs.
#[derive(Clone, Debug, Default)]
pub struct StageDag {
    stages: Vec<String>,
    edges: Vec<(usize, usize)>,
}

impl StageDag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> &[String] {
        &self.stages
    }

    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edges
            .iter()
            .map(|&(up, down)| (self.stages[up].as_str(), self.stages[down].as_str()))
    }

    pub fn add_stage(&mut self, name: impl Into<String>) -> Result<(), StageDagError> {
        let name = name.into();
        if self.stages.contains(&name) {
            return Err(StageDagError::DuplicateStage { name });
        }
        self.stages.push(name);
        Ok(())
    }

    pub fn add_dependency(&mut self, upstream: &str, downstream: &str) -> Result<(), StageDagError> {
        let up = self.position(upstream)?;
        let down = self.position(downstream)?;
        if up == down || self.reaches(down, up) {
            return Err(StageDagError::CycleDetected {
                upstream: upstream.to_string(),
                downstream: downstream.to_string(),
            });
        }
        if !self.edges.contains(&(up, down)) {
            self.edges.push((up, down));
        }
        Ok(())
    }

    fn position(&self, name: &str) -> Result<usize, StageDagError> {
        self.stages
            .iter()
            .position(|stage| stage == name)
            .ok_or_else(|| StageDagError::UnknownStage {
                name: name.to_string(),
            })
    }

    fn reaches(&self, from: usize, to: usize) -> bool {
        let mut seen = HashSet::new();
        seen.insert(from);
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            for &(up, down) in &self.edges {
                if up != current {
                    continue;
                }
                if down == to {
                    return true;
                }
                if seen.insert(down) {
                    queue.push_back(down);
                }
            }
        }
        false
    }

    /// Kahn's algorithm; among the ready stages the one declared earliest
    /// runs first. Cycles cannot occur because `add_dependency` refuses
    /// them, so every stage appears exactly once.
    pub fn topo_order(&self) -> Vec<String> {
        let mut indegree = vec![0usize; self.stages.len()];
        for &(_, down) in &self.edges {
            indegree[down] += 1;
        }
        let mut out = Vec::with_capacity(self.stages.len());
        let mut done = vec![false; self.stages.len()];
        while out.len() < self.stages.len() {
            let Some(next) = (0..self.stages.len()).find(|&i| !done[i] && indegree[i] == 0) else {
                break;
            };
            done[next] = true;
            out.push(self.stages[next].clone());
            for &(up, down) in &self.edges {
                if up == next {
                    indegree[down] -= 1;
                }
            }
        }
        out
    }
}
