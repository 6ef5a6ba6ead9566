//! The content graph.
//!
//! An in-memory directed multigraph over every loaded artifact. Nodes are
//! content items plus synthetic nodes for commands, docker images and
//! references that could not be resolved. Edges are stored by index inside a
//! [`petgraph`] graph, so cycles (two playbooks testing each other) need no
//! special handling; queries walk them with a visited set.
//!
//! The graph is built once per run and is read-only afterwards.

mod queries;

pub use queries::{DependencyViolation, DuplicateName, MarketplaceViolation, ModuleMismatch, Usage};

use crate::content::integration;
use crate::content::playbook::{self, ReferenceKind};
use crate::content::{Artifact, ContentType, Marketplace};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A loaded content item.
    Item,
    /// A reference target that matched no loaded item.
    Unknown,
    /// An integration command.
    Command,
    /// A docker image.
    Image,
}

/// A graph node.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub kind: NodeKind,
    /// Declared type for items; the expected type for unknown nodes.
    pub content_type: Option<ContentType>,
    pub object_id: String,
    pub name: String,
    pub display_name: String,
    pub path: Option<PathBuf>,
    pub pack: Option<String>,
    pub marketplaces: Vec<Marketplace>,
    pub deprecated: bool,
    pub pack_managed: bool,
    pub pack_autonomous: bool,
    /// Declared `supportedModules` of the item, else of its pack.
    pub supported_modules: Option<Vec<String>>,
    /// Scalar attributes used by [`ContentGraph::search`].
    pub attrs: Map<String, Value>,
}

impl GraphNode {
    fn synthetic(kind: NodeKind, content_type: Option<ContentType>, name: &str) -> Self {
        Self {
            kind,
            content_type,
            object_id: name.to_string(),
            name: name.to_string(),
            display_name: name.to_string(),
            path: None,
            pack: None,
            marketplaces: Vec::new(),
            deprecated: false,
            pack_managed: false,
            pack_autonomous: false,
            supported_modules: None,
            attrs: Map::new(),
        }
    }

    fn from_artifact(item: &Artifact) -> Self {
        let mut attrs = Map::new();
        if let Some(object) = item.data.as_object() {
            for (key, value) in object {
                if value.is_string() || value.is_boolean() || value.is_number() {
                    attrs.insert(key.clone(), value.clone());
                }
            }
        }
        attrs.insert("object_id".into(), Value::String(item.object_id()));
        attrs.insert("display_name".into(), Value::String(item.display_name()));
        if let Some(pack) = item.pack_name() {
            attrs.insert("pack".into(), Value::String(pack.to_string()));
        }

        let metadata = item.pack_metadata();
        Self {
            kind: NodeKind::Item,
            content_type: Some(item.content_type),
            object_id: item.object_id(),
            name: item.name(),
            display_name: item.display_name(),
            path: Some(item.path.clone()),
            pack: item.pack_name().map(str::to_string),
            marketplaces: item.marketplaces(),
            deprecated: item.deprecated(),
            pack_managed: metadata.is_some_and(|m| m.managed),
            pack_autonomous: metadata.is_some_and(|m| m.is_autonomous()),
            supported_modules: item.declared_modules().or_else(|| {
                metadata
                    .and_then(|m| m.supported_modules.clone())
                    .filter(|modules| !modules.is_empty())
            }),
            attrs,
        }
    }

    /// Deterministic ordering key.
    pub fn sort_key(&self) -> (Option<ContentType>, &str, Option<&Path>) {
        (self.content_type, self.object_id.as_str(), self.path.as_deref())
    }

    pub fn is_item(&self) -> bool {
        self.kind == NodeKind::Item
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NodeKind::Command => write!(f, "command '{}'", self.object_id),
            NodeKind::Image => write!(f, "image '{}'", self.object_id),
            _ => f.write_str(&self.object_id),
        }
    }
}

/// Relation carried by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    UsesCommand,
    UsesScript,
    UsesSubplaybook,
    InPack,
    TestedBy,
    HasImage,
    HasCommand,
}

impl EdgeKind {
    pub fn is_usage(self) -> bool {
        matches!(
            self,
            EdgeKind::UsesCommand | EdgeKind::UsesScript | EdgeKind::UsesSubplaybook
        )
    }
}

/// An edge label with the document field that declared it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub kind: EdgeKind,
    pub field: String,
}

/// Cross-artifact dependency structure.
#[derive(Debug, Default)]
pub struct ContentGraph {
    graph: DiGraph<GraphNode, GraphEdge>,
    by_path: HashMap<PathBuf, NodeIndex>,
    by_id: HashMap<(ContentType, String), Vec<NodeIndex>>,
    by_name: HashMap<(ContentType, String), Vec<NodeIndex>>,
    commands: HashMap<String, NodeIndex>,
    images: HashMap<String, NodeIndex>,
    packs: HashMap<String, NodeIndex>,
    unknown: HashMap<(ContentType, String), NodeIndex>,
}

impl ContentGraph {
    /// Build the graph from every artifact of the run.
    pub fn build(items: &[Artifact]) -> Self {
        let mut graph = ContentGraph::default();

        for item in items {
            if item.content_type == ContentType::ReleaseNote {
                continue;
            }
            let index = graph.graph.add_node(GraphNode::from_artifact(item));
            graph.by_path.insert(item.path.clone(), index);
            graph
                .by_id
                .entry((item.content_type, item.object_id()))
                .or_default()
                .push(index);
            graph
                .by_name
                .entry((item.content_type, item.name()))
                .or_default()
                .push(index);
            if item.content_type == ContentType::Pack {
                graph.packs.insert(item.object_id(), index);
            }
        }

        for item in items {
            if let Some(&from) = graph.by_path.get(&item.path) {
                graph.add_item_edges(from, item);
            }
        }

        debug!(
            "Built content graph with {} nodes and {} edges",
            graph.graph.node_count(),
            graph.graph.edge_count()
        );
        graph
    }

    fn add_item_edges(&mut self, from: NodeIndex, item: &Artifact) {
        if item.content_type != ContentType::Pack {
            if let Some(pack) = item.pack_name() {
                if let Some(&pack_index) = self.packs.get(pack) {
                    self.add_edge(from, pack_index, EdgeKind::InPack, "pack");
                }
            }
        }

        if item.content_type == ContentType::Integration {
            for name in integration::command_names(item) {
                let command = self.command_node(&name);
                self.add_edge(from, command, EdgeKind::HasCommand, "script.commands");
            }
        }

        if let Some(image) = integration::docker_image(item) {
            let image_index = self.image_node(image);
            self.add_edge(from, image_index, EdgeKind::HasImage, "dockerimage");
        }

        if item.content_type.is_playbook() {
            for reference in playbook::task_references(&item.data) {
                let (kind, target) = match reference.kind {
                    ReferenceKind::Command => {
                        (EdgeKind::UsesCommand, self.command_node(&reference.target))
                    }
                    ReferenceKind::Script => (
                        EdgeKind::UsesScript,
                        self.resolve_or_unknown(&[ContentType::Script], &reference.target),
                    ),
                    ReferenceKind::Playbook => (
                        EdgeKind::UsesSubplaybook,
                        self.resolve_or_unknown(
                            &[ContentType::Playbook, ContentType::TestPlaybook],
                            &reference.target,
                        ),
                    ),
                };
                let field = format!("tasks.{}.{}", reference.task_key, reference.field);
                self.add_edge(from, target, kind, &field);
            }
        }

        for test in tests_of(item) {
            let target = self.resolve_or_unknown(&[ContentType::TestPlaybook], &test);
            self.add_edge(from, target, EdgeKind::TestedBy, "tests");
        }
    }

    fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, kind: EdgeKind, field: &str) {
        self.graph.add_edge(
            from,
            to,
            GraphEdge {
                kind,
                field: field.to_string(),
            },
        );
    }

    fn command_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.commands.get(name) {
            return index;
        }
        let index = self
            .graph
            .add_node(GraphNode::synthetic(NodeKind::Command, None, name));
        self.commands.insert(name.to_string(), index);
        index
    }

    fn image_node(&mut self, image: &str) -> NodeIndex {
        if let Some(&index) = self.images.get(image) {
            return index;
        }
        let index = self
            .graph
            .add_node(GraphNode::synthetic(NodeKind::Image, None, image));
        self.images.insert(image.to_string(), index);
        index
    }

    /// Resolve a symbolic reference by id, then by name; unknown targets get a tagged node.
    fn resolve_or_unknown(&mut self, types: &[ContentType], target: &str) -> NodeIndex {
        for content_type in types {
            let key = (*content_type, target.to_string());
            if let Some(found) = self.by_id.get(&key).or_else(|| self.by_name.get(&key)) {
                if let Some(&first) = found.first() {
                    return first;
                }
            }
        }
        let expected = types.first().copied().unwrap_or(ContentType::Script);
        let key = (expected, target.to_string());
        if let Some(&index) = self.unknown.get(&key) {
            return index;
        }
        let index = self.graph.add_node(GraphNode::synthetic(
            NodeKind::Unknown,
            Some(expected),
            target,
        ));
        self.unknown.insert(key, index);
        index
    }

    pub fn node(&self, index: NodeIndex) -> &GraphNode {
        &self.graph[index]
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The node for the artifact at `path`.
    pub fn node_for_path(&self, path: &Path) -> Option<&GraphNode> {
        self.by_path.get(path).map(|&i| &self.graph[i])
    }

    /// Resolve an item by type and object id.
    pub fn resolve(&self, content_type: ContentType, object_id: &str) -> Option<&GraphNode> {
        self.by_id
            .get(&(content_type, object_id.to_string()))
            .and_then(|found| found.first())
            .map(|&i| &self.graph[i])
    }

    /// Item nodes of `content_type` whose attributes equal every given pair.
    pub fn search(&self, content_type: ContentType, attrs: &[(&str, Value)]) -> Vec<&GraphNode> {
        let mut found: Vec<&GraphNode> = self
            .graph
            .node_weights()
            .filter(|node| node.is_item() && node.content_type == Some(content_type))
            .filter(|node| {
                attrs
                    .iter()
                    .all(|(key, value)| node.attrs.get(*key) == Some(value))
            })
            .collect();
        found.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        found
    }

    /// Outgoing edges of `index`, in insertion order.
    pub(crate) fn outgoing(&self, index: NodeIndex) -> Vec<(NodeIndex, &GraphEdge)> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|e| (e.id(), e.target(), e.weight()))
            .collect();
        edges.sort_by_key(|(id, _, _)| *id);
        edges.into_iter().map(|(_, t, w)| (t, w)).collect()
    }

    /// Items that provide a command node.
    pub(crate) fn command_providers(&self, command: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .edges_directed(command, Direction::Incoming)
            .filter(|e| e.weight().kind == EdgeKind::HasCommand)
            .map(|e| e.source())
            .collect()
    }

    pub(crate) fn item_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .node_indices()
            .filter(|&i| self.graph[i].is_item())
    }

    pub(crate) fn index_for_path(&self, path: &Path) -> Option<NodeIndex> {
        self.by_path.get(path).copied()
    }
}

/// Test playbook names listed under `tests:`.
fn tests_of(item: &Artifact) -> Vec<String> {
    if !matches!(
        item.content_type,
        ContentType::Integration | ContentType::Script | ContentType::Playbook
    ) {
        return Vec::new();
    }
    item.data
        .get("tests")
        .and_then(Value::as_array)
        .map(|tests| {
            tests
                .iter()
                .filter_map(Value::as_str)
                .filter(|t| !t.to_ascii_lowercase().starts_with("no test"))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::content::artifact::test_support::artifact_in_pack;
    use crate::content::{Artifact, ContentType, PackMetadata};
    use serde_json::{json, Value};

    pub fn pack(name: &str, metadata: Value) -> PackMetadata {
        let mut metadata = PackMetadata::from_value(&metadata);
        metadata.name = name.to_string();
        metadata
    }

    /// Artifact placed in a named pack directory.
    pub fn item(pack_name: &str, meta: &PackMetadata, ct: ContentType, rel: &str, data: Value) -> Artifact {
        let mut item = artifact_in_pack(ct, rel, data, meta.clone());
        let pack_path = std::path::PathBuf::from("/content/Packs").join(pack_name);
        item.path = if ct == ContentType::Pack {
            pack_path.join("pack_metadata.json")
        } else {
            pack_path.join(rel)
        };
        if let Some(pack) = item.pack.as_mut() {
            pack.name = pack_name.to_string();
            pack.path = pack_path;
        }
        item
    }

    pub fn pack_item(pack_name: &str, meta: &PackMetadata) -> Artifact {
        item(pack_name, meta, ContentType::Pack, "", json!({}))
    }

    pub fn playbook_using(pack_name: &str, meta: &PackMetadata, id: &str, script: &str) -> Artifact {
        item(
            pack_name,
            meta,
            ContentType::Playbook,
            &format!("Playbooks/{}.yml", id),
            json!({
                "id": id,
                "name": id,
                "starttaskid": "0",
                "tasks": {
                    "0": {"id": "0", "type": "start", "nexttasks": {"#none#": ["1"]}},
                    "1": {"id": "1", "type": "regular", "task": {"scriptName": script}}
                }
            }),
        )
    }

    pub fn script(pack_name: &str, meta: &PackMetadata, id: &str, extra: Value) -> Artifact {
        let mut data = json!({"commonfields": {"id": id}, "name": id, "script": "", "type": "python"});
        if let (Some(target), Some(extra)) = (data.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                target.insert(k.clone(), v.clone());
            }
        }
        item(pack_name, meta, ContentType::Script, &format!("Scripts/{}/{}.yml", id, id), data)
    }
}
