use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Index of a node inside its owning [`Course`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Type of a content object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Course,
    Chapter,
    Sequential,
    Vertical,
    Html,
    Problem,
    Video,
    Discussion,
    /// Any tag outside the known set
    Other(String),
}

impl NodeKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "course" => NodeKind::Course,
            "chapter" => NodeKind::Chapter,
            "sequential" => NodeKind::Sequential,
            "vertical" => NodeKind::Vertical,
            "html" => NodeKind::Html,
            "problem" => NodeKind::Problem,
            "video" => NodeKind::Video,
            "discussion" => NodeKind::Discussion,
            other => NodeKind::Other(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            NodeKind::Course => "course",
            NodeKind::Chapter => "chapter",
            NodeKind::Sequential => "sequential",
            NodeKind::Vertical => "vertical",
            NodeKind::Html => "html",
            NodeKind::Problem => "problem",
            NodeKind::Video => "video",
            NodeKind::Discussion => "discussion",
            NodeKind::Other(tag) => tag,
        }
    }

    /// Leaf kinds hold content, not content objects
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            NodeKind::Html | NodeKind::Problem | NodeKind::Video | NodeKind::Discussion
        )
    }

    /// Chapter, sequential and vertical
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            NodeKind::Chapter | NodeKind::Sequential | NodeKind::Vertical
        )
    }

    /// Whether `child` may appear directly under this kind
    pub fn allows_child(&self, child: &NodeKind) -> bool {
        if matches!(child, NodeKind::Other(_)) {
            return !self.is_leaf();
        }
        match self {
            NodeKind::Course => *child == NodeKind::Chapter,
            NodeKind::Chapter => *child == NodeKind::Sequential,
            NodeKind::Sequential => *child == NodeKind::Vertical,
            NodeKind::Vertical => child.is_leaf(),
            NodeKind::Other(_) => *child != NodeKind::Course,
            _ => false,
        }
    }
}

/// A typed node of the course tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub url_name: Option<String>,
    /// Parent back-reference; the course arena owns every node
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Attributes exactly as written in the document (without url_name)
    pub attributes: BTreeMap<String, String>,
    /// Inline attributes plus whatever policy data supplied
    pub resolved: BTreeMap<String, Value>,
    /// Flattened text and attribute values of leaf markup
    pub content: Option<String>,
    /// File the node was read from
    pub file: PathBuf,
}

impl ContentNode {
    /// Create a detached node. `url_name` is pulled out of `attributes`.
    pub fn new(tag: &str, mut attributes: BTreeMap<String, String>, file: impl Into<PathBuf>) -> Self {
        let url_name = attributes.remove("url_name");
        let resolved = attributes
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Self {
            id: NodeId(0),
            kind: NodeKind::from_tag(tag),
            url_name,
            parent: None,
            children: Vec::new(),
            attributes,
            resolved,
            content: None,
            file: file.into(),
        }
    }

    pub fn tag(&self) -> &str {
        self.kind.tag()
    }

    /// Resolved attribute rendered as a string (JSON strings unquoted).
    /// A JSON `null` counts as unset.
    pub fn attr(&self, key: &str) -> Option<String> {
        match self.resolved.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Resolved attribute interpreted as a boolean flag
    pub fn flag(&self, key: &str) -> bool {
        match self.resolved.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Short human label, e.g. `chapter 'week1'`
    pub fn label(&self) -> String {
        match &self.url_name {
            Some(name) => format!("{} '{}'", self.tag(), name),
            None => format!("{} (no url_name)", self.tag()),
        }
    }
}

/// A loaded course: an arena of nodes rooted at a single course node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    directory: PathBuf,
    nodes: Vec<ContentNode>,
    files: BTreeSet<PathBuf>,
}

impl Course {
    /// Start a course from its root node
    pub fn new(directory: impl Into<PathBuf>, mut root: ContentNode) -> Self {
        root.id = NodeId(0);
        root.parent = None;
        root.children.clear();
        let mut files = BTreeSet::new();
        files.insert(root.file.clone());
        Self {
            directory: directory.into(),
            nodes: vec![root],
            files,
        }
    }

    /// Append `node` as the last child of `parent`
    pub fn push_child(&mut self, parent: NodeId, mut node: ContentNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.id = id;
        node.parent = Some(parent);
        node.children.clear();
        self.files.insert(node.file.clone());
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn root(&self) -> &ContentNode {
        &self.nodes[0]
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &ContentNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut ContentNode {
        &mut self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&ContentNode> {
        self.nodes.get(id.0)
    }

    pub fn parent(&self, id: NodeId) -> Option<&ContentNode> {
        self.node(id).parent.map(|p| self.node(p))
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &ContentNode> + '_ {
        self.node(id).children.iter().map(move |c| self.node(*c))
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = &ContentNode> + '_ {
        std::iter::successors(self.parent(id), move |n| self.parent(n.id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Files that contributed nodes or content
    pub fn files(&self) -> &BTreeSet<PathBuf> {
        &self.files
    }

    pub fn record_file(&mut self, file: impl Into<PathBuf>) {
        self.files.insert(file.into());
    }
}
