use smallvec::SmallVec;

use crate::config::{validation::validate_toolset, ConfigError, ToolsetConfig};

/// Index of a node inside a [`ToolSchema`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

/// One valid tag: the synthetic root, a tool, or a parameter.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    name: String,
    allows_text_content: bool,
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 4]>,
}

impl SchemaNode {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn allows_text_content(&self) -> bool {
        self.allows_text_content
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// The two-level tag schema: tool tags under a synthetic root, parameter
/// tags under each tool.
///
/// Stored as a flat arena so parent references are plain indices instead of
/// cyclic ownership. The tree has depth exactly three and is resolved once
/// at construction; parsing only reads it.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    nodes: Vec<SchemaNode>,
}

impl ToolSchema {
    /// The synthetic node above all tool tags. Prose is collected here.
    pub const ROOT: NodeId = NodeId(0);

    /// Build the schema tree from a toolset, validating it first.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when the toolset violates a
    /// naming or uniqueness rule.
    pub fn new(toolset: &ToolsetConfig) -> Result<Self, ConfigError> {
        validate_toolset(toolset)?;

        let mut nodes = vec![SchemaNode {
            name: String::new(),
            allows_text_content: true,
            parent: None,
            children: SmallVec::new(),
        }];

        for tool in &toolset.tools {
            let tool_id = NodeId(nodes.len());
            nodes.push(SchemaNode {
                name: tool.name.clone(),
                allows_text_content: false,
                parent: Some(Self::ROOT),
                children: SmallVec::new(),
            });
            nodes[Self::ROOT.0].children.push(tool_id);

            for param in &tool.params {
                let param_id = NodeId(nodes.len());
                nodes.push(SchemaNode {
                    name: param.clone(),
                    allows_text_content: true,
                    parent: Some(tool_id),
                    children: SmallVec::new(),
                });
                nodes[tool_id.0].children.push(param_id);
            }
        }

        Ok(Self { nodes })
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    /// Exact-name lookup among `id`'s children.
    #[must_use]
    pub fn child_named(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .find(|child| self.nodes[child.0].name == name)
    }

    /// Whether any child of `id` has a name starting with `prefix`.
    ///
    /// Drives the early-bail check while an opening tag name is still being
    /// accumulated: once no child can match, the tag is known invalid
    /// without waiting for its terminator.
    #[must_use]
    pub fn has_child_with_prefix(&self, id: NodeId, prefix: &str) -> bool {
        self.nodes[id.0]
            .children
            .iter()
            .any(|child| self.nodes[child.0].name.starts_with(prefix))
    }

    #[must_use]
    pub fn allows_text(&self, id: NodeId) -> bool {
        self.nodes[id.0].allows_text_content
    }

    /// Whether `id` names a tool (a direct child of the root).
    #[must_use]
    pub fn is_tool(&self, id: NodeId) -> bool {
        self.nodes[id.0].parent == Some(Self::ROOT)
    }
}
