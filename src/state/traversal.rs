//! Traversal position for the preorder depth-first walk
//!
//! The frontier is a stack of sibling groups; the top group is the deepest
//! level currently being visited. Every group opened by a visited node has a
//! matching entry on the ancestor stack recording that node.
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A node as listed by the remote API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteNodeRef {
    pub id: String,
    pub name: String,
}

impl RemoteNodeRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Parent breadcrumb stored with every page
///
/// Nodes of the seed group have the root context, where both fields are null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentContext {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl ParentContext {
    /// The implicit parent of the seed group
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
        }
    }

    pub fn is_root(&self) -> bool {
        self.id.is_none()
    }
}

/// Unvisited siblings of one tree level, visited front to back
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrontierGroup(VecDeque<RemoteNodeRef>);

impl FrontierGroup {
    pub fn new(nodes: Vec<RemoteNodeRef>) -> Self {
        Self(nodes.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn front(&self) -> Option<&RemoteNodeRef> {
        self.0.front()
    }

    fn pop_front(&mut self) -> Option<RemoteNodeRef> {
        self.0.pop_front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemoteNodeRef> {
        self.0.iter()
    }
}

/// Frontier plus ancestor stack
///
/// Invariant: no group is empty and every group except the outermost seed
/// group has its own ancestor entry, so `ancestors.len() == frontier.len() - 1`
/// while the seed group is open. Once the seed group is exhausted, the group
/// opened by its last node becomes the outermost one and keeps its explicit
/// parent, giving `ancestors.len() == frontier.len()`. Both stacks are empty
/// together when the walk is finished.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraversalState {
    frontier: Vec<FrontierGroup>,
    ancestors: Vec<ParentContext>,
}

impl TraversalState {
    /// Creates the initial state from the root listing
    pub fn seeded(root_group: Vec<RemoteNodeRef>) -> Self {
        let mut state = Self::default();
        if !root_group.is_empty() {
            state.frontier.push(FrontierGroup::new(root_group));
        }
        state
    }

    /// Rebuilds a state from raw stacks, checking the pairing invariant
    pub fn from_parts(
        frontier: Vec<FrontierGroup>,
        ancestors: Vec<ParentContext>,
    ) -> Result<Self, String> {
        let state = Self {
            frontier,
            ancestors,
        };
        state.validate()?;
        Ok(state)
    }

    pub fn frontier(&self) -> &[FrontierGroup] {
        &self.frontier
    }

    pub fn ancestors(&self) -> &[ParentContext] {
        &self.ancestors
    }

    /// Returns true when nothing is left to visit
    pub fn is_empty(&self) -> bool {
        self.frontier.is_empty()
    }

    /// Number of open levels
    pub fn depth(&self) -> usize {
        self.frontier.len()
    }

    /// Total number of queued nodes across all levels
    pub fn remaining(&self) -> usize {
        self.frontier.iter().map(FrontierGroup::len).sum()
    }

    /// Parent of the top group, or the root context
    pub fn current_parent(&self) -> ParentContext {
        self.ancestors.last().cloned().unwrap_or_default()
    }

    /// Takes the next node to visit together with its parent context
    ///
    /// When the top group runs empty it is dropped from the frontier together
    /// with its ancestor entry.
    pub fn next_node(&mut self) -> Option<(RemoteNodeRef, ParentContext)> {
        let parent = self.current_parent();
        let group = self.frontier.last_mut()?;
        let node = group.pop_front()?;

        if group.is_empty() {
            self.frontier.pop();
            // The seed group has no ancestor entry; pop is a no-op there
            self.ancestors.pop();
        }

        Some((node, parent))
    }

    /// Opens a new level holding `children`, making it the top of the frontier
    ///
    /// An empty child list opens nothing.
    pub fn push_children(&mut self, parent: ParentContext, children: Vec<RemoteNodeRef>) {
        if children.is_empty() {
            return;
        }
        self.ancestors.push(parent);
        self.frontier.push(FrontierGroup::new(children));
    }

    /// Checks the stack invariants
    pub fn validate(&self) -> Result<(), String> {
        if let Some(index) = self.frontier.iter().position(FrontierGroup::is_empty) {
            return Err(format!("frontier group {} is empty", index));
        }

        let groups = self.frontier.len();
        let paired = if groups == 0 {
            self.ancestors.is_empty()
        } else {
            self.ancestors.len() == groups - 1 || self.ancestors.len() == groups
        };
        if !paired {
            return Err(format!(
                "ancestor stack has {} entries for {} frontier groups",
                self.ancestors.len(),
                groups
            ));
        }

        Ok(())
    }
}
