//! The path-addressed node arena.
//!
//! [`NodeTree`] owns every node in a flat slot vector addressed by
//! [`NodeId`], plus a `PathKey -> NodeId` index for O(1) lookup. The index
//! and the folder child lists are only touched by `attach` and `detach`, so
//! they cannot drift apart.
//!
//! # Invariants
//!
//! 1. **Index agreement**: `find_by_path(p) == Some(id)` iff slot `id` is
//!    live and its path is `p`.
//! 2. **Ancestor completeness**: every proper prefix of a live node's path
//!    resolves to a live folder.
//! 3. **Parent agreement**: a live node appears exactly once in its parent's
//!    child list, and child lists hold only live ids.
//! 4. **Path uniqueness**: at most one live node per path.
//! 5. **Stable ids**: slots are tombstoned on removal and never reused.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Variant clash | Path already holds another variant | `TreeError::DuplicatePath`, tree unchanged |
//! | Non-folder ancestor | A prefix of the path is a leaf | `TreeError::DuplicatePath` naming the prefix |
//! | Stale id | Node was removed | Lookups return `None` |

use std::collections::HashMap;

use tweakui_core::geometry::{Rect, Size};
use tweakui_core::path::PathKey;

use crate::error::{TreeError, TreeResult};
use crate::layout::LayoutMetrics;
use crate::node::{Node, NodeId, NodeKind, NodeVariant};
use crate::value::NodeValue;

/// Outcome of [`NodeTree::get_or_create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declared {
    /// The path already held a node of the requested variant.
    Existing(NodeId),
    /// A node was created by this call.
    Created(NodeId),
}

impl Declared {
    #[must_use]
    pub const fn id(self) -> NodeId {
        match self {
            Declared::Existing(id) | Declared::Created(id) => id,
        }
    }

    #[must_use]
    pub const fn is_created(self) -> bool {
        matches!(self, Declared::Created(_))
    }
}

/// Arena of nodes rooted at a permanent root folder.
#[derive(Debug, Clone)]
pub struct NodeTree {
    slots: Vec<Option<Node>>,
    index: HashMap<PathKey, NodeId>,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    /// Create a tree holding only the root folder.
    #[must_use]
    pub fn new() -> Self {
        let root = Node::new(NodeId::ROOT, PathKey::root(), None, NodeKind::folder());
        let mut index = HashMap::new();
        index.insert(PathKey::root(), NodeId::ROOT);
        Self {
            slots: vec![Some(root)],
            index,
        }
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Exact-match lookup. The root path resolves to the root folder.
    #[must_use]
    pub fn find_by_path(&self, path: &PathKey) -> Option<NodeId> {
        self.index.get(path).copied()
    }

    /// Node at `path`, if any.
    #[must_use]
    pub fn get(&self, path: &PathKey) -> Option<&Node> {
        self.find_by_path(path).and_then(|id| self.node(id))
    }

    /// Number of live nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when only the root exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }

    /// Live nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.slots.iter().flatten()
    }

    /// Child ids of a folder in declaration order. Empty for leaves and
    /// unknown ids.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or(&[])
    }

    /// Owned copy of a folder's child list, safe to hold across mutation.
    #[must_use]
    pub fn children_snapshot(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).to_vec()
    }

    // ─── Declaration ─────────────────────────────────────────────────────────

    /// Resolve the folder that owns `path`, creating missing ancestors.
    ///
    /// Returns the root for root-level paths. Ancestors are created
    /// shortest first, so every new folder lands in an existing parent.
    pub fn get_or_create_parent_folder(&mut self, path: &PathKey) -> TreeResult<NodeId> {
        let mut current = NodeId::ROOT;
        for ancestor in path.ancestors() {
            current = match self.index.get(&ancestor).copied() {
                Some(id) => {
                    let variant = self.variant_of(id)?;
                    if variant != NodeVariant::Folder {
                        return Err(TreeError::DuplicatePath {
                            path: ancestor,
                            existing: variant,
                            requested: NodeVariant::Folder,
                        });
                    }
                    id
                }
                None => self.attach(current, ancestor, NodeKind::folder()),
            };
        }
        Ok(current)
    }

    /// Insert `kind` at `path`, creating missing ancestor folders.
    ///
    /// Re-inserting the same variant returns the existing id and drops
    /// `kind`. A different variant fails with `DuplicatePath`.
    pub fn insert_at_path(&mut self, path: &PathKey, kind: NodeKind) -> TreeResult<NodeId> {
        let variant = kind.variant();
        self.get_or_create(path, variant, || kind).map(Declared::id)
    }

    /// Find `path` or create it with `make`, in one step.
    ///
    /// `variant` must be the variant `make` produces; it is checked against
    /// an existing node without constructing the payload. Failures leave the
    /// tree unchanged.
    pub fn get_or_create(
        &mut self,
        path: &PathKey,
        variant: NodeVariant,
        make: impl FnOnce() -> NodeKind,
    ) -> TreeResult<Declared> {
        if let Some(id) = self.find_by_path(path) {
            let existing = self.variant_of(id)?;
            if existing != variant {
                return Err(TreeError::DuplicatePath {
                    path: path.clone(),
                    existing,
                    requested: variant,
                });
            }
            return Ok(Declared::Existing(id));
        }
        self.check_ancestors(path)?;
        let parent = self.get_or_create_parent_folder(path)?;
        let kind = make();
        debug_assert_eq!(kind.variant(), variant);
        Ok(Declared::Created(self.attach(parent, path.clone(), kind)))
    }

    /// Remove the transient children of `folder` and their subtrees.
    /// Returns the number of nodes removed.
    pub fn remove_transient_children(&mut self, folder: NodeId) -> usize {
        let transient: Vec<NodeId> = self
            .children(folder)
            .iter()
            .copied()
            .filter(|&id| self.node(id).is_some_and(Node::is_transient))
            .collect();
        transient.into_iter().map(|id| self.detach(id)).sum()
    }

    // ─── Traversal ───────────────────────────────────────────────────────────

    /// Pre-order walk from `start`, handing `f` mutable access to the tree.
    ///
    /// A node's child list is snapshotted before `f` runs on it. Children
    /// added during the walk are not visited; children removed during the
    /// walk are skipped. No live child is visited twice.
    pub fn visit_depth_first_mut(&mut self, start: NodeId, mut f: impl FnMut(&mut NodeTree, NodeId)) {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if self.node(id).is_none() {
                continue;
            }
            let children = self.children_snapshot(id);
            f(self, id);
            stack.extend(children.into_iter().rev());
        }
    }

    /// Clear every button pulse reachable from the root. Returns how many
    /// were set.
    pub fn release_buttons(&mut self) -> usize {
        let mut released = 0;
        self.visit_depth_first_mut(NodeId::ROOT, |tree, id| {
            if let Some(NodeKind::Button(button)) = tree.node_mut(id).map(Node::kind_mut)
                && button.pressed
            {
                button.pressed = false;
                released += 1;
            }
        });
        released
    }

    /// Assign each child of `folder` a full-width row in window-local
    /// content space, in declaration order, and return the content size.
    ///
    /// Rows are at least `min_width` wide and as wide as the widest child.
    pub fn layout_folder(
        &mut self,
        folder: NodeId,
        min_width: f32,
        metrics: &LayoutMetrics,
    ) -> Size {
        let children = self.children_snapshot(folder);
        let width = children
            .iter()
            .filter_map(|&id| self.node(id))
            .map(|node| node.compute_layout(metrics).width)
            .fold(min_width, f32::max);

        let mut y = 0.0;
        for id in children {
            if let Some(node) = self.node_mut(id) {
                let height = node.compute_layout(metrics).height;
                node.set_layout(Rect::new(0.0, y, width, height));
                y += height;
            }
        }
        Size::new(width, y)
    }

    /// Every persisted value, keyed by path, in creation order.
    pub fn persisted_values(&self) -> impl Iterator<Item = (&PathKey, NodeValue)> {
        self.iter()
            .filter(|node| !node.is_transient())
            .filter_map(|node| node.value().map(|value| (node.path(), value)))
    }

    /// Check every structural invariant. Intended for tests.
    pub fn validate(&self) -> TreeResult<()> {
        let mut live = 0;
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(node) = slot else { continue };
            live += 1;
            let id = NodeId::from_index(index);
            if node.id() != id {
                return Err(inconsistent(format!("slot {index} holds node {}", node.id())));
            }
            if self.find_by_path(node.path()) != Some(id) {
                return Err(inconsistent(format!("{} not indexed as {id}", node.path())));
            }
            for ancestor in node.path().ancestors() {
                match self.get(&ancestor) {
                    Some(folder) if folder.is_folder() => {}
                    _ => return Err(inconsistent(format!("{} missing ancestor {ancestor}", node.path()))),
                }
            }
            match node.parent() {
                None if id != NodeId::ROOT => {
                    return Err(inconsistent(format!("{id} has no parent")));
                }
                None => {}
                Some(parent) => {
                    let listed = self.children(parent).iter().filter(|&&c| c == id).count();
                    if listed != 1 {
                        return Err(inconsistent(format!(
                            "{id} listed {listed} times under {parent}"
                        )));
                    }
                }
            }
            for &child in node.children() {
                match self.node(child) {
                    Some(c) if c.parent() == Some(id) => {}
                    _ => return Err(inconsistent(format!("{id} lists stale child {child}"))),
                }
            }
        }
        if live != self.index.len() {
            return Err(inconsistent(format!(
                "{live} live slots but {} index entries",
                self.index.len()
            )));
        }
        Ok(())
    }

    // ─── Internals ───────────────────────────────────────────────────────────

    fn variant_of(&self, id: NodeId) -> TreeResult<NodeVariant> {
        self.node(id)
            .map(Node::variant)
            .ok_or(TreeError::UnknownNode(id))
    }

    /// Fail before mutating if any existing ancestor is not a folder.
    fn check_ancestors(&self, path: &PathKey) -> TreeResult<()> {
        for ancestor in path.ancestors() {
            if let Some(id) = self.find_by_path(&ancestor) {
                let variant = self.variant_of(id)?;
                if variant != NodeVariant::Folder {
                    return Err(TreeError::DuplicatePath {
                        path: ancestor,
                        existing: variant,
                        requested: NodeVariant::Folder,
                    });
                }
            }
        }
        Ok(())
    }

    fn attach(&mut self, parent: NodeId, path: PathKey, kind: NodeKind) -> NodeId {
        let id = NodeId::from_index(self.slots.len());
        tweakui_core::trace!(%path, variant = %kind.variant(), %id, "node created");
        self.index.insert(path.clone(), id);
        self.slots.push(Some(Node::new(id, path, Some(parent), kind)));
        if let Some(NodeKind::Folder(folder)) = self.node_mut(parent).map(Node::kind_mut) {
            folder.children.push(id);
        }
        id
    }

    fn detach(&mut self, id: NodeId) -> usize {
        let children = self.children_snapshot(id);
        let mut removed: usize = children.into_iter().map(|child| self.detach(child)).sum();

        let Some(node) = self.slots.get_mut(id.index()).and_then(Option::take) else {
            return removed;
        };
        tweakui_core::trace!(path = %node.path(), %id, "node removed");
        self.index.remove(node.path());
        if let Some(parent) = node.parent()
            && let Some(NodeKind::Folder(folder)) = self.node_mut(parent).map(Node::kind_mut)
        {
            folder.children.retain(|&child| child != id);
        }
        removed += 1;
        removed
    }
}

fn inconsistent(msg: String) -> TreeError {
    TreeError::Inconsistent(msg)
}
