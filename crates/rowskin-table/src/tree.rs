//! Scene tree holding table rows, cells, and the nodes skins add to them.
//!
//! Rows lay out their own children; expansion content is mirrored into a
//! Taffy tree so its preferred height and internal layout come from flexbox.

use indexmap::IndexMap;
use rowskin_core::Color;
use rowskin_core::geometry::Rect;
use rowskin_core::math::Vec2;
use rowskin_core::profiling::profile_function;
use taffy::{AvailableSpace, Style, TaffyTree};

use crate::column::ColumnId;
use crate::invalidation::Invalidation;

/// Node identifier in the scene tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Stable recycling slot of a cell within its row.
///
/// A slot keeps its number for as long as the row exists, no matter which
/// item the row is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellSlot(pub u32);

/// What a cell node shows and where its value comes from.
#[derive(Debug, Clone, PartialEq)]
pub struct CellInfo {
    pub column: ColumnId,
    /// Row index the cell last reported; `None` for an unbound row.
    pub index: Option<usize>,
    pub slot: CellSlot,
}

/// Filled polygon drawn over a dirty cell.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerShape {
    pub points: [Vec2; 3],
    pub fill: Color,
}

impl MarkerShape {
    /// Right triangle in the top-left corner: (0,0), (0,size), (size,0).
    pub fn corner_flag(size: f32, fill: Color) -> Self {
        Self {
            points: [Vec2::ZERO, Vec2::new(0.0, size), Vec2::new(size, 0.0)],
            fill,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Table body hosting the realized rows.
    Body,
    Row,
    Cell(CellInfo),
    Marker(MarkerShape),
    /// Root of a row's expansion content.
    Content,
    /// Container inside expansion content.
    Block,
}

impl NodeKind {
    pub fn is_cell(&self) -> bool {
        matches!(self, NodeKind::Cell(_))
    }

    /// Content subtrees hand their internal layout to Taffy.
    fn mirrors_layout(&self) -> bool {
        matches!(self, NodeKind::Content | NodeKind::Block)
    }
}

/// A node in the scene tree.
#[derive(Debug)]
pub struct SceneNode {
    pub kind: NodeKind,
    pub taffy_node: Option<taffy::NodeId>,
    /// Position relative to the parent, and size, from the last layout.
    pub layout: Rect<f32>,
    pub invalidation: Invalidation,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A child-list mutation, reported after it has been fully applied.
#[derive(Debug)]
pub struct ChildListChange<'a> {
    pub parent: NodeId,
    pub added: &'a [NodeId],
    pub removed: &'a [NodeId],
    /// The parent's children after the change.
    pub children: &'a [NodeId],
}

pub type ChildListObserver = Box<dyn FnMut(&ChildListChange<'_>)>;

/// Arena of scene nodes.
///
/// A node has at most one parent. Attaching a node that already has one
/// detaches it from the old parent first.
pub struct SceneTree {
    taffy: TaffyTree<()>,
    nodes: IndexMap<NodeId, SceneNode>,
    next_id: usize,
    observers: Vec<ChildListObserver>,
}

impl SceneTree {
    pub fn new() -> Self {
        Self {
            taffy: TaffyTree::new(),
            nodes: IndexMap::new(),
            next_id: 0,
            observers: Vec::new(),
        }
    }

    /// Add a detached node and return its id.
    pub fn add_node(&mut self, kind: NodeKind, style: Style) -> NodeId {
        let node_id = NodeId(self.next_id);
        self.next_id += 1;

        let taffy_node = self.taffy.new_leaf(style).ok();
        if taffy_node.is_none() {
            tracing::warn!("Taffy rejected leaf for {:?}; node will measure as zero", node_id);
        }

        self.nodes.insert(
            node_id,
            SceneNode {
                kind,
                taffy_node,
                layout: Rect::ZERO,
                invalidation: Invalidation::LAYOUT,
                parent: None,
                children: Vec::new(),
            },
        );
        node_id
    }

    /// Register an observer for child-list changes on any node.
    pub fn observe_children(&mut self, observer: impl FnMut(&ChildListChange<'_>) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn get(&self, node: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&node)
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.get(&node).map(|n| &n.kind)
    }

    /// Cell info of `node`, or `None` if it is not a cell.
    pub fn cell(&self, node: NodeId) -> Option<&CellInfo> {
        match self.kind(node) {
            Some(NodeKind::Cell(info)) => Some(info),
            _ => None,
        }
    }

    pub fn set_cell_index(&mut self, node: NodeId, index: Option<usize>) {
        if let Some(SceneNode {
            kind: NodeKind::Cell(info),
            ..
        }) = self.nodes.get_mut(&node)
        {
            info.index = index;
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(&node)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains_child(&self, parent: NodeId, child: NodeId) -> bool {
        self.parent(child) == Some(parent)
    }

    pub fn layout(&self, node: NodeId) -> Option<Rect<f32>> {
        self.nodes.get(&node).map(|n| n.layout)
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.apply_child_batch(parent, &[], &[child])
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.apply_child_batch(parent, &[child], &[])
    }

    /// Apply removals then additions to `parent` as one mutation.
    ///
    /// Removals of non-children and additions of current children are
    /// ignored. Observers hear about the parent once, after the whole batch
    /// is in place. Returns true if the child list changed.
    pub fn apply_child_batch(
        &mut self,
        parent: NodeId,
        removals: &[NodeId],
        additions: &[NodeId],
    ) -> bool {
        profile_function!();

        let Some(parent_node) = self.nodes.get(&parent) else {
            return false;
        };
        let parent_mirrors = parent_node.kind.mirrors_layout();
        let parent_taffy = parent_node.taffy_node;

        let mut removed: Vec<NodeId> = Vec::with_capacity(removals.len());
        for &child in removals {
            if self.contains_child(parent, child) && !removed.contains(&child) {
                removed.push(child);
            }
        }

        let mut added: Vec<NodeId> = Vec::with_capacity(additions.len());
        for &child in additions {
            if child == parent || added.contains(&child) {
                continue;
            }
            match self.parent(child) {
                Some(current) if current == parent => {
                    if !removed.contains(&child) {
                        continue;
                    }
                }
                Some(current) => {
                    self.apply_child_batch(current, &[child], &[]);
                }
                None if !self.contains(child) => continue,
                None => {}
            }
            added.push(child);
        }

        if removed.is_empty() && added.is_empty() {
            return false;
        }

        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.retain(|c| !removed.contains(c));
            parent_node.children.extend_from_slice(&added);
            parent_node.invalidation |= Invalidation::CHILDREN;
        }

        for &child in &removed {
            if let Some(node) = self.nodes.get_mut(&child) {
                node.parent = None;
                if let (true, true, Some(p), Some(c)) = (
                    parent_mirrors,
                    node.kind.mirrors_layout(),
                    parent_taffy,
                    node.taffy_node,
                ) {
                    self.taffy.remove_child(p, c).ok();
                }
            }
        }
        for &child in &added {
            if let Some(node) = self.nodes.get_mut(&child) {
                node.parent = Some(parent);
                if let (true, true, Some(p), Some(c)) = (
                    parent_mirrors,
                    node.kind.mirrors_layout(),
                    parent_taffy,
                    node.taffy_node,
                ) {
                    self.taffy.add_child(p, c).ok();
                }
            }
        }

        let children = self
            .nodes
            .get(&parent)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[]);
        let change = ChildListChange {
            parent,
            added: &added,
            removed: &removed,
            children,
        };
        for observer in self.observers.iter_mut() {
            observer(&change);
        }

        true
    }

    /// Move a node within its parent, keeping its size.
    pub fn relocate(&mut self, node: NodeId, x: f32, y: f32) {
        if let Some(n) = self.nodes.get_mut(&node) {
            if n.layout.x != x || n.layout.y != y {
                n.layout = n.layout.relocated(x, y);
                n.invalidation |= Invalidation::GEOMETRY;
            }
        }
    }

    /// Give a node its final bounds and lay out its content subtree in them.
    pub fn resize_relocate(&mut self, node: NodeId, x: f32, y: f32, width: f32, height: f32) {
        let rect = Rect::new(x, y, width, height);
        let Some(n) = self.nodes.get_mut(&node) else {
            return;
        };
        if n.layout != rect {
            n.layout = rect;
            n.invalidation |= Invalidation::GEOMETRY;
        }

        if !n.kind.mirrors_layout() || n.children.is_empty() {
            return;
        }
        let Some(taffy_node) = n.taffy_node else {
            return;
        };
        let available = taffy::Size {
            width: AvailableSpace::Definite(width),
            height: AvailableSpace::Definite(height),
        };
        if self.taffy.compute_layout(taffy_node, available).is_ok() {
            self.sync_subtree_layout(node);
        }
    }

    /// Copy Taffy's computed layouts into the descendants of `root`.
    fn sync_subtree_layout(&mut self, root: NodeId) {
        let mut stack: Vec<NodeId> = self.children(root).to_vec();
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            let Some(taffy_node) = node.taffy_node.filter(|_| node.kind.mirrors_layout()) else {
                continue;
            };
            let Ok(layout) = self.taffy.layout(taffy_node) else {
                continue;
            };
            let rect = Rect::new(
                layout.location.x,
                layout.location.y,
                layout.size.width,
                layout.size.height,
            );
            stack.extend_from_slice(&node.children);

            if let Some(node) = self.nodes.get_mut(&id) {
                if node.layout != rect {
                    node.layout = rect;
                    node.invalidation |= Invalidation::GEOMETRY;
                }
            }
        }
    }

    /// Preferred height of `node` when given `width`.
    pub fn preferred_height(&mut self, node: NodeId, width: f32) -> f32 {
        profile_function!();

        let Some(taffy_node) = self.nodes.get(&node).and_then(|n| n.taffy_node) else {
            return 0.0;
        };
        let available = taffy::Size {
            width: AvailableSpace::Definite(width),
            height: AvailableSpace::MaxContent,
        };
        if self.taffy.compute_layout(taffy_node, available).is_err() {
            return 0.0;
        }
        self.taffy
            .layout(taffy_node)
            .map(|l| l.size.height)
            .unwrap_or(0.0)
    }

    /// Drain every recorded invalidation.
    pub fn take_invalidations(&mut self) -> Vec<(NodeId, Invalidation)> {
        self.nodes
            .iter_mut()
            .filter(|(_, n)| !n.invalidation.is_empty())
            .map(|(&id, n)| (id, std::mem::take(&mut n.invalidation)))
            .collect()
    }

    /// Detach `node` and destroy it with all of its descendants.
    pub fn remove_subtree(&mut self, node: NodeId) {
        if let Some(parent) = self.parent(node) {
            self.remove_child(parent, node);
        }

        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(removed) = self.nodes.shift_remove(&id) {
                if let Some(taffy_node) = removed.taffy_node {
                    self.taffy.remove(taffy_node).ok();
                }
                stack.extend(removed.children);
            }
        }
    }
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn fixed_height(height: f32) -> Style {
        Style {
            size: taffy::Size {
                width: taffy::Dimension::Percent(1.0),
                height: taffy::Dimension::Length(height),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_reparent_detaches_from_old_parent() {
        let mut tree = SceneTree::new();
        let a = tree.add_node(NodeKind::Row, Style::default());
        let b = tree.add_node(NodeKind::Row, Style::default());
        let content = tree.add_node(NodeKind::Content, Style::default());

        tree.add_child(a, content);
        tree.add_child(b, content);

        assert!(tree.children(a).is_empty());
        assert_eq!(tree.children(b), &[content]);
        assert_eq!(tree.parent(content), Some(b));
    }

    #[test]
    fn test_batch_notifies_once_with_final_children() {
        let mut tree = SceneTree::new();
        let row = tree.add_node(NodeKind::Row, Style::default());
        let first = tree.add_node(NodeKind::Block, Style::default());
        let second = tree.add_node(NodeKind::Block, Style::default());
        let third = tree.add_node(NodeKind::Block, Style::default());
        tree.add_child(row, first);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        tree.observe_children(move |change| {
            log.borrow_mut().push(change.children.to_vec());
        });

        assert!(tree.apply_child_batch(row, &[first], &[second, third]));
        assert_eq!(*seen.borrow(), vec![vec![second, third]]);
    }

    #[test]
    fn test_noop_batch_reports_nothing() {
        let mut tree = SceneTree::new();
        let row = tree.add_node(NodeKind::Row, Style::default());
        let child = tree.add_node(NodeKind::Block, Style::default());
        let stranger = tree.add_node(NodeKind::Block, Style::default());
        tree.add_child(row, child);

        assert!(!tree.apply_child_batch(row, &[stranger], &[child]));
        assert_eq!(tree.children(row), &[child]);
    }

    #[test]
    fn test_preferred_height_sums_content_blocks() {
        let mut tree = SceneTree::new();
        let content = tree.add_node(
            NodeKind::Content,
            Style {
                flex_direction: taffy::FlexDirection::Column,
                size: taffy::Size {
                    width: taffy::Dimension::Percent(1.0),
                    height: taffy::Dimension::Auto,
                },
                ..Default::default()
            },
        );
        let top = tree.add_node(NodeKind::Block, fixed_height(15.0));
        let bottom = tree.add_node(NodeKind::Block, fixed_height(25.0));
        tree.apply_child_batch(content, &[], &[top, bottom]);

        assert_eq!(tree.preferred_height(content, 200.0), 40.0);

        tree.resize_relocate(content, 0.0, 24.0, 200.0, 40.0);
        assert_eq!(tree.layout(bottom), Some(Rect::new(0.0, 15.0, 200.0, 25.0)));
    }

    #[test]
    fn test_remove_subtree_drops_descendants() {
        let mut tree = SceneTree::new();
        let row = tree.add_node(NodeKind::Row, Style::default());
        let content = tree.add_node(NodeKind::Content, Style::default());
        let block = tree.add_node(NodeKind::Block, Style::default());
        tree.add_child(row, content);
        tree.add_child(content, block);

        tree.remove_subtree(content);

        assert!(tree.children(row).is_empty());
        assert!(!tree.contains(content));
        assert!(!tree.contains(block));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_invalidations_drain() {
        let mut tree = SceneTree::new();
        let row = tree.add_node(NodeKind::Row, Style::default());
        let marker = tree.add_node(
            NodeKind::Marker(MarkerShape::corner_flag(10.0, Color::BLUE)),
            Style::default(),
        );
        let fresh = tree.take_invalidations();
        assert!(fresh.iter().all(|(_, flags)| *flags == Invalidation::LAYOUT));
        assert_eq!(fresh.len(), 2);

        tree.add_child(row, marker);
        tree.relocate(marker, 80.0, 0.0);

        let mut drained = tree.take_invalidations();
        drained.sort_by_key(|(id, _)| *id);
        assert_eq!(
            drained,
            vec![(row, Invalidation::CHILDREN), (marker, Invalidation::GEOMETRY)]
        );
        assert!(tree.take_invalidations().is_empty());
    }
}
