//! Expansion providers: which rows are expanded and what they show.

use std::cell::RefCell;
use std::rc::Rc;

use rowskin_core::alloc::{HashMap, HashSet};
use taffy::{Dimension, FlexDirection, Style};

use crate::items::{ItemKey, TableItem};
use crate::tree::{NodeId, NodeKind, SceneTree};

/// Source of expansion state and expansion content for table rows.
pub trait ExpansionProvider<T> {
    /// Whether the row at `row_index`, showing `item`, is expanded.
    fn is_expanded(&self, row_index: usize, item: &TableItem<T>) -> bool;

    /// Content node for `item`, created on first request and cached after.
    ///
    /// Returns `None` if the item has nothing to show.
    fn content(&mut self, item: &TableItem<T>, tree: &mut SceneTree) -> Option<NodeId>;

    /// Cached content for `item`, without creating any.
    fn cached_content(&self, item: ItemKey) -> Option<NodeId>;

    /// Drop everything known about `item` and hand back its cached content.
    fn forget(&mut self, _item: ItemKey) -> Option<NodeId> {
        None
    }
}

pub type SharedExpansionProvider<T> = Rc<RefCell<dyn ExpansionProvider<T>>>;

/// Builds one expansion content subtree.
///
/// The root is a full-width column; blocks stack top to bottom and the
/// content's preferred height is the sum of theirs.
pub struct ContentBuilder<'a> {
    tree: &'a mut SceneTree,
    root: NodeId,
}

impl<'a> ContentBuilder<'a> {
    pub fn new(tree: &'a mut SceneTree) -> Self {
        let root = tree.add_node(
            NodeKind::Content,
            Style {
                flex_direction: FlexDirection::Column,
                size: taffy::Size {
                    width: Dimension::Percent(1.0),
                    height: Dimension::Auto,
                },
                ..Default::default()
            },
        );
        Self { tree, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Append a full-width block of fixed height.
    pub fn block(&mut self, height: f32) -> NodeId {
        self.block_with_style(Style {
            size: taffy::Size {
                width: Dimension::Percent(1.0),
                height: Dimension::Length(height),
            },
            flex_shrink: 0.0,
            ..Default::default()
        })
    }

    pub fn block_with_style(&mut self, style: Style) -> NodeId {
        let block = self.tree.add_node(NodeKind::Block, style);
        self.tree.add_child(self.root, block);
        block
    }

    pub fn tree(&mut self) -> &mut SceneTree {
        self.tree
    }
}

type ContentFactory<T> = Box<dyn FnMut(&T, &mut ContentBuilder<'_>) -> bool>;

/// Expansion provider keyed by item identity with a lazily-filled cache.
///
/// Expansion follows the item, so a recycled row picks up the state of
/// whichever item it is bound to.
pub struct RowExpander<T> {
    expanded: HashSet<ItemKey>,
    cache: HashMap<ItemKey, NodeId>,
    /// Items whose factory produced nothing.
    empty: HashSet<ItemKey>,
    factory: ContentFactory<T>,
    created: usize,
}

impl<T> RowExpander<T> {
    /// `factory` fills the builder for an item and returns false if the item
    /// has no expansion content.
    pub fn new(factory: impl FnMut(&T, &mut ContentBuilder<'_>) -> bool + 'static) -> Self {
        Self {
            expanded: HashSet::default(),
            cache: HashMap::default(),
            empty: HashSet::default(),
            factory: Box::new(factory),
            created: 0,
        }
    }

    pub fn shared(
        factory: impl FnMut(&T, &mut ContentBuilder<'_>) -> bool + 'static,
    ) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new(factory)))
    }

    pub fn set_expanded(&mut self, item: ItemKey, expanded: bool) {
        if expanded {
            self.expanded.insert(item);
        } else {
            self.expanded.remove(&item);
        }
    }

    /// Flip the expansion state of `item` and return the new state.
    pub fn toggle(&mut self, item: ItemKey) -> bool {
        let expanded = !self.expanded.contains(&item);
        self.set_expanded(item, expanded);
        expanded
    }

    pub fn is_item_expanded(&self, item: ItemKey) -> bool {
        self.expanded.contains(&item)
    }

    /// Number of content subtrees the factory has built.
    pub fn created_count(&self) -> usize {
        self.created
    }
}

impl<T> ExpansionProvider<T> for RowExpander<T> {
    fn is_expanded(&self, _row_index: usize, item: &TableItem<T>) -> bool {
        self.expanded.contains(&item.key())
    }

    fn content(&mut self, item: &TableItem<T>, tree: &mut SceneTree) -> Option<NodeId> {
        let key = item.key();
        if let Some(&node) = self.cache.get(&key) {
            if tree.contains(node) {
                return Some(node);
            }
            tracing::warn!("Cached content {:?} for {} was destroyed; rebuilding", node, key);
            self.cache.remove(&key);
        }
        if self.empty.contains(&key) {
            return None;
        }

        let mut builder = ContentBuilder::new(tree);
        let has_content = (self.factory)(item.value(), &mut builder);
        let root = builder.root();
        if !has_content {
            tree.remove_subtree(root);
            self.empty.insert(key);
            return None;
        }

        tracing::trace!("Built expansion content {:?} for {}", root, key);
        self.cache.insert(key, root);
        self.created += 1;
        Some(root)
    }

    fn cached_content(&self, item: ItemKey) -> Option<NodeId> {
        self.cache.get(&item).copied()
    }

    fn forget(&mut self, item: ItemKey) -> Option<NodeId> {
        self.expanded.remove(&item);
        self.empty.remove(&item);
        self.cache.remove(&item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::ItemList;

    fn expander() -> RowExpander<u32> {
        RowExpander::new(|lines: &u32, builder| {
            for _ in 0..*lines {
                builder.block(20.0);
            }
            *lines > 0
        })
    }

    #[test]
    fn test_content_is_built_once() {
        let mut tree = SceneTree::new();
        let mut items = ItemList::new();
        items.push(2u32);
        let item = items.get(0).unwrap();
        let mut expander = expander();

        let first = expander.content(item, &mut tree);
        let second = expander.content(item, &mut tree);

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(expander.created_count(), 1);
        assert_eq!(tree.children(first.unwrap()).len(), 2);
        assert_eq!(tree.preferred_height(first.unwrap(), 200.0), 40.0);
    }

    #[test]
    fn test_item_without_content_leaves_no_nodes() {
        let mut tree = SceneTree::new();
        let mut items = ItemList::new();
        items.push(0u32);
        let mut expander = expander();

        assert_eq!(expander.content(items.get(0).unwrap(), &mut tree), None);
        assert!(tree.is_empty());
        assert_eq!(expander.created_count(), 0);
    }

    #[test]
    fn test_expansion_follows_item_identity() {
        let mut items = ItemList::new();
        let a = items.push(1u32);
        let b = items.push(1u32);
        let mut expander = expander();

        assert!(expander.toggle(a));
        assert!(expander.is_expanded(0, items.get(0).unwrap()));
        assert!(!expander.is_expanded(1, items.get(1).unwrap()));
        assert!(!expander.is_item_expanded(b));

        assert!(!expander.toggle(a));
        assert!(!expander.is_item_expanded(a));
    }

    #[test]
    fn test_forget_returns_cached_content() {
        let mut tree = SceneTree::new();
        let mut items = ItemList::new();
        let key = items.push(1u32);
        let mut expander = expander();
        expander.set_expanded(key, true);
        let content = expander.content(items.get(0).unwrap(), &mut tree);

        assert_eq!(expander.forget(key), content);
        assert_eq!(expander.cached_content(key), None);
        assert!(!expander.is_item_expanded(key));
    }
}
