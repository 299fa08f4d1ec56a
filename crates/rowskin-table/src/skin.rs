//! Base row skin and the extension hooks custom row behavior plugs into.
//!
//! A [`TableRowSkin`] owns one row node and one cell node per column. Its two
//! layout entry points, [`compute_pref_height`](TableRowSkin::compute_pref_height)
//! and [`layout_children`](TableRowSkin::layout_children), run the base
//! behavior and then hand the row to each installed [`RowLayoutExtension`].

use rowskin_core::geometry::{Insets, Rect};
use rowskin_core::profiling::profile_function;
use taffy::{Dimension, Style};

use crate::column::ColumnSet;
use crate::config::SkinConfig;
use crate::items::{ItemKey, ItemList, TableItem};
use crate::metrics::LayoutMetrics;
use crate::tree::{CellInfo, CellSlot, NodeId, NodeKind, SceneTree};

/// Everything a layout pass lends to the rows it visits.
pub struct LayoutEnv<'a, T> {
    pub tree: &'a mut SceneTree,
    pub items: &'a ItemList<T>,
    pub columns: &'a ColumnSet<T>,
    pub config: &'a SkinConfig,
    pub metrics: &'a mut LayoutMetrics,
}

/// A [`LayoutEnv`] scoped to one row.
pub struct RowContext<'e, 'a, T> {
    env: &'e mut LayoutEnv<'a, T>,
    row: NodeId,
    index: Option<usize>,
}

impl<'e, 'a, T> RowContext<'e, 'a, T> {
    pub fn new(env: &'e mut LayoutEnv<'a, T>, row: NodeId, index: Option<usize>) -> Self {
        Self { env, row, index }
    }

    pub fn row(&self) -> NodeId {
        self.row
    }

    /// Row index the row is bound to.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Item at the row's index; `None` when unbound or the index is stale.
    pub fn item(&self) -> Option<&'a TableItem<T>> {
        self.env.items.resolve(self.index)
    }

    pub fn items(&self) -> &'a ItemList<T> {
        self.env.items
    }

    pub fn columns(&self) -> &'a ColumnSet<T> {
        self.env.columns
    }

    pub fn config(&self) -> &'a SkinConfig {
        self.env.config
    }

    pub fn tree(&mut self) -> &mut SceneTree {
        &mut *self.env.tree
    }

    pub fn tree_ref(&self) -> &SceneTree {
        &*self.env.tree
    }

    pub fn metrics(&mut self) -> &mut LayoutMetrics {
        &mut *self.env.metrics
    }
}

/// Per-row behavior layered over the base skin.
///
/// Hooks run in installation order. None of them can fail: anything that
/// goes wrong inside a layout pass degrades to "no decoration".
pub trait RowLayoutExtension<T> {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Adjust the row's preferred height. `height` is the base height plus
    /// whatever earlier extensions added.
    fn extend_pref_height(
        &mut self,
        _ctx: &mut RowContext<'_, '_, T>,
        _width: f32,
        height: f32,
    ) -> f32 {
        height
    }

    /// Runs before the base skin places the cells.
    fn before_layout(&mut self, _ctx: &mut RowContext<'_, '_, T>, _area: Rect<f32>) {}

    /// Runs once cell geometry is final. `base_height` is the row-relative
    /// offset where the base cell band ends.
    fn after_layout(
        &mut self,
        _ctx: &mut RowContext<'_, '_, T>,
        _area: Rect<f32>,
        _base_height: f32,
    ) {
    }

    /// Runs synchronously whenever the row's bound item changes, before the
    /// row is laid out for the new item.
    fn on_rebind(
        &mut self,
        _ctx: &mut RowContext<'_, '_, T>,
        _old: Option<ItemKey>,
        _new: Option<ItemKey>,
    ) {
    }

    /// Runs once when the row is about to be destroyed. Release any node the
    /// extension created that is not part of the row's own subtree.
    fn teardown(&mut self, _tree: &mut SceneTree, _row: NodeId) {}
}

fn cell_style(width: f32, height: f32) -> Style {
    Style {
        size: taffy::Size {
            width: Dimension::Length(width),
            height: Dimension::Length(height),
        },
        flex_shrink: 0.0,
        ..Default::default()
    }
}

/// The default row skin: cells side by side in a single band.
pub struct TableRowSkin<T> {
    row: NodeId,
    cells: Vec<NodeId>,
    index: Option<usize>,
    item: Option<ItemKey>,
    extensions: Vec<Box<dyn RowLayoutExtension<T>>>,
}

impl<T> TableRowSkin<T> {
    /// Create the row node and one cell per column.
    pub fn new(tree: &mut SceneTree, columns: &ColumnSet<T>, config: &SkinConfig) -> Self {
        let row = tree.add_node(NodeKind::Row, Style::default());
        let cells: Vec<NodeId> = columns
            .iter()
            .enumerate()
            .map(|(slot, column)| {
                let info = CellInfo {
                    column: column.id().clone(),
                    index: None,
                    slot: CellSlot(slot as u32),
                };
                tree.add_node(
                    NodeKind::Cell(info),
                    cell_style(column.column_width(), config.row_height),
                )
            })
            .collect();
        tree.apply_child_batch(row, &[], &cells);

        Self {
            row,
            cells,
            index: None,
            item: None,
            extensions: Vec::new(),
        }
    }

    pub fn row(&self) -> NodeId {
        self.row
    }

    pub fn cells(&self) -> &[NodeId] {
        &self.cells
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Identity of the item the row currently shows.
    pub fn item(&self) -> Option<ItemKey> {
        self.item
    }

    pub fn add_extension(&mut self, extension: Box<dyn RowLayoutExtension<T>>) {
        tracing::trace!("Row {:?}: installing {}", self.row, extension.name());
        self.extensions.push(extension);
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.iter().any(|e| e.name() == name)
    }

    /// Let the extensions release their nodes, then destroy the row.
    pub fn teardown(mut self, tree: &mut SceneTree) {
        for extension in self.extensions.iter_mut() {
            extension.teardown(tree, self.row);
        }
        tree.remove_subtree(self.row);
    }

    /// Bind the row to `index` and run the rebind hooks if the item changed.
    ///
    /// Cells report the new index immediately; extensions see the old and
    /// new item before any layout for the new item happens.
    pub fn update_index(&mut self, env: &mut LayoutEnv<'_, T>, index: Option<usize>) {
        let new_item = env.items.resolve(index).map(TableItem::key);
        self.index = index;
        for &cell in &self.cells {
            env.tree.set_cell_index(cell, index);
        }

        if new_item == self.item {
            return;
        }

        let old_item = self.item;
        let mut ctx = RowContext::new(env, self.row, index);
        for extension in self.extensions.iter_mut() {
            extension.on_rebind(&mut ctx, old_item, new_item);
        }
        ctx.metrics().rows_rebound += 1;
        self.item = new_item;
        tracing::trace!(
            "Row {:?} rebound {:?} -> {:?} at index {:?}",
            self.row,
            old_item,
            new_item,
            index
        );
    }

    /// Height of the tallest cell at its column width.
    fn band_height(&self, ctx: &mut RowContext<'_, '_, T>) -> f32 {
        if self.cells.is_empty() {
            return ctx.config().row_height;
        }
        let columns = ctx.columns();
        self.cells
            .iter()
            .enumerate()
            .map(|(slot, &cell)| {
                let width = columns.at(slot).map_or(0.0, |c| c.column_width());
                ctx.tree().preferred_height(cell, width)
            })
            .fold(0.0, f32::max)
    }

    /// Preferred height of the row without any extension.
    pub fn base_pref_height(&self, ctx: &mut RowContext<'_, '_, T>, insets: Insets) -> f32 {
        self.band_height(ctx) + insets.vertical()
    }

    /// Preferred row height at `width`.
    ///
    /// The base height is always computed first, unmodified; extensions only
    /// add to it.
    pub fn compute_pref_height(
        &mut self,
        env: &mut LayoutEnv<'_, T>,
        width: f32,
        insets: Insets,
    ) -> f32 {
        profile_function!();

        let mut ctx = RowContext::new(env, self.row, self.index);
        let mut height = self.base_pref_height(&mut ctx, insets);
        for extension in self.extensions.iter_mut() {
            height = extension.extend_pref_height(&mut ctx, width, height);
        }
        height
    }

    /// Place the cells in the content box `(x, y, w, h)`, then let the
    /// extensions decorate the row.
    pub fn layout_children(&mut self, env: &mut LayoutEnv<'_, T>, x: f32, y: f32, w: f32, h: f32) {
        profile_function!();

        let area = Rect::new(x, y, w, h);
        let mut ctx = RowContext::new(env, self.row, self.index);
        for extension in self.extensions.iter_mut() {
            extension.before_layout(&mut ctx, area);
        }

        let insets = ctx.config().row_insets;
        let band = self.band_height(&mut ctx);
        let columns = ctx.columns();
        for (slot, &cell) in self.cells.iter().enumerate() {
            let width = columns.at(slot).map_or(0.0, |c| c.column_width());
            ctx.tree()
                .resize_relocate(cell, x + columns.offset_of(slot), y, width, band);
        }

        let base_height = band + insets.vertical();
        for extension in self.extensions.iter_mut() {
            extension.after_layout(&mut ctx, area, base_height);
        }
        ctx.metrics().rows_laid_out += 1;
    }
}
