//! The table view: realizes rows for the visible range, recycles them as
//! the view scrolls, and drives every row's layout pass.

use std::ops::Range;
use std::rc::Rc;

use rowskin_core::profiling::profile_function;
use taffy::Style;

use crate::column::{CellValue, Column, ColumnId, ColumnSet};
use crate::config::SkinConfig;
use crate::decoration::DirtyDecoration;
use crate::edit_model::{EditModel, SharedEditModel};
use crate::error::{TableError, TableResult};
use crate::expandable::ExpandableRow;
use crate::expansion::SharedExpansionProvider;
use crate::flow::VirtualFlow;
use crate::items::{ItemKey, ItemList};
use crate::metrics::{LayoutMetrics, MetricsTimer};
use crate::skin::{LayoutEnv, TableRowSkin};
use crate::tree::{NodeId, NodeKind, SceneTree};

/// Upper bound on bind/measure rounds in one layout pass.
const MAX_SETTLE_ROUNDS: usize = 4;

/// A virtualized table of `T` values.
///
/// Only rows in the visible range (plus overscan) have scene nodes. Rows
/// leaving the range are kept in a pool and rebound to other items later.
pub struct TableView<T: 'static> {
    tree: SceneTree,
    body: NodeId,
    items: ItemList<T>,
    columns: ColumnSet<T>,
    config: SkinConfig,
    edit_model: SharedEditModel,
    dirty_tracking: bool,
    expander: Option<SharedExpansionProvider<T>>,
    rows: Vec<TableRowSkin<T>>,
    flow: VirtualFlow,
    width: f32,

    // Per-pass scratch.
    assignments: Vec<Option<usize>>,
    order: Vec<(usize, usize)>,
    realized: Vec<NodeId>,
    stale_rows: Vec<NodeId>,
    claimed: Vec<bool>,

    last_metrics: LayoutMetrics,
}

impl<T: 'static> TableView<T> {
    pub fn new() -> Self {
        Self::with_config(SkinConfig::default())
    }

    pub fn with_config(config: SkinConfig) -> Self {
        let mut tree = SceneTree::new();
        let body = tree.add_node(NodeKind::Body, Style::default());
        let flow = VirtualFlow::new(config.row_height + config.row_insets.vertical(), config.overscan);
        Self {
            tree,
            body,
            items: ItemList::new(),
            columns: ColumnSet::new(),
            config,
            edit_model: EditModel::shared(),
            dirty_tracking: false,
            expander: None,
            rows: Vec::new(),
            flow,
            width: 0.0,
            assignments: Vec::new(),
            order: Vec::new(),
            realized: Vec::new(),
            stale_rows: Vec::new(),
            claimed: Vec::new(),
            last_metrics: LayoutMetrics::new(),
        }
    }

    pub fn config(&self) -> &SkinConfig {
        &self.config
    }

    /// Register a column. Realized rows are rebuilt on the next pass.
    pub fn add_column(&mut self, column: Column<T>) -> TableResult<()> {
        self.columns.add(column)?;
        self.discard_rows();
        Ok(())
    }

    pub fn columns(&self) -> &ColumnSet<T> {
        &self.columns
    }

    pub fn push_item(&mut self, value: T) -> ItemKey {
        let key = self.items.push(value);
        self.flow.set_total_items(self.items.len());
        key
    }

    pub fn insert_item(&mut self, index: usize, value: T) -> ItemKey {
        let key = self.items.insert(index, value);
        self.flow.set_total_items(self.items.len());
        self.flow.reset_measurements();
        key
    }

    /// Remove the item at `index`, dropping its edit state and expansion
    /// content.
    pub fn remove_item(&mut self, index: usize) -> Option<T> {
        let item = self.items.remove(index)?;
        self.forget_item(item.key());
        self.flow.set_total_items(self.items.len());
        self.flow.reset_measurements();
        Some(item.into_value())
    }

    /// Replace every item. Pending edits are discarded.
    pub fn set_items(&mut self, values: impl IntoIterator<Item = T>) {
        let removed = self.items.replace_all(values);
        for key in removed {
            self.forget_item(key);
        }
        self.edit_model.borrow_mut().reset();
        self.flow.set_total_items(self.items.len());
        self.flow.reset_measurements();
    }

    fn forget_item(&mut self, key: ItemKey) {
        self.edit_model.borrow_mut().forget(key);
        if let Some(expander) = &self.expander {
            Self::release_content(&mut self.tree, expander, key);
        }
    }

    /// Make `provider` forget `key` and destroy the content it cached.
    fn release_content(tree: &mut SceneTree, provider: &SharedExpansionProvider<T>, key: ItemKey) {
        let content = match provider.try_borrow_mut() {
            Ok(mut provider) => provider.forget(key),
            Err(_) => {
                tracing::warn!("Expansion provider busy; content of {} is kept", key);
                None
            }
        };
        if let Some(content) = content {
            tree.remove_subtree(content);
        }
    }

    pub fn items(&self) -> &ItemList<T> {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&T> {
        self.items.get(index).map(|item| item.value())
    }

    /// Handle to the edit model, for sharing with other views or inspecting
    /// dirty state.
    pub fn edit_model(&self) -> &SharedEditModel {
        &self.edit_model
    }

    /// Decorate dirty cells of every row, present and future.
    pub fn enable_dirty_tracking(&mut self) {
        if self.dirty_tracking {
            return;
        }
        self.dirty_tracking = true;
        for row in &mut self.rows {
            row.add_extension(Box::new(DirtyDecoration::new(self.edit_model.clone())));
        }
    }

    /// Host expansion content from `provider` under expanded rows.
    ///
    /// A replaced provider forgets every item of this table and its cached
    /// content is destroyed.
    pub fn set_expander(&mut self, provider: SharedExpansionProvider<T>) {
        if self
            .expander
            .as_ref()
            .is_some_and(|current| Rc::ptr_eq(current, &provider))
        {
            return;
        }

        self.discard_rows();
        if let Some(old) = self.expander.take() {
            for item in self.items.iter() {
                Self::release_content(&mut self.tree, &old, item.key());
            }
        }
        self.expander = Some(provider);
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.width = width.max(0.0);
        self.flow.set_viewport_height(height);
    }

    pub fn scroll_to(&mut self, index: usize) {
        self.flow.scroll_to_item(index);
    }

    pub fn scroll_by(&mut self, delta: f32) {
        self.flow.scroll_by(delta);
    }

    pub fn flow(&self) -> &VirtualFlow {
        &self.flow
    }

    pub fn tree(&self) -> &SceneTree {
        &self.tree
    }

    /// Mutable access for registering child-list observers or adjusting
    /// node styles.
    pub fn tree_mut(&mut self) -> &mut SceneTree {
        &mut self.tree
    }

    /// Node that realized rows are attached to.
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Realized row showing `index`.
    pub fn row_for_index(&self, index: usize) -> Option<&TableRowSkin<T>> {
        self.rows.iter().find(|row| row.index() == Some(index))
    }

    /// Number of row skins alive, realized or pooled.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn last_metrics(&self) -> &LayoutMetrics {
        &self.last_metrics
    }

    fn create_row(&mut self) -> TableRowSkin<T> {
        let mut row = TableRowSkin::new(&mut self.tree, &self.columns, &self.config);
        if self.dirty_tracking {
            row.add_extension(Box::new(DirtyDecoration::new(self.edit_model.clone())));
        }
        if let Some(expander) = &self.expander {
            row.add_extension(Box::new(ExpandableRow::new(expander.clone())));
        }
        row
    }

    /// Destroy every row skin; the next pass builds fresh ones.
    fn discard_rows(&mut self) {
        for row in self.rows.drain(..) {
            row.teardown(&mut self.tree);
        }
    }

    /// Bind rows to the indices of `range` and record their preferred
    /// heights in the flow.
    fn bind_and_measure(&mut self, range: Range<usize>, row_width: f32, metrics: &mut LayoutMetrics) {
        while self.rows.len() < range.len() {
            let row = self.create_row();
            self.rows.push(row);
        }

        // Rows already showing an index in range keep it; the rest are
        // handed the unclaimed indices or unbound.
        self.claimed.clear();
        self.claimed.resize(range.len(), false);
        self.assignments.clear();
        for row in &self.rows {
            let keep = row
                .index()
                .filter(|i| range.contains(i) && !self.claimed[i - range.start]);
            if let Some(i) = keep {
                self.claimed[i - range.start] = true;
            }
            self.assignments.push(keep);
        }
        let mut unclaimed = range.clone().filter(|i| !self.claimed[i - range.start]);
        for assignment in self.assignments.iter_mut().filter(|a| a.is_none()) {
            *assignment = unclaimed.next();
        }

        let insets = self.config.row_insets;
        let mut env = LayoutEnv {
            tree: &mut self.tree,
            items: &self.items,
            columns: &self.columns,
            config: &self.config,
            metrics,
        };

        for (row, &index) in self.rows.iter_mut().zip(&self.assignments) {
            row.update_index(&mut env, index);
        }

        self.order.clear();
        self.order.extend(
            self.assignments
                .iter()
                .enumerate()
                .filter_map(|(slot, index)| index.map(|i| (i, slot))),
        );
        self.order.sort_unstable();

        for &(index, slot) in &self.order {
            let height = self.rows[slot].compute_pref_height(&mut env, row_width, insets);
            self.flow.set_measured(index, height);
        }
    }

    /// Realize the visible range, rebind recycled rows and lay every
    /// realized row out.
    ///
    /// Measuring rows can change which rows are visible (a collapsed row
    /// frees space below it), so binding and measuring repeat until the
    /// visible range stops changing.
    pub fn layout_pass(&mut self) -> LayoutMetrics {
        profile_function!();

        let timer = MetricsTimer::start();
        let mut metrics = LayoutMetrics::new();

        self.flow.set_total_items(self.items.len());
        let row_width = self.width.max(self.columns.total_width());
        let insets = self.config.row_insets;

        let mut range = self.flow.visible_range();
        for round in 1..=MAX_SETTLE_ROUNDS {
            self.bind_and_measure(range.clone(), row_width, &mut metrics);
            self.flow.set_scroll_offset(self.flow.scroll_offset());

            let settled = self.flow.visible_range();
            if settled == range {
                break;
            }
            if round == MAX_SETTLE_ROUNDS {
                tracing::warn!(
                    "Visible range did not settle after {} rounds ({:?} -> {:?})",
                    round,
                    range,
                    settled
                );
                break;
            }
            tracing::trace!("Visible range moved {:?} -> {:?}; re-measuring", range, settled);
            range = settled;
        }

        let mut env = LayoutEnv {
            tree: &mut self.tree,
            items: &self.items,
            columns: &self.columns,
            config: &self.config,
            metrics: &mut metrics,
        };
        let mut y = self.flow.item_offset(range.start) - self.flow.scroll_offset();
        self.realized.clear();
        for &(index, slot) in &self.order {
            let height = self.flow.item_height(index);
            let row = &mut self.rows[slot];
            env.tree.resize_relocate(row.row(), 0.0, y, row_width, height);
            row.layout_children(
                &mut env,
                insets.left,
                insets.top,
                (row_width - insets.horizontal()).max(0.0),
                (height - insets.vertical()).max(0.0),
            );
            self.realized.push(row.row());
            y += height;
        }

        self.stale_rows.clear();
        self.stale_rows.extend(
            self.tree
                .children(self.body)
                .iter()
                .copied()
                .filter(|row| !self.realized.contains(row)),
        );
        self.tree
            .apply_child_batch(self.body, &self.stale_rows, &self.realized);

        metrics.layout_time = timer.stop();
        tracing::debug!("{}", metrics.format_summary());
        self.last_metrics = metrics.clone();
        metrics
    }

    /// Write `value` into `column` of the item at `index` and record the
    /// edit.
    pub fn edit_cell(&mut self, index: usize, column: &ColumnId, value: CellValue) -> TableResult<()> {
        let len = self.items.len();
        let binding = self.columns.get(column)?;
        let item = self
            .items
            .get_mut(index)
            .ok_or(TableError::IndexOutOfRange { index, len })?;

        let initial = binding.value(item.value());
        binding.set_value(item.value_mut(), value)?;
        let current = binding.value(item.value());
        self.edit_model
            .borrow_mut()
            .record_edit(item.key(), column.clone(), initial, &current);
        tracing::trace!("Edited {} of {} at row {}", column, item.key(), index);
        Ok(())
    }

    fn key_at(&self, index: usize) -> TableResult<ItemKey> {
        self.items.key_at(index).ok_or(TableError::IndexOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    /// Accept the pending edits of the item at `index`, or only `column`.
    pub fn commit(&mut self, index: usize, column: Option<&ColumnId>) -> TableResult<()> {
        let key = self.key_at(index)?;
        if let Some(column) = column {
            self.columns.get(column)?;
        }
        self.edit_model.borrow_mut().commit(key, column);
        Ok(())
    }

    pub fn commit_all(&mut self) {
        self.edit_model.borrow_mut().commit_all();
    }

    /// Discard the pending edits of the item at `index` (or only `column`)
    /// and write the last committed values back.
    pub fn rollback(&mut self, index: usize, column: Option<&ColumnId>) -> TableResult<()> {
        let key = self.key_at(index)?;
        if let Some(column) = column {
            self.columns.get(column)?;
        }
        let restored = self.edit_model.borrow_mut().rollback(key, column);
        for (column, value) in restored {
            self.restore(index, &column, value)?;
        }
        Ok(())
    }

    /// Discard every pending edit, writing committed values back.
    pub fn rollback_all(&mut self) -> TableResult<()> {
        let restored = self.edit_model.borrow_mut().rollback_all();
        for (key, column, value) in restored {
            let Some(index) = self.items.index_of(key) else {
                continue;
            };
            self.restore(index, &column, value)?;
        }
        Ok(())
    }

    fn restore(&mut self, index: usize, column: &ColumnId, value: CellValue) -> TableResult<()> {
        let len = self.items.len();
        let binding = self.columns.get(column)?;
        let item = self
            .items
            .get_mut(index)
            .ok_or(TableError::IndexOutOfRange { index, len })?;
        binding.set_value(item.value_mut(), value)
    }
}

impl<T: 'static> Default for TableView<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Task {
        title: String,
        done: bool,
    }

    fn table() -> TableView<Task> {
        let mut table = TableView::new();
        table
            .add_column(
                Column::new("title", "Title")
                    .width(120.0)
                    .getter(|t: &Task| CellValue::from(t.title.as_str()))
                    .setter(|t: &mut Task, v| {
                        if let CellValue::Text(s) = v {
                            t.title = s;
                        }
                    }),
            )
            .unwrap();
        table
            .add_column(Column::new("done", "Done").getter(|t: &Task| t.done.into()))
            .unwrap();
        for i in 0..50 {
            table.push_item(Task {
                title: format!("task {i}"),
                done: false,
            });
        }
        table.set_viewport(200.0, 100.0);
        table
    }

    #[test]
    fn test_realizes_visible_range_only() {
        let mut table = table();
        table.layout_pass();

        // 100px / 24px covers rows 0..=4, plus two rows of overscan.
        assert_eq!(table.tree().children(table.body()).len(), 7);
        assert_eq!(table.row_count(), 7);
    }

    #[test]
    fn test_scrolling_recycles_rows() {
        let mut table = table();
        table.layout_pass();
        table.scroll_by(240.0);
        let metrics = table.layout_pass();

        // Range 8..17 needs two rows more than the first pass built.
        assert_eq!(table.row_count(), 9);
        assert_eq!(metrics.rows_rebound, 9);
        let row = table.row_for_index(10).unwrap();
        assert_eq!(table.tree().layout(row.row()).map(|r| r.y), Some(0.0));
    }

    #[test]
    fn test_edit_to_read_only_column_fails() {
        let mut table = table();
        let done = ColumnId::new("done");

        assert_eq!(
            table.edit_cell(0, &done, true.into()),
            Err(TableError::ReadOnlyColumn(done.clone()))
        );
        assert_eq!(
            table.edit_cell(99, &ColumnId::new("title"), "x".into()),
            Err(TableError::IndexOutOfRange { index: 99, len: 50 })
        );
        assert!(!table.edit_model().borrow().is_dirty(table.items().key_at(0).unwrap()));
    }

    #[test]
    fn test_rollback_restores_value() {
        let mut table = table();
        let title = ColumnId::new("title");

        table.edit_cell(3, &title, "renamed".into()).unwrap();
        assert_eq!(table.item(3).unwrap().title, "renamed");

        table.rollback(3, Some(&title)).unwrap();
        assert_eq!(table.item(3).unwrap().title, "task 3");
        assert!(!table.edit_model().borrow().is_dirty(table.items().key_at(3).unwrap()));
    }
}
