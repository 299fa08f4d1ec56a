//! Dirty-cell decoration: a marker over every realized cell whose column
//! holds an uncommitted edit.

use std::cell::RefCell;
use std::rc::Rc;

use rowskin_core::geometry::Rect;
use rowskin_core::profiling::profile_function;
use taffy::Style;

use crate::config::SkinConfig;
use crate::edit_model::{DirtyStateSource, EditModel};
use crate::skin::{RowContext, RowLayoutExtension};
use crate::tree::{CellSlot, MarkerShape, NodeId, NodeKind, SceneTree};

/// Markers indexed by the cell slot they decorate.
///
/// A marker follows the visual slot, not the item: when the row is recycled
/// the same marker is reused for whatever the slot shows next.
#[derive(Debug, Default)]
pub struct MarkerPool {
    slots: Vec<Option<NodeId>>,
}

impl MarkerPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: CellSlot) -> Option<NodeId> {
        self.slots.get(slot.0 as usize).copied().flatten()
    }

    /// The marker for `slot`, created on first use.
    pub fn get_or_create(
        &mut self,
        slot: CellSlot,
        tree: &mut SceneTree,
        config: &SkinConfig,
    ) -> NodeId {
        let index = slot.0 as usize;
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        if let Some(marker) = self.slots[index] {
            return marker;
        }

        let marker = tree.add_node(
            NodeKind::Marker(MarkerShape::corner_flag(
                config.marker_size,
                config.marker_color,
            )),
            Style::default(),
        );
        tree.resize_relocate(marker, 0.0, 0.0, config.marker_size, config.marker_size);
        self.slots[index] = Some(marker);
        marker
    }

    /// Every pooled marker, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().flatten().copied()
    }

    /// Number of markers created so far.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Destroy every pooled marker.
    pub fn release(&mut self, tree: &mut SceneTree) {
        for marker in self.slots.drain(..).flatten() {
            tree.remove_subtree(marker);
        }
    }
}

/// Row extension keeping exactly one marker per dirty realized cell.
pub struct DirtyDecoration<S: DirtyStateSource + ?Sized = EditModel> {
    source: Rc<RefCell<S>>,
    pool: MarkerPool,
    scan: Vec<NodeId>,
    additions: Vec<NodeId>,
    removals: Vec<NodeId>,
}

impl<S: DirtyStateSource + ?Sized> DirtyDecoration<S> {
    pub const NAME: &'static str = "dirty-decoration";

    pub fn new(source: Rc<RefCell<S>>) -> Self {
        Self {
            source,
            pool: MarkerPool::new(),
            scan: Vec::new(),
            additions: Vec::new(),
            removals: Vec::new(),
        }
    }

    pub fn pool(&self) -> &MarkerPool {
        &self.pool
    }

    /// Queue marker additions and removals for the row's cells. Returns the
    /// number of cells whose index no longer resolves to an item.
    fn collect_changes<T>(&mut self, ctx: &mut RowContext<'_, '_, T>, source: &S) -> usize {
        let row = ctx.row();
        let config = ctx.config();
        self.scan.clear();
        self.scan.extend_from_slice(ctx.tree_ref().children(row));

        let mut stale = 0;
        for &cell in &self.scan {
            let (slot, dirty) = {
                let Some(info) = ctx.tree_ref().cell(cell) else {
                    continue;
                };
                let item = ctx.items().resolve(info.index);
                if info.index.is_some() && item.is_none() {
                    stale += 1;
                    tracing::trace!(
                        "Cell {:?} reports stale index {:?}; treating as clean",
                        cell,
                        info.index
                    );
                }
                let dirty =
                    item.is_some_and(|item| source.is_dirty_column(item.key(), &info.column));
                (info.slot, dirty)
            };

            if dirty {
                let origin = ctx.tree_ref().layout(cell).unwrap_or(Rect::ZERO);
                let marker = self.pool.get_or_create(slot, ctx.tree(), config);
                ctx.tree().relocate(marker, origin.x, origin.y);
                if !ctx.tree_ref().contains_child(row, marker) {
                    self.additions.push(marker);
                }
            } else if let Some(marker) = self.pool.get(slot) {
                if ctx.tree_ref().contains_child(row, marker) {
                    self.removals.push(marker);
                }
            }
        }
        stale
    }
}

impl<T, S: DirtyStateSource + ?Sized> RowLayoutExtension<T> for DirtyDecoration<S> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn after_layout(&mut self, ctx: &mut RowContext<'_, '_, T>, _area: Rect<f32>, _base: f32) {
        profile_function!();

        let row = ctx.row();
        self.additions.clear();
        self.removals.clear();

        let source = Rc::clone(&self.source);
        match source.try_borrow() {
            Ok(source) => {
                let stale = self.collect_changes(ctx, &*source);
                ctx.metrics().stale_indices += stale;
            }
            Err(_) => {
                tracing::warn!("Edit model is mutably borrowed during layout; hiding markers");
                self.removals.extend(
                    self.pool
                        .iter()
                        .filter(|&marker| ctx.tree_ref().contains_child(row, marker)),
                );
            }
        }

        if self.additions.is_empty() && self.removals.is_empty() {
            return;
        }

        if ctx
            .tree()
            .apply_child_batch(row, &self.removals, &self.additions)
        {
            let metrics = ctx.metrics();
            metrics.child_batches += 1;
            metrics.markers_attached += self.additions.len();
            metrics.markers_detached += self.removals.len();
            tracing::debug!(
                "Row {:?}: markers +{} -{}",
                row,
                self.additions.len(),
                self.removals.len()
            );
        }
    }

    fn teardown(&mut self, tree: &mut SceneTree, _row: NodeId) {
        self.pool.release(tree);
    }
}
