//! Expandable rows: expansion content hosted under the row's cell band.

use rowskin_core::geometry::Rect;
use rowskin_core::profiling::profile_function;

use crate::expansion::SharedExpansionProvider;
use crate::items::ItemKey;
use crate::skin::{RowContext, RowLayoutExtension};
use crate::tree::{NodeId, SceneTree};

/// Row extension that grows the row by its expansion content.
///
/// Collapsed rows keep their base height and host no content. Expanded rows
/// add the content's preferred height at the row width and place the content
/// below the cells. State is re-derived from the provider on every call.
pub struct ExpandableRow<T> {
    provider: SharedExpansionProvider<T>,
    /// Content node this row last attached.
    attached: Option<NodeId>,
}

impl<T> ExpandableRow<T> {
    pub const NAME: &'static str = "expandable-row";

    pub fn new(provider: SharedExpansionProvider<T>) -> Self {
        Self {
            provider,
            attached: None,
        }
    }

    pub fn attached(&self) -> Option<NodeId> {
        self.attached
    }

    /// Content to show for the row right now, if any.
    fn expanded_content(&self, ctx: &mut RowContext<'_, '_, T>) -> Option<NodeId> {
        let index = ctx.index()?;
        let item = ctx.item()?;
        let Ok(mut provider) = self.provider.try_borrow_mut() else {
            tracing::warn!("Expansion provider is borrowed during layout; row stays collapsed");
            return None;
        };
        if !provider.is_expanded(index, item) {
            return None;
        }

        let content = provider.content(item, ctx.tree());
        if content.is_none() {
            tracing::debug!(
                "Row {:?}: {} is expanded but has no content",
                ctx.row(),
                item.key()
            );
        }
        content
    }
}

impl<T> RowLayoutExtension<T> for ExpandableRow<T> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn extend_pref_height(
        &mut self,
        ctx: &mut RowContext<'_, '_, T>,
        width: f32,
        height: f32,
    ) -> f32 {
        match self.expanded_content(ctx) {
            Some(content) => height + ctx.tree().preferred_height(content, width),
            None => height,
        }
    }

    fn after_layout(&mut self, ctx: &mut RowContext<'_, '_, T>, area: Rect<f32>, base_height: f32) {
        profile_function!();

        let row = ctx.row();
        let content = self.expanded_content(ctx);
        let stale = self
            .attached
            .filter(|&node| Some(node) != content && ctx.tree_ref().contains_child(row, node));
        let fresh = content.filter(|&node| !ctx.tree_ref().contains_child(row, node));

        if (stale.is_some() || fresh.is_some())
            && ctx
                .tree()
                .apply_child_batch(row, stale.as_slice(), fresh.as_slice())
        {
            let metrics = ctx.metrics();
            metrics.child_batches += 1;
            metrics.contents_detached += stale.as_slice().len();
            metrics.contents_attached += fresh.as_slice().len();
        }
        self.attached = content;

        let Some(content) = content else {
            return;
        };
        let bottom = area.y + area.height + ctx.config().row_insets.bottom;
        ctx.tree().resize_relocate(
            content,
            area.x,
            base_height,
            area.width,
            (bottom - base_height).max(0.0),
        );
    }

    fn on_rebind(
        &mut self,
        ctx: &mut RowContext<'_, '_, T>,
        old: Option<ItemKey>,
        _new: Option<ItemKey>,
    ) {
        let row = ctx.row();
        let previous = old.and_then(|key| {
            self.provider
                .try_borrow()
                .ok()
                .and_then(|provider| provider.cached_content(key))
        });

        let mut detach = [None, None];
        for (slot, node) in detach.iter_mut().zip([self.attached.take(), previous]) {
            *slot = node.filter(|&n| ctx.tree_ref().contains_child(row, n));
        }
        if detach[0] == detach[1] {
            detach[1] = None;
        }
        let detach: Vec<NodeId> = detach.into_iter().flatten().collect();
        if detach.is_empty() {
            return;
        }

        if ctx.tree().apply_child_batch(row, &detach, &[]) {
            let metrics = ctx.metrics();
            metrics.child_batches += 1;
            metrics.contents_detached += detach.len();
            tracing::debug!("Row {:?}: detached content of {:?} on rebind", row, old);
        }
    }

    fn teardown(&mut self, tree: &mut SceneTree, row: NodeId) {
        if let Some(node) = self.attached.take() {
            if tree.contains_child(row, node) {
                tree.remove_child(row, node);
            }
        }
    }
}
