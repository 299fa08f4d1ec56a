//! Row skins and extensions used directly, without a table view.

use std::cell::RefCell;
use std::rc::Rc;

use rowskin_core::{Insets, Rect};
use rowskin_table::column::{Column, ColumnSet};
use rowskin_table::config::SkinConfig;
use rowskin_table::decoration::DirtyDecoration;
use rowskin_table::edit_model::EditModel;
use rowskin_table::items::{ItemKey, ItemList};
use rowskin_table::metrics::LayoutMetrics;
use rowskin_table::skin::{LayoutEnv, RowContext, RowLayoutExtension, TableRowSkin};
use rowskin_table::tree::{NodeKind, SceneTree};

type Log = Rc<RefCell<Vec<String>>>;

struct Tracer {
    label: &'static str,
    log: Log,
}

impl RowLayoutExtension<&'static str> for Tracer {
    fn name(&self) -> &'static str {
        self.label
    }

    fn extend_pref_height(
        &mut self,
        _ctx: &mut RowContext<'_, '_, &'static str>,
        _width: f32,
        height: f32,
    ) -> f32 {
        self.log
            .borrow_mut()
            .push(format!("{}:height:{}", self.label, height));
        height + 1.0
    }

    fn before_layout(&mut self, _ctx: &mut RowContext<'_, '_, &'static str>, _area: Rect<f32>) {
        self.log.borrow_mut().push(format!("{}:before", self.label));
    }

    fn after_layout(
        &mut self,
        _ctx: &mut RowContext<'_, '_, &'static str>,
        _area: Rect<f32>,
        base_height: f32,
    ) {
        self.log
            .borrow_mut()
            .push(format!("{}:after:{}", self.label, base_height));
    }

    fn on_rebind(
        &mut self,
        _ctx: &mut RowContext<'_, '_, &'static str>,
        old: Option<ItemKey>,
        new: Option<ItemKey>,
    ) {
        self.log.borrow_mut().push(format!(
            "{}:rebind:{}->{}",
            self.label,
            old.is_some(),
            new.is_some()
        ));
    }
}

struct Harness {
    tree: SceneTree,
    items: ItemList<&'static str>,
    columns: ColumnSet<&'static str>,
    config: SkinConfig,
    metrics: LayoutMetrics,
}

impl Harness {
    fn new() -> Self {
        let mut items = ItemList::new();
        items.push("first");
        items.push("second");
        let mut columns = ColumnSet::new();
        columns.add(Column::new("a", "A").width(50.0)).unwrap();
        columns.add(Column::new("b", "B").width(50.0)).unwrap();
        Self {
            tree: SceneTree::new(),
            items,
            columns,
            config: SkinConfig::default(),
            metrics: LayoutMetrics::new(),
        }
    }

    fn skin(&mut self) -> TableRowSkin<&'static str> {
        TableRowSkin::new(&mut self.tree, &self.columns, &self.config)
    }

    fn env(&mut self) -> LayoutEnv<'_, &'static str> {
        LayoutEnv {
            tree: &mut self.tree,
            items: &self.items,
            columns: &self.columns,
            config: &self.config,
            metrics: &mut self.metrics,
        }
    }
}

#[test]
fn test_hooks_run_in_installation_order() {
    let mut harness = Harness::new();
    let log: Log = Rc::default();
    let mut skin = harness.skin();
    for label in ["outer", "inner"] {
        skin.add_extension(Box::new(Tracer {
            label,
            log: log.clone(),
        }));
    }

    let mut env = harness.env();
    skin.update_index(&mut env, Some(0));
    let height = skin.compute_pref_height(&mut env, 100.0, Insets::ZERO);
    skin.layout_children(&mut env, 0.0, 0.0, 100.0, height);

    assert_eq!(height, 26.0);
    assert_eq!(
        *log.borrow(),
        vec![
            "outer:rebind:false->true",
            "inner:rebind:false->true",
            "outer:height:24",
            "inner:height:25",
            "outer:before",
            "inner:before",
            "outer:after:24",
            "inner:after:24",
        ]
    );
    assert!(skin.has_extension("inner"));
    assert!(!skin.has_extension("missing"));
}

#[test]
fn test_base_height_includes_insets() {
    let mut harness = Harness::new();
    harness.config.row_insets = Insets::new(3.0, 0.0, 5.0, 0.0);
    let mut skin = harness.skin();

    let mut env = harness.env();
    skin.update_index(&mut env, Some(1));
    let height = skin.compute_pref_height(&mut env, 100.0, Insets::new(3.0, 0.0, 5.0, 0.0));

    assert_eq!(height, 32.0);
}

#[test]
fn test_stale_index_is_treated_as_clean() {
    let mut harness = Harness::new();
    let model = EditModel::shared();
    let second = harness.items.key_at(1).unwrap();
    model.borrow_mut().mark_dirty(second, "a".into());

    let mut skin = harness.skin();
    skin.add_extension(Box::new(DirtyDecoration::new(model.clone())));
    {
        let mut env = harness.env();
        skin.update_index(&mut env, Some(1));
        skin.layout_children(&mut env, 0.0, 0.0, 100.0, 24.0);
    }
    assert_eq!(skin.cells().len(), 2);
    let row = skin.row();
    let marker_count = |tree: &SceneTree| {
        tree.children(row)
            .iter()
            .filter(|&&n| matches!(tree.kind(n), Some(NodeKind::Marker(_))))
            .count()
    };
    assert_eq!(marker_count(&harness.tree), 1);

    // The list shrinks but the row still reports index 1 until it is rebound.
    harness.items.remove(1);
    {
        let mut env = harness.env();
        skin.layout_children(&mut env, 0.0, 0.0, 100.0, 24.0);
    }

    assert_eq!(marker_count(&harness.tree), 0);
    assert_eq!(harness.metrics.stale_indices, 2);
}

#[test]
fn test_teardown_destroys_row_and_markers() {
    let mut harness = Harness::new();
    let model = EditModel::shared();
    let first = harness.items.key_at(0).unwrap();
    model.borrow_mut().mark_dirty(first, "b".into());

    let mut skin = harness.skin();
    skin.add_extension(Box::new(DirtyDecoration::new(model)));
    {
        let mut env = harness.env();
        skin.update_index(&mut env, Some(0));
        skin.layout_children(&mut env, 0.0, 0.0, 100.0, 24.0);
    }
    assert_eq!(harness.tree.len(), 4);

    skin.teardown(&mut harness.tree);

    assert!(harness.tree.is_empty());
}
