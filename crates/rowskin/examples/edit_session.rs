//! Headless edit session over a virtualized table.
//!
//! This example shows how to:
//! - Bind columns to a plain struct
//! - Track uncommitted edits with dirty-cell markers
//! - Expand rows to show per-item detail content
//! - Scroll, commit and roll back while watching layout metrics
//!
//! Run with: ROWSKIN_LOG=debug cargo run -p rowskin --example edit_session

use rowskin::prelude::*;
use rowskin::table::tree::NodeKind;

struct Contact {
    name: String,
    email: String,
    age: i64,
    notes: Vec<String>,
}

fn contacts() -> Vec<Contact> {
    (0..200)
        .map(|i| Contact {
            name: format!("Contact {}", i),
            email: format!("contact{}@example.com", i),
            age: 20 + (i % 50),
            notes: (0..(i % 4)).map(|n| format!("note {}", n)).collect(),
        })
        .collect()
}

fn build_table() -> TableResult<TableView<Contact>> {
    let mut table = TableView::with_config(SkinConfig {
        row_insets: Insets::new(2.0, 4.0, 2.0, 4.0),
        marker_color: Color::rgba(0.95, 0.55, 0.1, 0.9),
        ..Default::default()
    });

    table.add_column(
        Column::new("name", "Name")
            .width(160.0)
            .getter(|c: &Contact| c.name.as_str().into())
            .setter(|c: &mut Contact, value| {
                if let CellValue::Text(name) = value {
                    c.name = name;
                }
            }),
    )?;
    table.add_column(
        Column::new("email", "Email")
            .width(220.0)
            .getter(|c: &Contact| c.email.as_str().into()),
    )?;
    table.add_column(
        Column::new("age", "Age")
            .width(60.0)
            .getter(|c: &Contact| c.age.into())
            .setter(|c: &mut Contact, value| {
                if let CellValue::Integer(age) = value {
                    c.age = age;
                }
            }),
    )?;

    table.set_items(contacts());
    table.set_viewport(480.0, 320.0);
    Ok(table)
}

fn count_markers(table: &TableView<Contact>) -> usize {
    let tree = table.tree();
    tree.children(table.body())
        .iter()
        .flat_map(|&row| tree.children(row).iter())
        .filter(|&&node| matches!(tree.kind(node), Some(NodeKind::Marker(_))))
        .count()
}

fn pass(table: &mut TableView<Contact>) -> LayoutMetrics {
    let metrics = table.layout_pass();
    rowskin::core::profiling::new_frame();
    metrics
}

fn main() -> TableResult<()> {
    rowskin::init_logging();

    let mut table = build_table()?;
    table.enable_dirty_tracking();

    let expander = RowExpander::shared(|contact: &Contact, builder: &mut ContentBuilder<'_>| {
        for _ in &contact.notes {
            builder.block(18.0);
        }
        !contact.notes.is_empty()
    });
    table.set_expander(expander.clone());

    let metrics = pass(&mut table);
    tracing::info!("Initial pass: {}", metrics.format_summary());

    let name = ColumnId::new("name");
    let age = ColumnId::new("age");
    table.edit_cell(1, &name, "Grace Hopper".into())?;
    table.edit_cell(1, &age, 85i64.into())?;
    table.edit_cell(3, &age, 41i64.into())?;

    // Read-only columns refuse writes.
    let email = ColumnId::new("email");
    if let Err(err) = table.edit_cell(2, &email, "nobody@example.com".into()) {
        tracing::warn!("{}", err);
    }

    for index in [1, 3, 7] {
        if let Some(key) = table.items().key_at(index) {
            expander.borrow_mut().set_expanded(key, true);
        }
    }

    let metrics = pass(&mut table);
    tracing::info!(
        "After edits: {} ({} markers visible)",
        metrics.format_summary(),
        count_markers(&table)
    );

    table.scroll_to(150);
    let metrics = pass(&mut table);
    tracing::info!("Scrolled: {}", metrics.format_summary());

    table.scroll_to(0);
    table.commit(1, Some(&name))?;
    table.rollback(3, None)?;
    let metrics = pass(&mut table);
    tracing::info!(
        "After commit/rollback: {} ({} markers visible)",
        metrics.format_summary(),
        count_markers(&table)
    );

    let steady = pass(&mut table);
    tracing::info!("Steady state stable: {}", steady.is_stable());

    Ok(())
}
