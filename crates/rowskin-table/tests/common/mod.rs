#![allow(dead_code)]

use rowskin_table::column::{CellValue, Column, ColumnId};
use rowskin_table::config::SkinConfig;
use rowskin_table::table::TableView;
use rowskin_table::tree::{NodeId, NodeKind};

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub age: i64,
    /// Lines of notes shown when the row is expanded, 20px each.
    pub notes: u32,
}

pub fn person(id: i64, name: &str, age: i64, notes: u32) -> Person {
    Person {
        id,
        name: name.to_string(),
        age,
        notes,
    }
}

pub fn id() -> ColumnId {
    ColumnId::new("id")
}

pub fn name() -> ColumnId {
    ColumnId::new("name")
}

pub fn age() -> ColumnId {
    ColumnId::new("age")
}

/// Table with `id` (40px, read-only), `name` (100px) and `age` (60px)
/// columns, 200px wide. No overscan, so the realized rows are exactly the
/// visible ones.
pub fn people_table(people: impl IntoIterator<Item = Person>, viewport_height: f32) -> TableView<Person> {
    let mut table = TableView::with_config(SkinConfig {
        overscan: 0,
        ..Default::default()
    });
    table
        .add_column(
            Column::new("id", "Id")
                .width(40.0)
                .getter(|p: &Person| p.id.into()),
        )
        .unwrap();
    table
        .add_column(
            Column::new("name", "Name")
                .width(100.0)
                .getter(|p: &Person| p.name.as_str().into())
                .setter(|p: &mut Person, value| {
                    if let CellValue::Text(name) = value {
                        p.name = name;
                    }
                }),
        )
        .unwrap();
    table
        .add_column(
            Column::new("age", "Age")
                .width(60.0)
                .getter(|p: &Person| p.age.into())
                .setter(|p: &mut Person, value| {
                    if let CellValue::Integer(age) = value {
                        p.age = age;
                    }
                }),
        )
        .unwrap();
    for p in people {
        table.push_item(p);
    }
    table.set_viewport(200.0, viewport_height);
    table
}

/// Children of `parent` that are dirty markers.
pub fn markers(table: &TableView<Person>, parent: NodeId) -> Vec<NodeId> {
    table
        .tree()
        .children(parent)
        .iter()
        .copied()
        .filter(|&n| matches!(table.tree().kind(n), Some(NodeKind::Marker(_))))
        .collect()
}

/// Children of `parent` that are expansion content roots.
pub fn contents(table: &TableView<Person>, parent: NodeId) -> Vec<NodeId> {
    table
        .tree()
        .children(parent)
        .iter()
        .copied()
        .filter(|&n| matches!(table.tree().kind(n), Some(NodeKind::Content)))
        .collect()
}

/// Row node currently showing `index`.
pub fn row_node(table: &TableView<Person>, index: usize) -> NodeId {
    table.row_for_index(index).unwrap().row()
}

pub fn x_of(table: &TableView<Person>, node: NodeId) -> f32 {
    table.tree().layout(node).unwrap().x
}
