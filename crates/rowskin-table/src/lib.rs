//! Rowskin Table - row skins for virtualized tables
//!
//! This crate lays out the rows of a virtualized table and lets custom row
//! behavior hook into every layout pass:
//! - Dirty-cell decoration: a marker over each cell holding an uncommitted edit
//! - Expandable rows: per-item content hosted under the row's cells
//! - Row recycling with an explicit rebind contract
//!
//! ## Quick Start
//!
//! ```rust
//! use rowskin_table::column::{CellValue, Column, ColumnId};
//! use rowskin_table::table::TableView;
//!
//! struct Person {
//!     name: String,
//! }
//!
//! let mut table = TableView::new();
//! table
//!     .add_column(
//!         Column::new("name", "Name")
//!             .getter(|p: &Person| p.name.as_str().into())
//!             .setter(|p: &mut Person, value| {
//!                 if let CellValue::Text(name) = value {
//!                     p.name = name;
//!                 }
//!             }),
//!     )
//!     .unwrap();
//! table.push_item(Person { name: "Ada".into() });
//! table.enable_dirty_tracking();
//! table.set_viewport(400.0, 300.0);
//!
//! table
//!     .edit_cell(0, &ColumnId::new("name"), "Grace".into())
//!     .unwrap();
//! let metrics = table.layout_pass();
//! assert_eq!(metrics.markers_attached, 1);
//! ```

pub mod column;
pub mod config;
pub mod decoration;
pub mod edit_model;
pub mod error;
pub mod expandable;
pub mod expansion;
pub mod flow;
pub mod invalidation;
pub mod items;
pub mod metrics;
pub mod skin;
pub mod table;
pub mod tree;

pub use column::{CellValue, Column, ColumnId, ColumnSet};
pub use config::SkinConfig;
pub use decoration::{DirtyDecoration, MarkerPool};
pub use edit_model::{DirtyState, DirtyStateSource, EditModel, SharedEditModel};
pub use error::{TableError, TableResult};
pub use expandable::ExpandableRow;
pub use expansion::{ContentBuilder, ExpansionProvider, RowExpander, SharedExpansionProvider};
pub use flow::VirtualFlow;
pub use invalidation::Invalidation;
pub use items::{ItemKey, ItemList, TableItem};
pub use metrics::LayoutMetrics;
pub use skin::{LayoutEnv, RowContext, RowLayoutExtension, TableRowSkin};
pub use table::TableView;
pub use tree::{NodeId, NodeKind, SceneTree};
