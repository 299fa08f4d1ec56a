//! Rowskin - row skins for virtualized tables
//!
//! Rowskin lays out the rows of a virtualized table and lets per-row behavior
//! hook into every layout pass:
//!
//! - **Dirty-cell decoration**: a corner marker over each cell holding an
//!   uncommitted edit
//! - **Expandable rows**: per-item content hosted under the row's cells
//! - **Recycling**: rows are rebound to new items as the view scrolls, with
//!   an explicit rebind hook for cleanup
//!
//! # Quick Start
//!
//! ```ignore
//! use rowskin::prelude::*;
//!
//! rowskin::init_logging();
//!
//! let mut table: TableView<Person> = TableView::new();
//! table.add_column(Column::new("name", "Name").getter(|p: &Person| p.name.as_str().into()))?;
//! table.enable_dirty_tracking();
//! table.set_viewport(640.0, 480.0);
//!
//! let metrics = table.layout_pass();
//! tracing::info!("{}", metrics.format_summary());
//! ```
//!
//! Run the headless demo with: `cargo run -p rowskin --example edit_session`

// Re-export core types
pub use rowskin_core as core;
pub use rowskin_core::math;

#[cfg(feature = "table")]
pub use rowskin_table as table;

/// Install the default `tracing` subscriber, filtered by `ROWSKIN_LOG`.
pub fn init_logging() {
    rowskin_core::logging::init();
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use rowskin_core::geometry::{Insets, Rect};
    pub use rowskin_core::{Color, math::Vec2};

    #[cfg(feature = "table")]
    pub use rowskin_table::{
        CellValue, Column, ColumnId, ContentBuilder, DirtyDecoration, EditModel, ExpandableRow,
        ExpansionProvider, ItemKey, LayoutMetrics, RowExpander, RowLayoutExtension, SkinConfig,
        TableError, TableResult, TableView,
    };
}
