use crate::column::ColumnId;

/// Errors raised by the table's configuration and edit API.
///
/// Layout passes never produce these; they only surface where a caller
/// binds columns or writes values through them.
#[derive(Debug, Clone, PartialEq)]
pub enum TableError {
    /// A column with this id is already registered.
    DuplicateColumn(ColumnId),

    /// No column with this id is registered.
    UnknownColumn(ColumnId),

    /// The column has no setter bound, so values cannot be written through it.
    ReadOnlyColumn(ColumnId),

    /// The row index does not address an item in the current list.
    IndexOutOfRange { index: usize, len: usize },
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::DuplicateColumn(id) => write!(f, "Column already registered: {}", id),
            TableError::UnknownColumn(id) => write!(f, "Unknown column: {}", id),
            TableError::ReadOnlyColumn(id) => {
                write!(f, "Column {} has no setter bound and cannot be edited", id)
            }
            TableError::IndexOutOfRange { index, len } => {
                write!(f, "Row index {} out of range (item count: {})", index, len)
            }
        }
    }
}

impl std::error::Error for TableError {}

/// Result type for table configuration and edit operations.
pub type TableResult<T> = Result<T, TableError>;
