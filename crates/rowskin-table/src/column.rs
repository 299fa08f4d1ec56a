//! Column definitions and value bindings.

use std::fmt;
use std::sync::Arc;

use crate::error::{TableError, TableResult};

/// Stable identity of a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(Arc<str>);

impl ColumnId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColumnId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A value read from or written to an item through a column.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Integer(v)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Bool(v)
    }
}

type Getter<T> = Box<dyn Fn(&T) -> CellValue>;
type Setter<T> = Box<dyn Fn(&mut T, CellValue)>;

/// A table column: identity, width, and optional value bindings.
///
/// # Example
/// ```
/// use rowskin_table::column::{CellValue, Column};
///
/// struct Person { name: String }
///
/// let column = Column::new("name", "Name")
///     .width(120.0)
///     .getter(|p: &Person| CellValue::from(p.name.as_str()))
///     .setter(|p: &mut Person, v| {
///         if let CellValue::Text(s) = v {
///             p.name = s;
///         }
///     });
/// assert!(column.is_editable());
/// ```
pub struct Column<T> {
    id: ColumnId,
    header: String,
    width: f32,
    getter: Option<Getter<T>>,
    setter: Option<Setter<T>>,
}

impl<T> Column<T> {
    pub const DEFAULT_WIDTH: f32 = 80.0;

    pub fn new(id: impl AsRef<str>, header: impl Into<String>) -> Self {
        Self {
            id: ColumnId::new(id),
            header: header.into(),
            width: Self::DEFAULT_WIDTH,
            getter: None,
            setter: None,
        }
    }

    pub fn width(mut self, width: f32) -> Self {
        self.width = width.max(0.0);
        self
    }

    pub fn getter(mut self, getter: impl Fn(&T) -> CellValue + 'static) -> Self {
        self.getter = Some(Box::new(getter));
        self
    }

    pub fn setter(mut self, setter: impl Fn(&mut T, CellValue) + 'static) -> Self {
        self.setter = Some(Box::new(setter));
        self
    }

    pub fn id(&self) -> &ColumnId {
        &self.id
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn column_width(&self) -> f32 {
        self.width
    }

    pub fn is_editable(&self) -> bool {
        self.setter.is_some()
    }

    /// Read the column's value from `item`; unbound columns read as empty.
    pub fn value(&self, item: &T) -> CellValue {
        self.getter
            .as_ref()
            .map(|get| get(item))
            .unwrap_or_default()
    }

    /// Write `value` into `item`.
    pub fn set_value(&self, item: &mut T, value: CellValue) -> TableResult<()> {
        let set = self
            .setter
            .as_ref()
            .ok_or_else(|| TableError::ReadOnlyColumn(self.id.clone()))?;
        set(item, value);
        Ok(())
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("width", &self.width)
            .field("editable", &self.is_editable())
            .finish()
    }
}

/// Ordered set of columns with unique ids.
#[derive(Debug)]
pub struct ColumnSet<T> {
    columns: Vec<Column<T>>,
}

impl<T> ColumnSet<T> {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Register a column, rejecting duplicate ids.
    pub fn add(&mut self, column: Column<T>) -> TableResult<()> {
        if self.position(column.id()).is_some() {
            return Err(TableError::DuplicateColumn(column.id().clone()));
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn get(&self, id: &ColumnId) -> TableResult<&Column<T>> {
        self.columns
            .iter()
            .find(|c| c.id() == id)
            .ok_or_else(|| TableError::UnknownColumn(id.clone()))
    }

    pub fn position(&self, id: &ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| c.id() == id)
    }

    pub fn at(&self, index: usize) -> Option<&Column<T>> {
        self.columns.get(index)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column<T>> {
        self.columns.iter()
    }

    /// Left edge of the column at `index`, relative to the row's content box.
    pub fn offset_of(&self, index: usize) -> f32 {
        self.columns
            .iter()
            .take(index)
            .map(|c| c.column_width())
            .sum()
    }

    pub fn total_width(&self) -> f32 {
        self.columns.iter().map(|c| c.column_width()).sum()
    }
}

impl<T> Default for ColumnSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        qty: i64,
    }

    fn qty_column() -> Column<Row> {
        Column::new("qty", "Quantity")
            .width(50.0)
            .getter(|r: &Row| CellValue::Integer(r.qty))
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let mut columns = ColumnSet::new();
        columns.add(qty_column()).unwrap();
        let err = columns.add(qty_column()).unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn(ColumnId::new("qty")));
    }

    #[test]
    fn test_write_without_setter_fails_loudly() {
        let column = qty_column();
        let mut row = Row { qty: 1 };
        let err = column.set_value(&mut row, CellValue::Integer(5)).unwrap_err();
        assert_eq!(err, TableError::ReadOnlyColumn(ColumnId::new("qty")));
        assert_eq!(row.qty, 1);
    }

    #[test]
    fn test_offsets_accumulate_widths() {
        let mut columns = ColumnSet::<Row>::new();
        columns.add(Column::new("a", "A").width(30.0)).unwrap();
        columns.add(Column::new("b", "B").width(45.0)).unwrap();
        columns.add(Column::new("c", "C")).unwrap();
        assert_eq!(columns.offset_of(0), 0.0);
        assert_eq!(columns.offset_of(2), 75.0);
        assert_eq!(columns.total_width(), 75.0 + Column::<Row>::DEFAULT_WIDTH);
    }

    #[test]
    fn test_unbound_getter_reads_empty() {
        let column = Column::<Row>::new("x", "X");
        assert_eq!(column.value(&Row { qty: 3 }), CellValue::Empty);
    }
}
