//! Record-list table model.

use super::column::{Accessor, AccessorTable, CellValue, ColumnDescriptor, ColumnType};
use super::{TableError, TableEvent, TableResult};
use log::debug;
use std::fmt::{Debug, Formatter};

enum ColumnBinding<T> {
    /// Resolved through the accessor table at render time.
    Property(String),
    Accessor(Box<dyn Fn(&T) -> CellValue>),
}

struct TableColumn<T> {
    header: String,
    data_type: ColumnType,
    binding: ColumnBinding<T>,
}

type Listener = Box<dyn FnMut(&TableEvent)>;

/// Grid view over an ordered list of records.
///
/// Single-threaded; owned by the view that renders it.
pub struct TableModel<T> {
    rows: Vec<T>,
    columns: Vec<TableColumn<T>>,
    accessors: Option<Vec<(&'static str, Accessor<T>)>>,
    listeners: Vec<Listener>,
}

impl<T> Default for TableModel<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            columns: Vec::new(),
            accessors: None,
            listeners: Vec::new(),
        }
    }
}

impl<T> Debug for TableModel<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableModel")
            .field("row_count", &self.rows.len())
            .field(
                "columns",
                &self
                    .columns
                    .iter()
                    .map(|column| column.header.as_str())
                    .collect::<Vec<_>>(),
            )
            .field("accessors_loaded", &self.accessors.is_some())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<T> TableModel<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column resolved by property name.
    pub fn add_column(&mut self, descriptor: ColumnDescriptor) {
        self.columns.push(TableColumn {
            header: descriptor.header,
            data_type: descriptor.data_type,
            binding: ColumnBinding::Property(descriptor.property),
        });
    }

    /// Appends a column bound to `accessor`; it never needs the accessor table.
    pub fn add_accessor_column<F>(
        &mut self,
        header: impl Into<String>,
        data_type: ColumnType,
        accessor: F,
    ) where
        F: Fn(&T) -> CellValue + 'static,
    {
        self.columns.push(TableColumn {
            header: header.into(),
            data_type,
            binding: ColumnBinding::Accessor(Box::new(accessor)),
        });
    }

    /// Caches the accessor table of `T`, replacing any previous cache.
    pub fn load_available_methods(&mut self)
    where
        T: AccessorTable,
    {
        let accessors = T::accessors();
        debug!(
            "event=table_accessors_load module=table status=ok accessor_count={}",
            accessors.len()
        );
        self.accessors = Some(accessors);
    }

    /// Registers a change listener.
    pub fn add_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&TableEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Replaces every row.
    pub fn set_data(&mut self, rows: impl IntoIterator<Item = T>) {
        self.rows = rows.into_iter().collect();
        self.notify(TableEvent::DataChanged);
    }

    pub fn clear_data(&mut self) {
        self.rows.clear();
        self.notify(TableEvent::DataChanged);
    }

    /// Appends one row and returns its index.
    pub fn add_row(&mut self, row: T) -> usize {
        self.rows.push(row);
        let index = self.rows.len() - 1;
        self.notify(TableEvent::RowsInserted {
            first: index,
            last: index,
        });
        index
    }

    /// Removes the first row equal to `row`.
    ///
    /// Returns `None` without notifying when no row matches.
    pub fn remove_row(&mut self, row: &T) -> Option<T>
    where
        T: PartialEq,
    {
        let index = self.rows.iter().position(|candidate| candidate == row)?;
        Some(self.take_row(index))
    }

    pub fn remove_row_at(&mut self, index: usize) -> TableResult<T> {
        self.check_row(index)?;
        Ok(self.take_row(index))
    }

    pub fn row(&self, index: usize) -> TableResult<&T> {
        self.check_row(index)?;
        Ok(&self.rows[index])
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_name(&self, index: usize) -> TableResult<&str> {
        Ok(self.column(index)?.header.as_str())
    }

    pub fn column_type(&self, index: usize) -> TableResult<ColumnType> {
        Ok(self.column(index)?.data_type)
    }

    /// Renders the cell at `row`, `column`.
    ///
    /// Name-bound columns look up `is<Property>` for boolean columns and
    /// `get<Property>` otherwise, ignoring case.
    pub fn value_at(&self, row: usize, column: usize) -> TableResult<CellValue> {
        let record = self.row(row)?;
        let column = self.column(column)?;
        let property = match &column.binding {
            ColumnBinding::Accessor(accessor) => return Ok(accessor(record)),
            ColumnBinding::Property(property) => property,
        };

        let accessors = self.accessors.as_ref().ok_or_else(|| {
            TableError::Misconfiguration(format!(
                "accessor table not loaded; cannot render column `{}`",
                column.header
            ))
        })?;
        let requested = format!("{}{}", column.data_type.accessor_prefix(), property);
        let accessor = accessors
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&requested))
            .map(|(_, accessor)| *accessor)
            .ok_or_else(|| {
                TableError::Misconfiguration(format!(
                    "accessor `{requested}` not found for column `{}`",
                    column.header
                ))
            })?;
        Ok(accessor(record))
    }

    fn column(&self, index: usize) -> TableResult<&TableColumn<T>> {
        self.columns.get(index).ok_or(TableError::ColumnOutOfBounds {
            index,
            column_count: self.columns.len(),
        })
    }

    fn check_row(&self, index: usize) -> TableResult<()> {
        if index < self.rows.len() {
            Ok(())
        } else {
            Err(TableError::RowOutOfBounds {
                index,
                row_count: self.rows.len(),
            })
        }
    }

    fn take_row(&mut self, index: usize) -> T {
        let removed = self.rows.remove(index);
        self.notify(TableEvent::RowsDeleted {
            first: index,
            last: index,
        });
        removed
    }

    fn notify(&mut self, event: TableEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TableModel;
    use crate::table::{
        Accessor, AccessorTable, CellValue, ColumnDescriptor, ColumnType, TableError, TableEvent,
    };
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: &'static str,
        done: bool,
    }

    impl AccessorTable for Row {
        fn accessors() -> Vec<(&'static str, Accessor<Self>)> {
            vec![
                ("getName", (|row: &Row| CellValue::from(row.name)) as Accessor<Self>),
                ("isDone", (|row: &Row| CellValue::from(row.done)) as Accessor<Self>),
            ]
        }
    }

    fn row(name: &'static str) -> Row {
        Row { name, done: false }
    }

    #[test]
    fn out_of_range_indices_are_errors() {
        let mut model: TableModel<Row> = TableModel::new();
        model.add_column(ColumnDescriptor::new("Name", "name", ColumnType::Text));
        model.load_available_methods();
        model.set_data(vec![row("a")]);

        assert_eq!(
            model.value_at(1, 0),
            Err(TableError::RowOutOfBounds {
                index: 1,
                row_count: 1
            })
        );
        assert_eq!(
            model.value_at(0, 3),
            Err(TableError::ColumnOutOfBounds {
                index: 3,
                column_count: 1
            })
        );
        assert!(model.remove_row_at(5).is_err());
    }

    #[test]
    fn unloaded_accessor_table_is_misconfiguration() {
        let mut model: TableModel<Row> = TableModel::new();
        model.add_column(ColumnDescriptor::new("Name", "name", ColumnType::Text));
        model.add_row(row("a"));

        assert!(matches!(
            model.value_at(0, 0),
            Err(TableError::Misconfiguration(_))
        ));
    }

    #[test]
    fn remove_row_at_notifies_exact_index() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let mut model: TableModel<Row> = TableModel::new();
        model.add_listener(move |event| sink.borrow_mut().push(*event));
        model.set_data(vec![row("a"), row("b"), row("c")]);

        let removed = model.remove_row_at(2).unwrap();
        assert_eq!(removed.name, "c");
        assert_eq!(
            events.borrow().as_slice(),
            &[
                TableEvent::DataChanged,
                TableEvent::RowsDeleted { first: 2, last: 2 }
            ]
        );
    }

    #[test]
    fn accessor_columns_render_without_accessor_table() {
        let mut model: TableModel<Row> = TableModel::new();
        model.add_accessor_column("Length", ColumnType::Integer, |row: &Row| {
            CellValue::from(row.name.len() as i64)
        });
        model.add_row(row("abcd"));

        assert_eq!(model.value_at(0, 0), Ok(CellValue::Integer(4)));
        assert_eq!(model.column_type(0), Ok(ColumnType::Integer));
    }
}
