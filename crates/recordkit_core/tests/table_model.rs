use recordkit_core::table::Accessor;
use recordkit_core::{
    AccessorTable, CellValue, ColumnDescriptor, ColumnType, TableError, TableEvent, TableModel,
};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
struct Customer {
    name: String,
    credit: i64,
    active: bool,
}

impl Customer {
    fn new(name: &str, credit: i64, active: bool) -> Self {
        Self {
            name: name.to_string(),
            credit,
            active,
        }
    }
}

fn get_name(customer: &Customer) -> CellValue {
    CellValue::from(customer.name.as_str())
}

fn get_credit(customer: &Customer) -> CellValue {
    CellValue::from(customer.credit)
}

fn is_active(customer: &Customer) -> CellValue {
    CellValue::from(customer.active)
}

impl AccessorTable for Customer {
    fn accessors() -> Vec<(&'static str, Accessor<Self>)> {
        vec![
            ("getName", get_name as Accessor<Self>),
            ("getCredit", get_credit),
            ("isActive", is_active),
        ]
    }
}

fn recording_model() -> (TableModel<Customer>, Rc<RefCell<Vec<TableEvent>>>) {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let mut model = TableModel::new();
    model.add_listener(move |event| sink.borrow_mut().push(*event));
    model.add_column(ColumnDescriptor::new("Name", "name", ColumnType::Text));
    model.add_column(ColumnDescriptor::new("Credit", "credit", ColumnType::Integer));
    model.add_column(ColumnDescriptor::new("Active", "Active", ColumnType::Boolean));
    model.load_available_methods();
    (model, events)
}

#[test]
fn remove_row_notifies_exact_index() {
    let (mut model, events) = recording_model();
    let r1 = Customer::new("Ada", 10, true);
    let r2 = Customer::new("Brook", 20, false);
    let r3 = Customer::new("Cyd", 30, true);

    model.set_data(vec![r1.clone(), r2.clone(), r3.clone()]);
    assert_eq!(model.row_count(), 3);

    assert_eq!(model.remove_row(&r2), Some(r2.clone()));
    assert_eq!(model.row_count(), 2);
    assert_eq!(model.rows(), &[r1, r3]);
    assert_eq!(
        events.borrow().as_slice(),
        &[
            TableEvent::DataChanged,
            TableEvent::RowsDeleted { first: 1, last: 1 }
        ]
    );

    assert_eq!(model.remove_row(&r2), None);
    assert_eq!(events.borrow().len(), 2);
}

#[test]
fn add_row_notifies_new_index() {
    let (mut model, events) = recording_model();
    model.set_data(vec![Customer::new("Ada", 10, true)]);

    let index = model.add_row(Customer::new("Brook", 20, false));
    assert_eq!(index, 1);
    assert_eq!(
        events.borrow().last(),
        Some(&TableEvent::RowsInserted { first: 1, last: 1 })
    );

    model.clear_data();
    assert_eq!(model.row_count(), 0);
    assert_eq!(events.borrow().last(), Some(&TableEvent::DataChanged));
}

#[test]
fn columns_resolve_accessors_ignoring_case() {
    let (mut model, _) = recording_model();
    model.add_row(Customer::new("Ada", 10, true));

    assert_eq!(model.column_count(), 3);
    assert_eq!(model.column_name(2), Ok("Active"));
    assert_eq!(model.column_type(2), Ok(ColumnType::Boolean));
    assert_eq!(model.value_at(0, 0), Ok(CellValue::Text("Ada".to_string())));
    assert_eq!(model.value_at(0, 1), Ok(CellValue::Integer(10)));
    assert_eq!(model.value_at(0, 2), Ok(CellValue::Boolean(true)));
}

#[test]
fn missing_accessor_is_misconfiguration() {
    let (mut model, _) = recording_model();
    model.add_column(ColumnDescriptor::new("Email", "email", ColumnType::Text));
    // Boolean columns never fall back to `get<Property>`.
    model.add_column(ColumnDescriptor::new("Named", "name", ColumnType::Boolean));
    model.add_row(Customer::new("Ada", 10, true));

    let err = model.value_at(0, 3).unwrap_err();
    assert!(matches!(&err, TableError::Misconfiguration(message) if message.contains("getemail")));
    assert!(matches!(
        model.value_at(0, 4),
        Err(TableError::Misconfiguration(_))
    ));
}
