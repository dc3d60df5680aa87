//! CLI smoke entry point.
//!
//! # Responsibility
//! - Exercise config, session, service and table wiring end to end.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `recordkit_cli [CONFIG_DIR]` (defaults to the current directory).

use clap::Parser;
use log::error;
use recordkit_core::table::Accessor;
use recordkit_core::{
    init_logging_from_config, AccessorTable, AppConfig, CellAlignment, CellValue,
    ColumnDescriptor, ColumnType, DataResult, DataSession, Entity, EntityService,
    GeneralDataService, MemoryGateway, QueryFilter, RecordId, TableModel,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Seeds a demo invoice store and prints the open invoices as a table.
#[derive(Debug, Parser)]
#[command(name = "recordkit_cli", version, about, long_about = None)]
struct Cli {
    /// Directory holding `defaultConfig.properties`
    config_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Invoice {
    id: Option<RecordId>,
    customer: String,
    status: String,
    amount: i64,
    paid: bool,
}

impl Entity for Invoice {
    const COLLECTION: &'static str = "invoices";

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    fn validate(&self) -> Result<(), String> {
        if self.customer.trim().is_empty() {
            return Err("customer must not be blank".to_string());
        }
        Ok(())
    }
}

impl AccessorTable for Invoice {
    fn accessors() -> Vec<(&'static str, Accessor<Self>)> {
        vec![
            ("getCustomer", invoice_customer as Accessor<Self>),
            ("getStatus", invoice_status),
            ("getAmount", invoice_amount),
            ("isPaid", invoice_paid),
        ]
    }
}

fn invoice_customer(invoice: &Invoice) -> CellValue {
    CellValue::from(invoice.customer.as_str())
}

fn invoice_status(invoice: &Invoice) -> CellValue {
    CellValue::from(invoice.status.as_str())
}

fn invoice_amount(invoice: &Invoice) -> CellValue {
    CellValue::from(invoice.amount)
}

fn invoice_paid(invoice: &Invoice) -> CellValue {
    CellValue::from(invoice.paid)
}

fn invoice(customer: &str, status: &str, amount: i64, paid: bool) -> Invoice {
    Invoice {
        id: None,
        customer: customer.to_string(),
        status: status.to_string(),
        amount,
        paid,
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_run module=cli status=error error={}", message);
            eprintln!("recordkit_cli: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let dir = match cli.config_dir {
        Some(dir) => dir,
        None => std::env::current_dir()
            .map_err(|err| format!("cannot resolve config directory: {err}"))?,
    };

    let defaults = BTreeMap::from([("min_amount".to_string(), "100".to_string())]);
    let mut config = AppConfig::new("recordkit demo", None, Some(&dir), defaults);
    config.load().map_err(|err| err.to_string())?;
    if config.property("log_dir").is_some() {
        init_logging_from_config(&config)?;
    }
    let min_amount = config
        .property("min_amount")
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(100);

    println!("recordkit_core version={}", recordkit_core::core_version());
    println!("config file={}", config.file().display());

    let gateway = Arc::new(MemoryGateway::new());
    let mut session =
        DataSession::open(gateway, &config.session_config()).map_err(|err| err.to_string())?;
    let records = load_open_invoices(&mut session, min_amount).map_err(|err| err.to_string())?;
    session.close().map_err(|err| err.to_string())?;

    let mut model: TableModel<Invoice> = TableModel::new();
    model.add_column(ColumnDescriptor::new("Customer", "customer", ColumnType::Text));
    model.add_column(ColumnDescriptor::new("Amount", "amount", ColumnType::Integer));
    model.add_column(ColumnDescriptor::new("Paid", "paid", ColumnType::Boolean));
    model.load_available_methods();
    model.set_data(records);

    print_table(&model).map_err(|err| err.to_string())
}

fn load_open_invoices(
    session: &mut DataSession<MemoryGateway>,
    min_amount: i64,
) -> DataResult<Vec<Invoice>> {
    let mut service = EntityService::<_, Invoice>::new(session);
    for record in [
        invoice("Northwind", "OPEN", 150, false),
        invoice("Contoso", "OPEN", 40, true),
        invoice("Fabrikam", "OPEN", 320, true),
        invoice("Tailspin", "CLOSED", 900, true),
    ] {
        service.create_or_update(record)?;
    }

    let filter = QueryFilter::and([
        QueryFilter::equal("status", "OPEN"),
        QueryFilter::greater_equal("amount", min_amount),
    ]);
    println!("filter: {filter}");
    service.get_records_list(&filter, Some("amount"), false)
}

fn print_table(model: &TableModel<Invoice>) -> recordkit_core::TableResult<()> {
    let mut rows = Vec::with_capacity(model.row_count() + 1);
    let mut header = Vec::with_capacity(model.column_count());
    for column in 0..model.column_count() {
        header.push(model.column_name(column)?.to_string());
    }
    rows.push(header);
    for row in 0..model.row_count() {
        let mut cells = Vec::with_capacity(model.column_count());
        for column in 0..model.column_count() {
            cells.push(model.value_at(row, column)?.to_string());
        }
        rows.push(cells);
    }

    let widths = (0..model.column_count())
        .map(|column| rows.iter().map(|cells| cells[column].len()).max().unwrap_or(0))
        .collect::<Vec<_>>();
    for cells in &rows {
        let mut line = String::new();
        for (column, cell) in cells.iter().enumerate() {
            let width = widths[column];
            let aligned = match model.column_type(column)?.alignment() {
                CellAlignment::Leading => format!("{cell:<width$}"),
                CellAlignment::Center => format!("{cell:^width$}"),
                CellAlignment::Trailing => format!("{cell:>width$}"),
            };
            if column > 0 {
                line.push_str(" | ");
            }
            line.push_str(&aligned);
        }
        println!("{}", line.trim_end());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn config_dir_is_optional_positional() {
        let cli = Cli::try_parse_from(["recordkit_cli", "/srv/billing"]).unwrap();
        assert_eq!(cli.config_dir, Some(PathBuf::from("/srv/billing")));

        let cli = Cli::try_parse_from(["recordkit_cli"]).unwrap();
        assert!(cli.config_dir.is_none());
    }

    #[test]
    fn extra_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["recordkit_cli", "a", "b"]).is_err());
    }
}
