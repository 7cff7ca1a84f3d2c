//! Command-line parsing.

use anyhow::{Context, bail};
use invoicemint_core::{CompanyId, InvoiceId};
use invoicemint_invoicing::InvoiceStatus;

pub const USAGE: &str = "\
usage: invoicemint <command>

  companies                                   list companies (* marks current)
  company add <name> <address> <prefix>       create a company
  use <company-id>                            select the current company
  invoices [search]                           list the current company's invoices
  invoice add <customer> <customer-address> <description> <quantity> <unit-price> [tax-rate]
  invoice status <invoice-id> <status>        draft | sent | paid | overdue
  invoice delete <invoice-id>
  summary                                     dashboard for the current company
  print <invoice-id>                          plain-text invoice
  export [file]                               write a backup document
  import <file>                               replace all data with a backup

Data is kept under INVOICEMINT_DATA_DIR; without it nothing outlives the process.";

#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoice {
    pub customer: String,
    pub customer_address: String,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub tax_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Companies,
    AddCompany {
        name: String,
        address: String,
        prefix: String,
    },
    Use(CompanyId),
    Invoices(Option<String>),
    AddInvoice(NewInvoice),
    SetStatus(InvoiceId, InvoiceStatus),
    DeleteInvoice(InvoiceId),
    Summary,
    Print(InvoiceId),
    Export(Option<String>),
    Import(String),
}

fn number(field: &str, raw: &str) -> anyhow::Result<f64> {
    raw.trim()
        .parse()
        .with_context(|| format!("{field} must be a number, got {raw:?}"))
}

impl Command {
    pub fn parse<S: AsRef<str>>(args: &[S]) -> anyhow::Result<Self> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        let command = match args.as_slice() {
            ["companies"] => Self::Companies,
            ["company", "add", name, address, prefix] => Self::AddCompany {
                name: name.to_string(),
                address: address.to_string(),
                prefix: prefix.to_string(),
            },
            ["use", id] => Self::Use(id.parse()?),
            ["invoices"] => Self::Invoices(None),
            ["invoices", term] => Self::Invoices(Some(term.to_string())),
            ["invoice", "add", customer, address, description, quantity, price, rest @ ..]
                if rest.len() <= 1 =>
            {
                Self::AddInvoice(NewInvoice {
                    customer: customer.to_string(),
                    customer_address: address.to_string(),
                    description: description.to_string(),
                    quantity: number("quantity", quantity)?,
                    unit_price: number("unit price", price)?,
                    tax_rate: match rest.first() {
                        Some(rate) => number("tax rate", rate)?,
                        None => 0.0,
                    },
                })
            }
            ["invoice", "status", id, status] => Self::SetStatus(id.parse()?, status.parse()?),
            ["invoice", "delete", id] => Self::DeleteInvoice(id.parse()?),
            ["summary"] => Self::Summary,
            ["print", id] => Self::Print(id.parse()?),
            ["export"] => Self::Export(None),
            ["export", path] => Self::Export(Some(path.to_string())),
            ["import", path] => Self::Import(path.to_string()),
            _ => bail!(USAGE),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_invoice_add_with_and_without_tax() {
        let args = ["invoice", "add", "Globex", "2 Ave", "Consulting", "2", "50"];
        let cmd = Command::parse(&args).unwrap();
        let Command::AddInvoice(new) = cmd else {
            panic!("expected an invoice add command");
        };
        assert_eq!((new.quantity, new.unit_price, new.tax_rate), (2.0, 50.0, 0.0));
        assert_eq!(new.customer, "Globex");

        let args = ["invoice", "add", "Globex", "2 Ave", "Work", "1.5", "19.99", "8.25"];
        let cmd = Command::parse(&args).unwrap();
        assert!(
            matches!(cmd, Command::AddInvoice(NewInvoice { tax_rate, .. }) if tax_rate == 8.25)
        );
    }

    #[test]
    fn parses_status_changes_case_insensitively() {
        let cmd = Command::parse(&["invoice", "status", "inv-1", "PAID"]).unwrap();
        assert_eq!(cmd, Command::SetStatus("inv-1".parse().unwrap(), InvoiceStatus::Paid));
        assert!(Command::parse(&["invoice", "status", "inv-1", "void"]).is_err());
    }

    #[test]
    fn rejects_bad_numbers_and_unknown_commands() {
        assert!(Command::parse(&["invoice", "add", "G", "A", "D", "two", "5"]).is_err());
        let extra = ["invoice", "add", "G", "A", "D", "1", "5", "10", "extra"];
        assert!(Command::parse(&extra).is_err());
        assert!(Command::parse::<&str>(&[]).is_err());
        assert!(Command::parse(&["frobnicate"]).is_err());
    }

    #[test]
    fn parses_company_add_and_optional_arguments() {
        assert_eq!(
            Command::parse(&["company", "add", "Acme", "1 Rd", "A-"]).unwrap(),
            Command::AddCompany {
                name: "Acme".into(),
                address: "1 Rd".into(),
                prefix: "A-".into(),
            }
        );
        assert_eq!(Command::parse(&["export"]).unwrap(), Command::Export(None));
        assert_eq!(
            Command::parse(&["invoices", "globex"]).unwrap(),
            Command::Invoices(Some("globex".into()))
        );
    }
}
