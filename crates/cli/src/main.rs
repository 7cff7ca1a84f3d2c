//! `invoicemint`: terminal front end over an invoicing session.
//!
//! Storage location and delete policy come from the environment (see
//! `invoicemint_infra::config`). Without `INVOICEMINT_DATA_DIR` the session is
//! in-memory and every run starts empty.

mod command;
mod render;

use anyhow::Context;
use invoicemint_companies::{Company, CompanyDraft};
use invoicemint_infra::{AppConfig, InvoiceRenderer, KeyValueStorage, Session, SharedStorage};
use invoicemint_invoicing::{Customer, InvoiceDraft, InvoiceItem, InvoicePatch, format_money};

use command::{Command, NewInvoice};
use render::TextRenderer;

fn main() -> anyhow::Result<()> {
    invoicemint_observability::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(args.as_slice())?;

    let config = AppConfig::from_env();
    let mut session = Session::open(&config).context("failed to open invoice storage")?;
    let result = run(&mut session, command);

    for warning in session.drain_persistence_warnings() {
        eprintln!("warning: could not persist {warning}");
    }
    result
}

fn current_company<S>(session: &Session<S>) -> anyhow::Result<Company>
where
    S: KeyValueStorage + Clone,
{
    session
        .current_company()
        .cloned()
        .context("no company selected (see `invoicemint use <company-id>`)")
}

fn invoice_draft(new: NewInvoice) -> InvoiceDraft {
    InvoiceDraft {
        tax_rate: new.tax_rate,
        ..InvoiceDraft::new(
            chrono::Utc::now().date_naive(),
            Customer::new(new.customer, new.customer_address),
            vec![InvoiceItem::new(new.description, new.quantity, new.unit_price)],
        )
    }
}

fn run(session: &mut Session<SharedStorage>, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Companies => {
            let current = session.current_company().map(|c| c.id_typed().clone());
            for company in session.companies().list() {
                let is_current = Some(company.id_typed()) == current.as_ref();
                let marker = if is_current { "*" } else { " " };
                println!(
                    "{marker} {}  {}  next {}",
                    company.id_typed(),
                    company.name(),
                    company.next_invoice_number()
                );
            }
        }
        Command::AddCompany {
            name,
            address,
            prefix,
        } => {
            let company = session.create_company(CompanyDraft::new(name, address, prefix))?;
            println!("{}  {}", company.id_typed(), company.name());
        }
        Command::Use(id) => session.set_current_company(&id)?,
        Command::Invoices(term) => {
            let company = current_company(session)?;
            let term = term.unwrap_or_default();
            for invoice in session.invoices().search(company.id_typed(), &term) {
                println!(
                    "{}  {}  {}  {}  {}",
                    invoice.id_typed(),
                    invoice.invoice_number(),
                    invoice.customer().name,
                    format_money(company.currency(), invoice.total()),
                    invoice.status()
                );
            }
        }
        Command::AddInvoice(new) => {
            let invoice = session.create_invoice(invoice_draft(new))?;
            println!("{}  {}", invoice.id_typed(), invoice.invoice_number());
        }
        Command::SetStatus(id, status) => {
            let invoice = session.update_invoice(&id, InvoicePatch::status(status))?;
            println!("{}  {}", invoice.invoice_number(), invoice.status());
        }
        Command::DeleteInvoice(id) => session.delete_invoice(&id)?,
        Command::Summary => {
            let company = current_company(session)?;
            let summary = session.current_summary()?;
            let money = |amount| format_money(company.currency(), amount);
            println!("{}", company.name());
            println!("invoices: {}  total: {}", summary.invoice_count, money(summary.total_amount));
            println!("paid:     {}  amount: {}", summary.paid_count, money(summary.paid_amount));
            println!(
                "overdue:  {}  amount: {}",
                summary.overdue_count,
                money(summary.overdue_amount)
            );
            for invoice in &summary.recent {
                println!(
                    "  {}  {}  {}",
                    invoice.invoice_number(),
                    invoice.customer().name,
                    money(invoice.total())
                );
            }
            let orphans = session.orphaned_invoices().len();
            if orphans > 0 {
                println!("({orphans} invoice(s) belong to deleted companies)");
            }
        }
        Command::Print(id) => {
            let ctx = session.print_context(&id)?;
            print!("{}", TextRenderer.render(&ctx));
        }
        Command::Export(path) => {
            let document = session.export_backup();
            let path = path.unwrap_or_else(|| document.file_name());
            let json = document.to_json_pretty()?;
            std::fs::write(&path, json).with_context(|| format!("failed to write {path}"))?;
            tracing::info!(path = %path, "backup exported");
            println!("exported to {path}");
        }
        Command::Import(path) => {
            let bytes = std::fs::read(&path).with_context(|| format!("failed to read {path}"))?;
            let summary = session.import_backup(&bytes)?;
            println!(
                "imported {} companies and {} invoices",
                summary.companies, summary.invoices
            );
        }
    }
    Ok(())
}
