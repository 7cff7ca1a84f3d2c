//! Plain-text invoice layout for terminal output.

use std::fmt::Write as _;

use invoicemint_infra::{InvoiceRenderer, PrintContext};

pub struct TextRenderer;

impl InvoiceRenderer for TextRenderer {
    type Output = String;

    fn render(&self, ctx: &PrintContext) -> String {
        let invoice = &ctx.invoice;
        let company = &ctx.company;
        let mut out = String::new();

        let _ = writeln!(out, "{}", company.name());
        let _ = writeln!(out, "{}", company.address());
        let _ = writeln!(out);
        let _ = writeln!(out, "Invoice {}  [{}]", invoice.invoice_number(), invoice.status());
        let _ = writeln!(out, "Date:     {}", invoice.date().format("%b %-d, %Y"));
        let _ = writeln!(out, "Due:      {}", invoice.due_date().format("%b %-d, %Y"));
        let _ = writeln!(out);
        let customer = invoice.customer();
        let _ = writeln!(out, "Bill to:  {}", customer.name);
        let _ = writeln!(out, "          {}", customer.address);
        for contact in [&customer.email, &customer.phone].into_iter().flatten() {
            let _ = writeln!(out, "          {contact}");
        }
        let _ = writeln!(out);

        for item in invoice.items() {
            let _ = writeln!(
                out,
                "{:<32} {:>8} x {:>12} = {:>12}",
                item.description,
                item.quantity,
                ctx.money(item.unit_price),
                ctx.money(item.total)
            );
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{:>58} {:>12}", "Subtotal", ctx.money(invoice.subtotal()));
        let _ = writeln!(
            out,
            "{:>58} {:>12}",
            format!("Tax ({}%)", invoice.tax_rate()),
            ctx.money(invoice.tax_amount())
        );
        let _ = writeln!(out, "{:>58} {:>12}", "Total", ctx.money(invoice.total()));

        if let Some(notes) = invoice.notes() {
            let _ = writeln!(out);
            let _ = writeln!(out, "{notes}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::NaiveDate;
    use invoicemint_companies::CompanyDraft;
    use invoicemint_infra::{DeletePolicy, InMemoryStorage, Session};
    use invoicemint_invoicing::{Customer, InvoiceDraft, InvoiceItem};

    #[test]
    fn renders_lines_and_totals() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut session = Session::with_storage(storage, DeletePolicy::Orphan);
        session
            .create_company(CompanyDraft {
                notes: "Thank you!".into(),
                ..CompanyDraft::new("Acme", "1 Rd", "A-")
            })
            .unwrap();
        let mut customer = Customer::new("Globex", "2 Ave");
        customer.email = Some("ap@globex.test".into());
        let invoice = session
            .create_invoice(InvoiceDraft {
                tax_rate: 10.0,
                ..InvoiceDraft::new(
                    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                    customer,
                    vec![InvoiceItem::new("Consulting", 2.0, 50.0)],
                )
            })
            .unwrap();

        let text = TextRenderer.render(&session.print_context(invoice.id_typed()).unwrap());
        assert!(text.contains("Invoice A-001  [draft]"));
        assert!(text.contains("Due:      Mar 31, 2024"));
        assert!(text.contains("ap@globex.test"));
        assert!(text.contains("$110.00"));
        assert!(text.trim_end().ends_with("Thank you!"));
    }
}
