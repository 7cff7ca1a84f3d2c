//! End-to-end flows through `Session` over the in-memory and file backends.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;

use invoicemint_companies::{CompanyDraft, MAX_PAYMENT_TERMS};
use invoicemint_core::FixedClock;
use invoicemint_infra::snapshot::{COMPANIES_KEY, INVOICES_KEY};
use invoicemint_infra::{
    AppConfig, DeletePolicy, ImportError, InMemoryStorage, InvoiceRenderer, InvoiceStore,
    KeyValueStorage, PrintContext, Session,
};
use invoicemint_invoicing::{Customer, Invoice, InvoiceDraft, InvoiceItem, InvoiceStatus};

fn new_session() -> (Arc<InMemoryStorage>, Session<Arc<InMemoryStorage>>) {
    let storage = Arc::new(InMemoryStorage::new());
    let session = Session::with_storage(storage.clone(), DeletePolicy::Orphan);
    (storage, session)
}

fn acme_draft() -> CompanyDraft {
    CompanyDraft {
        name: "Acme".into(),
        address: "1 Rd".into(),
        invoice_prefix: "A-".into(),
        invoice_counter: 1,
        currency: "$".into(),
        notes: String::new(),
        payment_terms: 30,
    }
}

fn invoice_draft(quantity: f64, unit_price: f64, tax_rate: f64) -> InvoiceDraft {
    InvoiceDraft {
        tax_rate,
        ..InvoiceDraft::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            Customer::new("Globex", "2 Ave"),
            vec![InvoiceItem::new("Consulting", quantity, unit_price)],
        )
    }
}

#[test]
fn acme_first_invoice() {
    let (_, mut session) = new_session();
    let acme = session.create_company(acme_draft()).unwrap();
    assert_eq!(session.current_company().unwrap().id_typed(), acme.id_typed());

    let invoice = session.create_invoice(invoice_draft(2.0, 50.0, 10.0)).unwrap();
    assert_eq!(invoice.subtotal(), 100.0);
    assert_eq!(invoice.tax_amount(), 10.0);
    assert_eq!(invoice.total(), 110.0);
    assert_eq!(invoice.invoice_number(), "A-001");
    assert_eq!(invoice.due_date(), NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
    assert_eq!(session.current_company().unwrap().invoice_counter(), 2);
}

#[test]
fn numbering_pads_and_grows() {
    let (_, mut session) = new_session();
    session
        .create_company(CompanyDraft {
            invoice_prefix: "INV-".into(),
            invoice_counter: 7,
            ..acme_draft()
        })
        .unwrap();
    let seventh = session.create_invoice(invoice_draft(1.0, 1.0, 0.0)).unwrap();
    assert_eq!(seventh.invoice_number(), "INV-007");

    let (_, mut session) = new_session();
    session
        .create_company(CompanyDraft {
            invoice_prefix: "INV-".into(),
            invoice_counter: 1042,
            ..acme_draft()
        })
        .unwrap();
    let big = session.create_invoice(invoice_draft(1.0, 1.0, 0.0)).unwrap();
    assert_eq!(big.invoice_number(), "INV-1042");
}

#[test]
fn deleting_only_company_orphans_its_invoices() {
    let (_, mut session) = new_session();
    let acme = session.create_company(acme_draft()).unwrap();
    session.create_invoice(invoice_draft(1.0, 10.0, 0.0)).unwrap();
    session.create_invoice(invoice_draft(1.0, 20.0, 0.0)).unwrap();

    session.delete_company(acme.id_typed()).unwrap();
    assert!(session.current_company().is_none());
    assert_eq!(session.invoices().list_by_company(acme.id_typed()).len(), 2);
    assert_eq!(session.orphaned_invoices().len(), 2);
}

#[test]
fn import_missing_invoices_key_changes_nothing() {
    let (storage, mut session) = new_session();
    session.create_company(acme_draft()).unwrap();
    session.create_invoice(invoice_draft(1.0, 10.0, 0.0)).unwrap();
    let companies_before = storage.raw(COMPANIES_KEY);
    let invoices_before = storage.raw(INVOICES_KEY);

    let doc = serde_json::json!({ "companies": [] });
    let err = session.import_backup(doc.to_string().as_bytes()).unwrap_err();
    assert!(matches!(err, ImportError::Format(_)));

    assert_eq!(storage.raw(COMPANIES_KEY), companies_before);
    assert_eq!(storage.raw(INVOICES_KEY), invoices_before);
    assert_eq!(session.companies().list().len(), 1);
    assert_eq!(session.invoices().list().len(), 1);
}

#[test]
fn export_then_import_into_fresh_session() {
    let (_, mut source) = new_session();
    source.create_company(acme_draft()).unwrap();
    let created = source.create_invoice(invoice_draft(3.0, 33.3, 7.5)).unwrap();
    let document = source.export_backup().to_json_pretty().unwrap();

    let (_, mut target) = new_session();
    target.create_company(CompanyDraft::new("Other", "9 Ln", "O-")).unwrap();
    let summary = target.import_backup(document.as_bytes()).unwrap();
    assert_eq!((summary.companies, summary.invoices), (1, 1));

    // Full overwrite, no merge.
    assert_eq!(target.companies().list(), source.companies().list());
    assert_eq!(target.current_company().unwrap().name(), "Acme");
    assert_eq!(target.invoices().get(created.id_typed()), Some(&created));
}

#[test]
fn snapshot_round_trip_preserves_dates_and_numbers() {
    let storage = Arc::new(InMemoryStorage::new());
    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 58).unwrap()));
    let mut session = Session::with_clock(storage.clone(), DeletePolicy::Orphan, clock);
    session.create_company(acme_draft()).unwrap();
    let mut draft = invoice_draft(1.5, 19.99, 8.25);
    draft.items.push(InvoiceItem::new("Hosting", 12.0, 4.2));
    draft.due_date = Some(NaiveDate::from_ymd_opt(2024, 4, 15).unwrap());
    draft.status = InvoiceStatus::Sent;
    let created = session.create_invoice(draft).unwrap();

    let bytes = storage.load(INVOICES_KEY).unwrap().unwrap();
    let decoded: Vec<Invoice> = serde_json::from_slice(&bytes).unwrap();
    let back = &decoded[0];
    assert_eq!(back.date(), created.date());
    assert_eq!(back.due_date(), created.due_date());
    assert_eq!(back.created_at(), created.created_at());
    assert_eq!(back.updated_at(), created.updated_at());
    assert_eq!(back.subtotal(), created.subtotal());
    assert_eq!(back.tax_rate(), created.tax_rate());
    assert_eq!(back.tax_amount(), created.tax_amount());
    assert_eq!(back.total(), created.total());
    assert_eq!(back, &created);

    let reopened = Session::with_storage(storage, DeletePolicy::Orphan);
    assert_eq!(reopened.invoices().list(), &[created]);
}

#[test]
fn stringly_snapshot_from_older_build_is_coerced() {
    let storage = Arc::new(InMemoryStorage::new());
    storage.put_raw(
        COMPANIES_KEY,
        serde_json::json!([{
            "id": "1",
            "name": "Company A",
            "address": "123 Business St",
            "invoicePrefix": "INV-A",
            "invoiceCounter": "5",
            "currency": "$",
            "notes": "",
            "createdAt": "2024-01-01T00:00:00.000Z",
            "updatedAt": "2024-01-01T00:00:00.000Z"
        }])
        .to_string(),
    );
    storage.put_raw(
        INVOICES_KEY,
        serde_json::json!([{
            "id": "1712000000000",
            "companyId": "1",
            "invoiceNumber": "INV-A004",
            "date": "2024-03-01T00:00:00.000Z",
            "dueDate": "2024-03-31T00:00:00.000Z",
            "customer": { "name": "Globex", "address": "2 Ave" },
            "items": [{
                "id": "x",
                "description": "Work",
                "quantity": "4",
                "unitPrice": "25",
                "total": "1"
            }],
            "subtotal": "1",
            "taxRate": "10",
            "taxAmount": "0",
            "total": "1",
            "status": "paid",
            "createdAt": "2024-03-01T09:00:00.000Z",
            "updatedAt": "2024-03-01T09:00:00.000Z"
        }, { "id": "broken" }])
        .to_string(),
    );

    let mut session = Session::with_storage(storage, DeletePolicy::Orphan);
    let company = session.current_company().unwrap().clone();
    assert_eq!(company.invoice_counter(), 5);
    assert_eq!(company.payment_terms(), 30);

    let invoices = session.current_invoices().unwrap();
    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0].total(), 110.0);
    assert_eq!(invoices[0].items()[0].total, 100.0);

    let warnings = session.drain_persistence_warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].key, INVOICES_KEY);

    let next = session.create_invoice(invoice_draft(1.0, 1.0, 0.0)).unwrap();
    assert_eq!(next.invoice_number(), "INV-A005");
}

#[test]
fn file_backend_survives_restart() {
    let dir = std::env::temp_dir().join(format!("invoicemint-scenario-{}", uuid::Uuid::now_v7()));
    let config = AppConfig {
        data_dir: Some(dir.clone()),
        delete_policy: DeletePolicy::Cascade,
    };

    let invoice_id = {
        let mut session = Session::open(&config).unwrap();
        session.create_company(acme_draft()).unwrap();
        session.create_invoice(invoice_draft(2.0, 50.0, 10.0)).unwrap().id_typed().clone()
    };

    let session = Session::open(&config).unwrap();
    assert_eq!(session.current_company().unwrap().invoice_counter(), 2);
    assert_eq!(session.invoices().get(&invoice_id).unwrap().total(), 110.0);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn out_of_range_due_dates_fail_without_consuming_a_number() {
    let (_, mut session) = new_session();
    let err = session
        .create_company(CompanyDraft {
            payment_terms: 200_000_000,
            ..acme_draft()
        })
        .unwrap_err();
    assert!(err.is_validation());

    session
        .create_company(CompanyDraft {
            payment_terms: MAX_PAYMENT_TERMS,
            ..acme_draft()
        })
        .unwrap();
    let mut late = invoice_draft(1.0, 1.0, 0.0);
    late.date = NaiveDate::MAX;
    assert!(session.create_invoice(late).unwrap_err().is_validation());
    assert_eq!(session.current_company().unwrap().invoice_counter(), 1);
    assert!(session.invoices().list().is_empty());
}

struct PlainText;

impl InvoiceRenderer for PlainText {
    type Output = String;

    fn render(&self, ctx: &PrintContext) -> String {
        format!(
            "{} {} {}",
            ctx.company.name(),
            ctx.invoice.invoice_number(),
            ctx.money(ctx.invoice.total())
        )
    }
}

#[test]
fn renderer_receives_computed_invoice() {
    let (_, mut session) = new_session();
    session.create_company(acme_draft()).unwrap();
    let invoice = session.create_invoice(invoice_draft(2.0, 50.0, 10.0)).unwrap();
    let ctx = session.print_context(invoice.id_typed()).unwrap();
    assert_eq!(PlainText.render(&ctx), "Acme A-001 $110.00");
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    /// Property: a successful create moves the counter from n to n + 1, a
    /// rejected one leaves it at n.
    #[test]
    fn counter_moves_only_on_success(start in 1u32..100_000, valid in any::<bool>()) {
        let (_, mut session) = new_session();
        session
            .create_company(CompanyDraft {
                invoice_counter: start,
                ..acme_draft()
            })
            .unwrap();

        let quantity = if valid { 1.0 } else { 0.0 };
        let result = session.create_invoice(invoice_draft(quantity, 10.0, 5.0));
        let counter = session.current_company().unwrap().invoice_counter();

        if valid {
            prop_assert!(result.is_ok());
            prop_assert_eq!(counter, start + 1);
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(counter, start);
        }
    }

    /// Property: whatever amounts an invoice carries, reopening the store
    /// yields the same record, totals included.
    #[test]
    fn invoice_snapshot_round_trips_arbitrary_amounts(
        quantity in 1e-9f64..1e9,
        unit_price in 0.0f64..1e9,
        tax_rate in 0.0f64..=100.0,
    ) {
        let (storage, mut session) = new_session();
        session.create_company(acme_draft()).unwrap();
        let created = session
            .create_invoice(invoice_draft(quantity, unit_price, tax_rate))
            .unwrap();

        let reopened = InvoiceStore::open(storage);
        prop_assert_eq!(reopened.get(created.id_typed()), Some(&created));
    }
}
