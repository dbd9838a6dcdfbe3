//! # Invoice Repository
//!
//! Invoice headers and their lines, for one invoice kind.
//!
//! ## Save Chain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         save(&mut form)                                 │
//! │                                                                         │
//! │  1. form.to_payload()            validation errors stop here           │
//! │                                                                         │
//! │  2. new invoice?                                                       │
//! │     ├── yes: POST /{kind}-invoice/store     → id, no stored lines      │
//! │     └── no:  PUT  /{kind}-invoice/update/id                            │
//! │              GET  /{kind}-item/index?{fk}=id → stored lines            │
//! │                                                                         │
//! │  3. reconcile::plan(stored, form lines)                                │
//! │                                                                         │
//! │  4. one request per op, in order, awaited one at a time                │
//! │     Create → POST   /{kind}-item/store                                 │
//! │     Update → PUT    /{kind}-item/update/:line                          │
//! │     Delete → DELETE /{kind}-item/delete/:line                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first failing request ends the save. Nothing is rolled back; saving
//! again re-reads the stored lines and converges.

use serde::Deserialize;
use souq_core::invoice::{line_payload, InvoiceForm};
use souq_core::pricing::LineItem;
use souq_core::reconcile::{self, LineOp};
use souq_core::{
    CoreError, InvoiceKind, InvoiceRecord, InvoiceSummary, StoredLine, ValidationError,
};
use tracing::{debug, info};

use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;
use crate::resource::{ListQuery, Page, Resource};

/// Invoice header with its stored lines.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceWithLines {
    pub record: InvoiceRecord,
    pub lines: Vec<StoredLine>,
}

impl InvoiceWithLines {
    pub fn summary(&self, kind: InvoiceKind) -> InvoiceSummary {
        InvoiceSummary::from_record(&self.record, kind)
    }

    /// Editable form seeded from the stored invoice.
    pub fn to_form(&self, kind: InvoiceKind) -> InvoiceForm {
        InvoiceForm::from_record(kind, &self.record, &self.lines)
    }
}

/// What a save did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveOutcome {
    pub invoice_id: i64,
    /// The header was created rather than updated.
    pub created: bool,
    pub lines_created: usize,
    pub lines_updated: usize,
    pub lines_deleted: usize,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: i64,
}

#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    api: ApiClient,
    kind: InvoiceKind,
}

impl InvoiceRepository {
    pub fn new(api: ApiClient, kind: InvoiceKind) -> Self {
        InvoiceRepository { api, kind }
    }

    pub fn kind(&self) -> InvoiceKind {
        self.kind
    }

    fn headers(&self) -> Resource {
        Resource::invoice(self.kind)
    }

    fn line_resource(&self) -> Resource {
        Resource::lines(self.kind)
    }

    /// Header and lines, fetched in parallel.
    pub async fn show(&self, id: i64) -> ClientResult<InvoiceWithLines> {
        let show_path = self.headers().show(id);
        let (record, lines) = tokio::try_join!(
            self.api.get::<InvoiceRecord>(&show_path, &[]),
            self.lines(id),
        )?;
        Ok(InvoiceWithLines { record, lines })
    }

    /// Stored lines of an invoice.
    pub async fn lines(&self, invoice_id: i64) -> ClientResult<Vec<StoredLine>> {
        let query = [(
            self.kind.line_foreign_key().to_string(),
            invoice_id.to_string(),
        )];
        self.api.get(&self.line_resource().index(), &query).await
    }

    /// One page of invoices matching `query`.
    pub async fn filter(&self, query: &ListQuery) -> ClientResult<Page<InvoiceRecord>> {
        let page: Page<InvoiceRecord> = self
            .api
            .get(&self.headers().filter(), &query.to_pairs())
            .await?;
        debug!(kind = %self.kind, rows = page.rows.len(), total = page.total(), "Invoices filtered");
        Ok(page)
    }

    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        self.api.delete(&self.headers().delete(id)).await?;
        info!(kind = %self.kind, id, "Invoice deleted");
        Ok(())
    }

    /// Stores or updates the header, then brings the stored lines in line
    /// with the form. A new invoice gets its id set on the form.
    pub async fn save(&self, form: &mut InvoiceForm) -> ClientResult<SaveOutcome> {
        if form.kind() != self.kind {
            return Err(ClientError::Core(CoreError::Validation(
                ValidationError::NotAllowed {
                    field: "kind".to_string(),
                    allowed: vec![self.kind.to_string()],
                },
            )));
        }

        let payload = form.to_payload()?;

        let mut outcome = SaveOutcome::default();
        let stored = match form.id() {
            Some(id) => {
                self.api.put(&self.headers().update(id), &payload).await?;
                outcome.invoice_id = id;
                self.lines(id).await?
            }
            None => {
                let created: Created = self.api.post(&self.headers().store(), &payload).await?;
                form.set_id(created.id);
                outcome.invoice_id = created.id;
                outcome.created = true;
                Vec::new()
            }
        };

        let desired: Vec<LineItem> = form.lines().items().cloned().collect();
        let ops = reconcile::plan(&stored, &desired);
        debug!(
            kind = %self.kind,
            invoice_id = outcome.invoice_id,
            stored = stored.len(),
            ops = ops.len(),
            "Reconciling invoice lines"
        );

        for op in &ops {
            self.apply(op, outcome.invoice_id).await?;
            match op {
                LineOp::Create(_) => outcome.lines_created += 1,
                LineOp::Update { .. } => outcome.lines_updated += 1,
                LineOp::Delete { .. } => outcome.lines_deleted += 1,
            }
        }

        info!(
            kind = %self.kind,
            invoice_id = outcome.invoice_id,
            created = outcome.created,
            lines_created = outcome.lines_created,
            lines_updated = outcome.lines_updated,
            lines_deleted = outcome.lines_deleted,
            "Invoice saved"
        );
        Ok(outcome)
    }

    async fn apply(&self, op: &LineOp, invoice_id: i64) -> ClientResult<()> {
        let lines = self.line_resource();
        match op {
            LineOp::Create(line) => {
                let body = line_payload(self.kind, line, invoice_id);
                let _: serde_json::Value = self.api.post(&lines.store(), &body).await?;
            }
            LineOp::Update { stored_id, line } => {
                let body = line_payload(self.kind, line, invoice_id);
                self.api.put(&lines.update(*stored_id), &body).await?;
            }
            LineOp::Delete { stored_id } => {
                self.api.delete(&lines.delete(*stored_id)).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::testing::StubServer;
    use chrono::NaiveDate;
    use souq_core::pricing::UnitCatalog;
    use souq_core::{Money, PaymentType, Quantity, Rate};

    fn repo(base_url: &str, kind: InvoiceKind) -> InvoiceRepository {
        let mut config = ClientConfig::default();
        config.api.url = base_url.to_string();
        InvoiceRepository::new(ApiClient::new(&config).unwrap(), kind)
    }

    fn line(item_id: i64, unit_id: i64, qty: i64, price: i64) -> LineItem {
        let unit_price = Money::from_major(price);
        LineItem {
            item_id,
            item_name: None,
            unit_id,
            quantity: Quantity::from_units(qty),
            unit_price,
            base_price: unit_price,
            total: unit_price * qty,
        }
    }

    fn ready_form(kind: InvoiceKind) -> InvoiceForm {
        let mut form = InvoiceForm::new(kind, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        form.set_payment_type(PaymentType::Cash);
        form.customer_id = Some(3);
        form.branch_id = Some(1);
        form.warehouse_id = Some(2);
        form.employee_id = Some(4);
        form.change_currency(1, Rate::ONE, &UnitCatalog::default());
        form
    }

    #[tokio::test]
    async fn test_save_new_invoice_creates_header_then_lines() {
        let server = StubServer::start(&[
            ("POST", "/buy-invoice/store", 200, r#"{"id": 41}"#),
            ("POST", "/buy-item/store", 200, r#"{"id": 1}"#),
        ])
        .await;
        let repo = repo(&server.base_url, InvoiceKind::Buy);

        let mut form = ready_form(InvoiceKind::Buy);
        form.add_line(line(7, 1, 2, 50));
        form.add_line(line(8, 1, 1, 10));

        let outcome = repo.save(&mut form).await.unwrap();
        assert_eq!(outcome.invoice_id, 41);
        assert!(outcome.created);
        assert_eq!(outcome.lines_created, 2);
        assert_eq!(form.id(), Some(41));

        let requests = server.requests();
        assert_eq!(requests.len(), 3);
        let header = requests[0].json();
        assert_eq!(header["total_amount"], 110.0);
        assert!(header.get("amount_transport").is_none());
        assert_eq!(requests[1].json()["buy_invoice_id"], 41);
        assert_eq!(requests[2].json()["item_id"], 8);
    }

    #[tokio::test]
    async fn test_save_existing_invoice_reconciles_lines() {
        let server = StubServer::start(&[
            ("PUT", "/sell-invoice/update/9", 200, "{}"),
            (
                "GET",
                "/sell-item/index",
                200,
                r#"[
                    {"id": 100, "item_id": {"id": 7, "name": "Rice"}, "item_unit_id": 1, "quantity": "2", "unit_price": "50", "total_amount": "100"},
                    {"id": 101, "item_id": 8, "item_unit_id": 1, "quantity": 1, "unit_price": 10, "total_amount": 10}
                ]"#,
            ),
            ("PUT", "/sell-item/update/100", 200, "{}"),
            ("POST", "/sell-item/store", 200, r#"{"id": 102}"#),
            ("DELETE", "/sell-item/delete/101", 200, "{}"),
        ])
        .await;
        let repo = repo(&server.base_url, InvoiceKind::Sell);

        let mut form = ready_form(InvoiceKind::Sell);
        form.set_id(9);
        form.add_line(line(7, 1, 3, 50));
        form.add_line(line(9, 2, 1, 25));

        let outcome = repo.save(&mut form).await.unwrap();
        assert!(!outcome.created);
        assert_eq!(
            (outcome.lines_created, outcome.lines_updated, outcome.lines_deleted),
            (1, 1, 1)
        );

        assert_eq!(
            server.calls(),
            vec![
                "PUT /sell-invoice/update/9",
                "GET /sell-item/index?invoice_id=9",
                "PUT /sell-item/update/100",
                "POST /sell-item/store",
                "DELETE /sell-item/delete/101",
            ]
        );
        let update = server.requests()[2].json();
        assert_eq!(update["invoice_id"], 9);
        assert_eq!(update["quantity"], 3.0);
    }

    #[tokio::test]
    async fn test_invalid_form_sends_nothing() {
        let server = StubServer::start(&[]).await;
        let repo = repo(&server.base_url, InvoiceKind::Sell);

        let mut form = InvoiceForm::new(InvoiceKind::Sell, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        let err = repo.save(&mut form).await.unwrap_err();

        assert!(matches!(err, ClientError::Core(CoreError::InvalidFields(_))));
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn test_kind_mismatch_is_rejected() {
        let server = StubServer::start(&[]).await;
        let repo = repo(&server.base_url, InvoiceKind::BuyReturn);

        let mut form = ready_form(InvoiceKind::Buy);
        form.add_line(line(1, 1, 1, 1));
        assert!(repo.save(&mut form).await.is_err());
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn test_failed_line_request_stops_the_chain() {
        let server = StubServer::start(&[
            ("POST", "/buy-return-invoice/store", 200, r#"{"id": 5}"#),
            ("POST", "/buy-return-item/store", 422, r#"{"message": "Out of stock"}"#),
        ])
        .await;
        let repo = repo(&server.base_url, InvoiceKind::BuyReturn);

        let mut form = ready_form(InvoiceKind::BuyReturn);
        form.add_line(line(1, 1, 1, 5));
        form.add_line(line(2, 1, 1, 5));

        let err = repo.save(&mut form).await.unwrap_err();
        assert_eq!(err.user_message(), "Out of stock");
        assert_eq!(form.id(), Some(5));
        assert_eq!(server.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_show_and_filter() {
        let server = StubServer::start(&[
            (
                "GET",
                "/sell-invoice/show/3",
                200,
                r#"{"id": 3, "type": "cash", "currency_id": 1, "total_amount": "1,000", "amount_transport": 20, "discount_result": 100, "loan": 50}"#,
            ),
            (
                "GET",
                "/sell-item/index",
                200,
                r#"[{"id": 1, "item_id": 2, "item_unit_id": 1, "quantity": 10, "unit_price": 100, "total_amount": 1000}]"#,
            ),
            (
                "GET",
                "/sell-invoice/filter",
                200,
                r#"{"invoices": [{"id": 3, "total_amount": 1000}], "total": 14}"#,
            ),
        ])
        .await;
        let repo = repo(&server.base_url, InvoiceKind::Sell);

        let invoice = repo.show(3).await.unwrap();
        assert_eq!(invoice.lines.len(), 1);
        let summary = invoice.summary(InvoiceKind::Sell);
        assert_eq!(summary.grand_total, Money::from_major(970));

        let form = invoice.to_form(InvoiceKind::Sell);
        assert_eq!(form.lines().len(), 1);
        assert!(form.is_editing());

        let page = repo
            .filter(&ListQuery::new().page(1, 10).filter("branch_id", 2))
            .await
            .unwrap();
        assert_eq!(page.total(), 14);
        assert!(server
            .calls()
            .contains(&"GET /sell-invoice/filter?page=1&limit=10&branch_id=2".to_string()));
    }
}
