//! # Resources & List Queries
//!
//! Every backend resource follows the same path scheme:
//!
//! ```text
//! /{prefix}/index          GET     list (plain array)
//! /{prefix}/filter         GET     paginated list { invoices | data, total }
//! /{prefix}/show/:id       GET     one record
//! /{prefix}/store          POST    create, returns the record
//! /{prefix}/update/:id     PUT     update
//! /{prefix}/delete/:id     DELETE  delete
//! ```
//!
//! Plus a few lookups that do not fit the scheme: `/item/with-units/:id`,
//! `/branch/by-user/:id`, `/warehouse/branch/:id` and `/user/agent`.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use serde::Deserialize;
use souq_core::{InvoiceKind, ValidationError};

// =============================================================================
// Resource Paths
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    SellInvoice,
    SellItem,
    BuyInvoice,
    BuyItem,
    BuyReturnInvoice,
    BuyReturnItem,
    Item,
    ItemUnit,
    Currency,
    Customer,
    Branch,
    Warehouse,
    Driver,
    /// Employees are users.
    User,
    Payment,
}

impl Resource {
    pub const fn prefix(&self) -> &'static str {
        match self {
            Resource::SellInvoice => "sell-invoice",
            Resource::SellItem => "sell-item",
            Resource::BuyInvoice => "buy-invoice",
            Resource::BuyItem => "buy-item",
            Resource::BuyReturnInvoice => "buy-return-invoice",
            Resource::BuyReturnItem => "buy-return-item",
            Resource::Item => "item",
            Resource::ItemUnit => "item-unit",
            Resource::Currency => "currency",
            Resource::Customer => "customer",
            Resource::Branch => "branch",
            Resource::Warehouse => "warehouse",
            Resource::Driver => "driver",
            Resource::User => "user",
            Resource::Payment => "payment",
        }
    }

    /// Header resource of an invoice kind.
    pub const fn invoice(kind: InvoiceKind) -> Resource {
        match kind {
            InvoiceKind::Sell => Resource::SellInvoice,
            InvoiceKind::Buy => Resource::BuyInvoice,
            InvoiceKind::BuyReturn => Resource::BuyReturnInvoice,
        }
    }

    /// Line resource of an invoice kind.
    pub const fn lines(kind: InvoiceKind) -> Resource {
        match kind {
            InvoiceKind::Sell => Resource::SellItem,
            InvoiceKind::Buy => Resource::BuyItem,
            InvoiceKind::BuyReturn => Resource::BuyReturnItem,
        }
    }

    pub fn index(&self) -> String {
        format!("/{}/index", self.prefix())
    }

    pub fn filter(&self) -> String {
        format!("/{}/filter", self.prefix())
    }

    pub fn show(&self, id: i64) -> String {
        format!("/{}/show/{}", self.prefix(), id)
    }

    pub fn store(&self) -> String {
        format!("/{}/store", self.prefix())
    }

    pub fn update(&self, id: i64) -> String {
        format!("/{}/update/{}", self.prefix(), id)
    }

    pub fn delete(&self, id: i64) -> String {
        format!("/{}/delete/{}", self.prefix(), id)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

pub fn item_with_units(item_id: i64) -> String {
    format!("/item/with-units/{}", item_id)
}

pub fn branches_by_user(user_id: i64) -> String {
    format!("/branch/by-user/{}", user_id)
}

pub fn warehouses_by_branch(branch_id: i64) -> String {
    format!("/warehouse/branch/{}", branch_id)
}

pub const AGENTS: &str = "/user/agent";

// =============================================================================
// Sorting & Date Ranges
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn toggled(self) -> SortOrder {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ValidationError::NotAllowed {
                field: "sortOrder".to_string(),
                allowed: vec!["asc".into(), "desc".into()],
            }),
        }
    }
}

/// Inclusive date range for report filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// Lists open on today's invoices.
    pub fn today() -> Self {
        let today = Local::now().date_naive();
        DateRange::new(today, today)
    }
}

// =============================================================================
// List Query
// =============================================================================

/// Pagination, sort, search and filter parameters of a list request.
///
/// Empty values are left out of the query string so the backend treats
/// them as "no filter".
///
/// ## Example
/// ```rust
/// use souq_client::resource::{ListQuery, SortOrder};
///
/// let query = ListQuery::new()
///     .page(1, 25)
///     .sort("invoice_date", SortOrder::Desc)
///     .search("")
///     .filter("branch_id", 3);
///
/// let keys: Vec<String> = query.to_pairs().into_iter().map(|(k, _)| k).collect();
/// assert_eq!(keys, ["page", "limit", "sortBy", "sortOrder", "branch_id"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub search: Option<String>,
    pub dates: Option<DateRange>,
    pub filters: Vec<(String, String)>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32, limit: u32) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(field.into());
        self.sort_order = Some(order);
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn dates(mut self, range: DateRange) -> Self {
        self.dates = Some(range);
        self
    }

    /// Adds a foreign-key or type filter such as `branch_id=3`.
    pub fn filter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push((key.into(), value.to_string()));
        self
    }

    /// Query pairs for `/filter` endpoints.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.pairs_with("limit", "search")
    }

    /// Query pairs for `/index` endpoints that page with `pageSize` and
    /// search by `name`.
    pub fn to_index_pairs(&self) -> Vec<(String, String)> {
        self.pairs_with("pageSize", "name")
    }

    fn pairs_with(&self, limit_key: &str, search_key: &str) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut push = |key: &str, value: Option<String>| {
            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                pairs.push((key.to_string(), value));
            }
        };

        push("page", self.page.map(|p| p.to_string()));
        push(limit_key, self.limit.map(|l| l.to_string()));
        push("sortBy", self.sort_by.clone());
        push("sortOrder", self.sort_order.map(|o| o.as_str().to_string()));
        push(search_key, self.search.clone());
        push("startDate", self.dates.map(|d| d.start.to_string()));
        push("endDate", self.dates.map(|d| d.end.to_string()));
        for (key, value) in &self.filters {
            push(key, Some(value.clone()));
        }

        pairs
    }
}

// =============================================================================
// Paginated Responses
// =============================================================================

/// One page of a `/filter` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<T> {
    #[serde(rename = "invoices", alias = "data", default = "Vec::new")]
    pub rows: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl<T> Page<T> {
    /// Total matching rows; the page length when the backend omits it.
    pub fn total(&self) -> u64 {
        self.total.unwrap_or(self.rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_paths() {
        let r = Resource::invoice(InvoiceKind::BuyReturn);
        assert_eq!(r.index(), "/buy-return-invoice/index");
        assert_eq!(r.filter(), "/buy-return-invoice/filter");
        assert_eq!(r.show(4), "/buy-return-invoice/show/4");
        assert_eq!(r.store(), "/buy-return-invoice/store");
        assert_eq!(r.update(4), "/buy-return-invoice/update/4");
        assert_eq!(r.delete(4), "/buy-return-invoice/delete/4");

        assert_eq!(Resource::lines(InvoiceKind::Sell).store(), "/sell-item/store");
        assert_eq!(Resource::lines(InvoiceKind::Buy).index(), "/buy-item/index");
        assert_eq!(item_with_units(7), "/item/with-units/7");
        assert_eq!(branches_by_user(2), "/branch/by-user/2");
        assert_eq!(warehouses_by_branch(5), "/warehouse/branch/5");
    }

    #[test]
    fn test_query_skips_empty_values() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let query = ListQuery::new()
            .page(2, 10)
            .search("  ")
            .dates(DateRange::new(day, day))
            .filter("customer_id", "")
            .filter("currency_id", 1);

        assert_eq!(
            query.to_pairs(),
            vec![
                ("page".to_string(), "2".to_string()),
                ("limit".to_string(), "10".to_string()),
                ("startDate".to_string(), "2024-03-01".to_string()),
                ("endDate".to_string(), "2024-03-01".to_string()),
                ("currency_id".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_index_pairs_use_page_size_and_name() {
        let query = ListQuery::new().page(1, 5).search("Karwan");
        let keys: Vec<String> = query.to_index_pairs().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["page", "pageSize", "name"]);
    }

    #[test]
    fn test_sort_order() {
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert!("up".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::default().toggled(), SortOrder::Asc);
    }

    #[test]
    fn test_today_is_single_day() {
        let range = DateRange::today();
        assert_eq!(range.start, range.end);
    }

    #[test]
    fn test_page_accepts_invoices_or_data() {
        let page: Page<i64> = serde_json::from_value(json!({"invoices": [1, 2], "total": 12})).unwrap();
        assert_eq!(page.rows, vec![1, 2]);
        assert_eq!(page.total(), 12);

        let page: Page<i64> = serde_json::from_value(json!({"data": [3]})).unwrap();
        assert_eq!(page.rows, vec![3]);
        assert_eq!(page.total(), 1);

        let page: Page<i64> = serde_json::from_value(json!({})).unwrap();
        assert!(page.rows.is_empty());
    }
}
