//! # Catalog Repository
//!
//! Lookups the invoice forms and list filters need before they can be used.
//!
//! ```text
//! Invoice form opens
//!   ├─ tokio::try_join!  /item/index + /item-unit/index + /currency/index
//!   ├─ /branch/by-user/:user   → branch list, first one preselected
//!   └─ /warehouse/branch/:id   → warehouses for the chosen branch
//!
//! Item chosen          → /item/with-units/:id
//! Currency chosen      → /currency/show/:id → exchange rate (1 on failure)
//! ```

use souq_core::pricing::UnitCatalog;
use souq_core::{Branch, Currency, Employee, Item, ItemUnit, ItemWithUnits, Rate, Warehouse};
use tracing::{debug, warn};

use crate::error::ClientResult;
use crate::http::ApiClient;
use crate::repository::entity::Entity;
use crate::resource::{self, Resource};

/// Lookups for the invoice form.
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    pub items: Vec<Item>,
    pub units: Vec<ItemUnit>,
    pub currencies: Vec<Currency>,
}

impl Lookups {
    pub fn unit_catalog(&self) -> UnitCatalog {
        UnitCatalog::new(self.units.clone())
    }

    pub fn currency(&self, id: i64) -> Option<&Currency> {
        self.currencies.iter().find(|c| c.id == id)
    }
}

/// Lookups for the invoice list filters.
///
/// The `*_id` resolvers take either a numeric id (passed through as is) or
/// a name, matched case-insensitively. Currencies also match their symbol.
#[derive(Debug, Clone, Default)]
pub struct FilterLookups {
    pub branches: Vec<Branch>,
    pub warehouses: Vec<Warehouse>,
    pub currencies: Vec<Currency>,
    pub employees: Vec<Employee>,
}

impl FilterLookups {
    pub fn branch_id(&self, input: &str) -> Option<i64> {
        resolve(input, self.branches.iter().map(|b| (b.id, b.name.as_str())))
    }

    pub fn warehouse_id(&self, input: &str) -> Option<i64> {
        resolve(input, self.warehouses.iter().map(|w| (w.id, w.name.as_str())))
    }

    pub fn currency_id(&self, input: &str) -> Option<i64> {
        resolve(input, self.currencies.iter().map(|c| (c.id, c.name.as_str()))).or_else(|| {
            self.currencies
                .iter()
                .find(|c| c.symbol.as_deref().is_some_and(|s| s.eq_ignore_ascii_case(input.trim())))
                .map(|c| c.id)
        })
    }

    pub fn employee_id(&self, input: &str) -> Option<i64> {
        resolve(input, self.employees.iter().map(|e| (e.id, e.name.as_str())))
    }
}

fn resolve<'a>(input: &str, mut candidates: impl Iterator<Item = (i64, &'a str)>) -> Option<i64> {
    let input = input.trim();
    if let Ok(id) = input.parse::<i64>() {
        return Some(id);
    }
    candidates
        .find(|(_, name)| name.trim().to_lowercase() == input.to_lowercase())
        .map(|(id, _)| id)
}

#[derive(Debug, Clone)]
pub struct CatalogRepository {
    api: ApiClient,
}

impl CatalogRepository {
    pub fn new(api: ApiClient) -> Self {
        CatalogRepository { api }
    }

    /// Loads items, units and currencies in parallel.
    pub async fn load_lookups(&self) -> ClientResult<Lookups> {
        let (items, units, currencies) = tokio::try_join!(
            self.all::<Item>(),
            self.all::<ItemUnit>(),
            self.all::<Currency>(),
        )?;

        debug!(
            items = items.len(),
            units = units.len(),
            currencies = currencies.len(),
            "Lookups loaded"
        );
        Ok(Lookups {
            items,
            units,
            currencies,
        })
    }

    /// Loads branches, warehouses, currencies and employees in parallel.
    pub async fn load_filter_lookups(&self) -> ClientResult<FilterLookups> {
        let (branches, warehouses, currencies, employees) = tokio::try_join!(
            self.all::<Branch>(),
            self.all::<Warehouse>(),
            self.all::<Currency>(),
            self.all::<Employee>(),
        )?;

        debug!(
            branches = branches.len(),
            warehouses = warehouses.len(),
            "Filter lookups loaded"
        );
        Ok(FilterLookups {
            branches,
            warehouses,
            currencies,
            employees,
        })
    }

    async fn all<T: Entity>(&self) -> ClientResult<Vec<T>> {
        self.api.get(&T::RESOURCE.index(), &[]).await
    }

    pub async fn item_with_units(&self, item_id: i64) -> ClientResult<ItemWithUnits> {
        self.api.get(&resource::item_with_units(item_id), &[]).await
    }

    /// Sales agents, for the sell form.
    pub async fn agents(&self) -> ClientResult<Vec<Employee>> {
        self.api.get(resource::AGENTS, &[]).await
    }

    /// Exchange rate of a currency.
    ///
    /// No currency, a failed lookup, or a missing/zero rate all read as 1.
    pub async fn exchange_rate(&self, currency_id: Option<i64>) -> Rate {
        let Some(id) = currency_id else {
            return Rate::ONE;
        };

        match self
            .api
            .get::<Currency>(&Resource::Currency.show(id), &[])
            .await
        {
            Ok(currency) => currency.exchange_rate.map(Rate::or_one).unwrap_or(Rate::ONE),
            Err(e) => {
                warn!(currency_id = id, error = %e, "Exchange rate lookup failed, using 1");
                Rate::ONE
            }
        }
    }

    /// Branches the user may work in.
    pub async fn branches_for_user(&self, user_id: i64) -> ClientResult<Vec<Branch>> {
        self.api.get(&resource::branches_by_user(user_id), &[]).await
    }

    pub async fn warehouses_for_branch(&self, branch_id: i64) -> ClientResult<Vec<Warehouse>> {
        self.api
            .get(&resource::warehouses_by_branch(branch_id), &[])
            .await
    }
}
