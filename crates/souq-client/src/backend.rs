//! # Backend Handle
//!
//! One configured [`ApiClient`] handing out repositories.
//!
//! ```rust,ignore
//! let backend = Backend::new(&ClientConfig::load(None)?)?;
//! let drivers = backend.drivers().all().await?;
//! let invoice = backend.invoices(InvoiceKind::Sell).show(12).await?;
//! ```

use souq_core::{Branch, Currency, Customer, Driver, InvoiceKind, Payment};
use tracing::info;

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::http::ApiClient;
use crate::repository::{CatalogRepository, EntityRepository, InvoiceRepository};

#[derive(Debug, Clone)]
pub struct Backend {
    api: ApiClient,
    page_size: u32,
    user_id: Option<i64>,
}

impl Backend {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let api = ApiClient::new(config)?;
        info!(url = %api.base_url(), authenticated = config.token().is_some(), "Backend client ready");
        Ok(Backend {
            api,
            page_size: config.lists.page_size,
            user_id: config.user_id(),
        })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Configured rows per page for list screens.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Signed-in user, if configured.
    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    pub fn drivers(&self) -> EntityRepository<Driver> {
        EntityRepository::new(self.api.clone())
    }

    pub fn branches(&self) -> EntityRepository<Branch> {
        EntityRepository::new(self.api.clone())
    }

    pub fn customers(&self) -> EntityRepository<Customer> {
        EntityRepository::new(self.api.clone())
    }

    pub fn currencies(&self) -> EntityRepository<Currency> {
        EntityRepository::new(self.api.clone())
    }

    pub fn payments(&self) -> EntityRepository<Payment> {
        EntityRepository::new(self.api.clone())
    }

    pub fn catalog(&self) -> CatalogRepository {
        CatalogRepository::new(self.api.clone())
    }

    pub fn invoices(&self, kind: InvoiceKind) -> InvoiceRepository {
        InvoiceRepository::new(self.api.clone(), kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubServer;

    #[test]
    fn test_backend_from_config() {
        let mut config = ClientConfig::default();
        config.session.user_id = Some(4);
        config.lists.page_size = 25;

        let backend = Backend::new(&config).unwrap();
        assert_eq!(backend.user_id(), Some(4));
        assert_eq!(backend.page_size(), 25);
        assert_eq!(backend.invoices(InvoiceKind::Buy).kind(), InvoiceKind::Buy);
    }

    #[tokio::test]
    async fn test_branch_and_customer_repositories() {
        let server = StubServer::start(&[
            ("GET", "/branch/index", 200, r#"[{"id": 2, "name": "Erbil"}]"#),
            ("GET", "/customer/show/3", 200, r#"{"id": 3, "name": "Hawre", "phone": "0750"}"#),
        ])
        .await;
        let mut config = ClientConfig::default();
        config.api.url = server.base_url.clone();
        let backend = Backend::new(&config).unwrap();

        let branches = backend.branches().all().await.unwrap();
        assert_eq!(branches[0].name, "Erbil");

        let customer = backend.customers().show(3).await.unwrap();
        assert_eq!(customer.name, "Hawre");
        assert_eq!(server.calls(), vec!["GET /branch/index", "GET /customer/show/3"]);
    }
}
