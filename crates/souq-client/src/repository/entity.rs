//! # Entity Repository
//!
//! Generic CRUD over any record that lives under the standard
//! `/{prefix}/{index,show,store,update,delete}` scheme.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use souq_core::{Branch, Currency, Customer, Driver, Employee, Item, ItemUnit, Payment, Warehouse};
use tracing::{debug, info};

use crate::error::ClientResult;
use crate::http::ApiClient;
use crate::resource::{ListQuery, Resource};

/// A backend record with its own resource prefix.
pub trait Entity: Serialize + DeserializeOwned {
    const RESOURCE: Resource;

    /// Query pairs sent to `/index`.
    fn index_pairs(query: &ListQuery) -> Vec<(String, String)> {
        query.to_pairs()
    }
}

impl Entity for Driver {
    const RESOURCE: Resource = Resource::Driver;

    fn index_pairs(query: &ListQuery) -> Vec<(String, String)> {
        query.to_index_pairs()
    }
}

impl Entity for Branch {
    const RESOURCE: Resource = Resource::Branch;
}

impl Entity for Warehouse {
    const RESOURCE: Resource = Resource::Warehouse;
}

impl Entity for Customer {
    const RESOURCE: Resource = Resource::Customer;
}

impl Entity for Item {
    const RESOURCE: Resource = Resource::Item;
}

impl Entity for ItemUnit {
    const RESOURCE: Resource = Resource::ItemUnit;
}

impl Entity for Currency {
    const RESOURCE: Resource = Resource::Currency;
}

impl Entity for Employee {
    const RESOURCE: Resource = Resource::User;
}

impl Entity for Payment {
    const RESOURCE: Resource = Resource::Payment;
}

/// CRUD repository for one entity type.
#[derive(Debug, Clone)]
pub struct EntityRepository<T> {
    api: ApiClient,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> EntityRepository<T> {
    pub fn new(api: ApiClient) -> Self {
        EntityRepository {
            api,
            _entity: PhantomData,
        }
    }

    /// Lists records. The backend returns a plain array.
    pub async fn index(&self, query: &ListQuery) -> ClientResult<Vec<T>> {
        let resource = T::RESOURCE;
        let rows: Vec<T> = self.api.get(&resource.index(), &T::index_pairs(query)).await?;
        debug!(%resource, count = rows.len(), "Listed records");
        Ok(rows)
    }

    /// Lists every record, unfiltered.
    pub async fn all(&self) -> ClientResult<Vec<T>> {
        self.index(&ListQuery::default()).await
    }

    pub async fn show(&self, id: i64) -> ClientResult<T> {
        self.api.get(&T::RESOURCE.show(id), &[]).await
    }

    /// Creates a record and returns it as stored.
    pub async fn store(&self, record: &T) -> ClientResult<T> {
        let resource = T::RESOURCE;
        let stored = self.api.post(&resource.store(), record).await?;
        info!(%resource, "Record created");
        Ok(stored)
    }

    pub async fn update(&self, id: i64, record: &T) -> ClientResult<()> {
        let resource = T::RESOURCE;
        self.api.put(&resource.update(id), record).await?;
        info!(%resource, id, "Record updated");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        let resource = T::RESOURCE;
        self.api.delete(&resource.delete(id)).await?;
        info!(%resource, id, "Record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::resource::SortOrder;
    use crate::testing::StubServer;

    fn api(base_url: &str) -> ApiClient {
        let mut config = ClientConfig::default();
        config.api.url = base_url.to_string();
        ApiClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_driver_index_uses_page_size_and_name() {
        let server = StubServer::start(&[(
            "GET",
            "/driver/index",
            200,
            r#"[{"id": 1, "name": "Karwan", "hired_date": "2023-05-01T00:00:00.000Z"}]"#,
        )])
        .await;
        let drivers = EntityRepository::<Driver>::new(api(&server.base_url));

        let query = ListQuery::new()
            .page(1, 10)
            .sort("name", SortOrder::Asc)
            .search("Kar");
        let rows = drivers.index(&query).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Karwan");
        assert_eq!(
            server.calls(),
            vec!["GET /driver/index?page=1&pageSize=10&sortBy=name&sortOrder=asc&name=Kar"]
        );
    }

    #[tokio::test]
    async fn test_store_update_delete_paths() {
        let server = StubServer::start(&[
            ("POST", "/driver/store", 200, r#"{"id": 12, "name": "Azad"}"#),
            ("PUT", "/driver/update/12", 200, r#"{"message": "ok"}"#),
            ("DELETE", "/driver/delete/12", 200, ""),
        ])
        .await;
        let drivers = EntityRepository::<Driver>::new(api(&server.base_url));

        let draft = Driver {
            name: "Azad".to_string(),
            ..Driver::default()
        };
        let stored = drivers.store(&draft).await.unwrap();
        assert_eq!(stored.id, Some(12));

        drivers.update(12, &stored).await.unwrap();
        drivers.delete(12).await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].json().get("id").is_none());
        assert_eq!(requests[1].path(), "/driver/update/12");
        assert_eq!(requests[2].method, "DELETE");
    }

    #[tokio::test]
    async fn test_default_index_pairs() {
        let server = StubServer::start(&[("GET", "/payment/index", 200, "[]")]).await;
        let payments = EntityRepository::<Payment>::new(api(&server.base_url));

        let query = ListQuery::new().page(3, 20).search("cash");
        assert!(payments.index(&query).await.unwrap().is_empty());
        assert_eq!(
            server.calls(),
            vec!["GET /payment/index?page=3&limit=20&search=cash"]
        );
    }
}
