use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select, Set,
};
use tracing::debug;

use crate::entity::{ActiveModel, Column, Entity};
use crate::error::PricingResult;
use crate::models::{CatalogEntry, CatalogKey, CloudProvider, UpsertCatalogEntry};
use crate::repository::PriceCatalog;

/// PostgreSQL implementation of PriceCatalog
#[derive(Clone)]
pub struct PgPriceCatalog {
    db: DatabaseConnection,
}

impl PgPriceCatalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn newest_first(query: Select<Entity>) -> Select<Entity> {
        query
            .order_by_desc(Column::LastUpdated)
            .order_by_asc(Column::SkuName)
            .order_by_asc(Column::Unit)
    }

    async fn find_by_key(&self, key: &CatalogKey) -> PricingResult<Option<crate::entity::Model>> {
        let found = Entity::find()
            .filter(Column::Provider.eq(key.provider))
            .filter(Column::Region.eq(key.region.as_str()))
            .filter(Column::ServiceName.eq(key.service_name.as_str()))
            .filter(Column::SkuName.eq(key.sku_name.as_str()))
            .filter(Column::Unit.eq(key.unit.as_str()))
            .one(&self.db)
            .await?;
        Ok(found)
    }
}

#[async_trait]
impl PriceCatalog for PgPriceCatalog {
    async fn latest_price(
        &self,
        provider: CloudProvider,
        region: &str,
        service_name: &str,
        sku_name: &str,
    ) -> PricingResult<Option<CatalogEntry>> {
        let query = Entity::find()
            .filter(Column::Provider.eq(provider))
            .filter(Column::Region.eq(region))
            .filter(Column::ServiceName.eq(service_name))
            .filter(Column::SkuName.eq(sku_name));

        let result = Self::newest_first(query)
            .one(&self.db)
            .await?
            .map(Into::into);
        Ok(result)
    }

    async fn list_prices(
        &self,
        provider: CloudProvider,
        region: &str,
        service_name: &str,
    ) -> PricingResult<Vec<CatalogEntry>> {
        let query = Entity::find()
            .filter(Column::Provider.eq(provider))
            .filter(Column::Region.eq(region))
            .filter(Column::ServiceName.eq(service_name));

        let results = Self::newest_first(query)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok(results)
    }

    async fn list_prices_any_region(
        &self,
        provider: CloudProvider,
        service_name: &str,
    ) -> PricingResult<Vec<CatalogEntry>> {
        let query = Entity::find()
            .filter(Column::Provider.eq(provider))
            .filter(Column::ServiceName.eq(service_name));

        let results = Self::newest_first(query)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok(results)
    }

    async fn upsert(&self, input: UpsertCatalogEntry) -> PricingResult<CatalogEntry> {
        let input = input.normalized()?;
        let now = Utc::now();

        let saved = match self.find_by_key(&input.key()).await? {
            Some(existing) => {
                let mut model: ActiveModel = existing.into();
                model.retail_price = Set(input.retail_price);
                model.currency = Set(input.currency);
                model.pricing_version = Set(input.pricing_version);
                model.last_updated = Set(input.last_updated.unwrap_or(now).into());
                model.update(&self.db).await?
            }
            None => ActiveModel::for_insert(input, now).insert(&self.db).await?,
        };

        Ok(saved.into())
    }

    async fn upsert_many(&self, inputs: Vec<UpsertCatalogEntry>) -> PricingResult<usize> {
        let total = inputs.len();
        for input in inputs {
            self.upsert(input).await?;
        }
        debug!(rows = total, "Upserted catalog rows");
        Ok(total)
    }

    async fn count_by_provider(&self, provider: CloudProvider) -> PricingResult<usize> {
        let count = Entity::find()
            .filter(Column::Provider.eq(provider))
            .count(&self.db)
            .await?;
        Ok(count as usize)
    }
}
