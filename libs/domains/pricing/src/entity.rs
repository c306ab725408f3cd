use crate::models::{CatalogEntry, CloudProvider, OsType, UpsertCatalogEntry};
use crate::sku_key::{ComputeShape, MeterTier, SkuKey};
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

/// Sea-ORM Entity for the cloud_pricing table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cloud_pricing")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub provider: CloudProvider,
    #[sea_orm(column_type = "String(StringLen::N(100))")]
    pub region: String,
    #[sea_orm(column_type = "String(StringLen::N(255))")]
    pub service_name: String,
    #[sea_orm(column_type = "String(StringLen::N(512))")]
    pub sku_name: String,
    #[sea_orm(column_type = "String(StringLen::N(64))")]
    pub unit: String,
    #[sea_orm(column_type = "Double")]
    pub retail_price: f64,
    #[sea_orm(column_type = "String(StringLen::N(3))")]
    pub currency: String,
    #[sea_orm(column_type = "String(StringLen::N(128))", nullable)]
    pub pricing_version: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(255))")]
    pub base_sku: String,
    pub os_type: Option<OsType>,
    #[sea_orm(column_type = "Double", nullable)]
    pub vcpu: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub memory_gib: Option<f64>,
    #[sea_orm(column_type = "String(StringLen::N(255))", nullable)]
    pub meter_name: Option<String>,
    #[sea_orm(column_type = "Double", nullable)]
    pub tier_begin: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub tier_end: Option<f64>,
    pub last_updated: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    fn sku_key(&self) -> SkuKey {
        let compute = match (self.os_type, self.vcpu, self.memory_gib) {
            (Some(os), Some(vcpu), Some(memory_gib)) => Some(ComputeShape { os, vcpu, memory_gib }),
            _ => None,
        };

        let has_meter =
            self.meter_name.is_some() || self.tier_begin.is_some() || self.tier_end.is_some();
        let meter = has_meter.then(|| MeterTier {
            meter_name: self.meter_name.clone(),
            begin_range: self.tier_begin,
            end_range: self.tier_end,
        });

        SkuKey {
            base_sku: self.base_sku.clone(),
            compute,
            meter,
        }
    }
}

impl From<Model> for CatalogEntry {
    fn from(model: Model) -> Self {
        let sku = model.sku_key();
        Self {
            provider: model.provider,
            region: model.region,
            service_name: model.service_name,
            sku_name: model.sku_name,
            unit: model.unit,
            retail_price: model.retail_price,
            currency: model.currency,
            pricing_version: model.pricing_version,
            last_updated: model.last_updated.with_timezone(&Utc),
            sku,
        }
    }
}

impl ActiveModel {
    /// Fresh row for a key that is not stored yet
    pub fn for_insert(input: UpsertCatalogEntry, now: DateTime<Utc>) -> Self {
        let entry = input.into_entry(now);
        let compute = entry.sku.compute;
        let meter = entry.sku.meter.unwrap_or_default();

        ActiveModel {
            id: Set(Uuid::now_v7()),
            provider: Set(entry.provider),
            region: Set(entry.region),
            service_name: Set(entry.service_name),
            sku_name: Set(entry.sku_name),
            unit: Set(entry.unit),
            retail_price: Set(entry.retail_price),
            currency: Set(entry.currency),
            pricing_version: Set(entry.pricing_version),
            base_sku: Set(entry.sku.base_sku),
            os_type: Set(compute.map(|c| c.os)),
            vcpu: Set(compute.map(|c| c.vcpu)),
            memory_gib: Set(compute.map(|c| c.memory_gib)),
            meter_name: Set(meter.meter_name),
            tier_begin: Set(meter.begin_range),
            tier_end: Set(meter.end_range),
            last_updated: Set(entry.last_updated.into()),
            created_at: Set(now.into()),
        }
    }
}
