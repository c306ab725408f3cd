use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(CloudProviderEnum::Enum)
                    .values([
                        CloudProviderEnum::Aws,
                        CloudProviderEnum::Azure,
                        CloudProviderEnum::Gcp,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CloudPricing::Table)
                    .if_not_exists()
                    .col(pk_uuid(CloudPricing::Id))
                    .col(
                        ColumnDef::new(CloudPricing::Provider)
                            .enumeration(
                                CloudProviderEnum::Enum,
                                [
                                    CloudProviderEnum::Aws,
                                    CloudProviderEnum::Azure,
                                    CloudProviderEnum::Gcp,
                                ],
                            )
                            .not_null(),
                    )
                    .col(string_len(CloudPricing::Region, 100).not_null())
                    .col(string_len(CloudPricing::ServiceName, 255).not_null())
                    .col(string_len(CloudPricing::SkuName, 512).not_null())
                    .col(string_len(CloudPricing::Unit, 64).not_null())
                    .col(double(CloudPricing::RetailPrice).not_null())
                    .col(string_len(CloudPricing::Currency, 3).not_null().default("USD"))
                    .col(string_len_null(CloudPricing::PricingVersion, 128))
                    // Structured form of sku_name, derived on write
                    .col(string_len(CloudPricing::BaseSku, 255).not_null())
                    .col(string_len_null(CloudPricing::OsType, 16))
                    .col(double_null(CloudPricing::Vcpu))
                    .col(double_null(CloudPricing::MemoryGib))
                    .col(string_len_null(CloudPricing::MeterName, 255))
                    .col(double_null(CloudPricing::TierBegin))
                    .col(double_null(CloudPricing::TierEnd))
                    .col(
                        timestamp_with_time_zone(CloudPricing::LastUpdated)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(CloudPricing::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cloud_pricing_key")
                    .table(CloudPricing::Table)
                    .col(CloudPricing::Provider)
                    .col(CloudPricing::Region)
                    .col(CloudPricing::ServiceName)
                    .col(CloudPricing::SkuName)
                    .col(CloudPricing::Unit)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cloud_pricing_region_lookup")
                    .table(CloudPricing::Table)
                    .col(CloudPricing::Provider)
                    .col(CloudPricing::Region)
                    .col(CloudPricing::ServiceName)
                    .col(CloudPricing::LastUpdated)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cloud_pricing_service_lookup")
                    .table(CloudPricing::Table)
                    .col(CloudPricing::Provider)
                    .col(CloudPricing::ServiceName)
                    .col(CloudPricing::LastUpdated)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CloudPricing::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(CloudProviderEnum::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum CloudPricing {
    Table,
    Id,
    Provider,
    Region,
    ServiceName,
    SkuName,
    Unit,
    RetailPrice,
    Currency,
    PricingVersion,
    BaseSku,
    OsType,
    Vcpu,
    MemoryGib,
    MeterName,
    TierBegin,
    TierEnd,
    LastUpdated,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CloudProviderEnum {
    #[sea_orm(iden = "cloud_provider")]
    Enum,
    #[sea_orm(iden = "aws")]
    Aws,
    #[sea_orm(iden = "azure")]
    Azure,
    #[sea_orm(iden = "gcp")]
    Gcp,
}
