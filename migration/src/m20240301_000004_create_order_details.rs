use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrderDetail::Table)
                    .if_not_exists()
                    .col(pk_auto(OrderDetail::Id))
                    .col(string_len(OrderDetail::PickupAddress, 255).not_null())
                    .col(string_len(OrderDetail::DropoffAddress, 255).not_null())
                    .col(string_len(OrderDetail::RequestedTime, 32).not_null())
                    .col(double(OrderDetail::Price).not_null())
                    .col(double(OrderDetail::DistanceKm).not_null())
                    .col(
                        timestamp_with_time_zone(OrderDetail::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderDetail::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum OrderDetail {
    Table,
    Id,
    PickupAddress,
    DropoffAddress,
    RequestedTime,
    Price,
    DistanceKm,
    CreatedAt,
}
