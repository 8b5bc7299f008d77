use sea_orm_migration::{prelude::*, schema::*};

use super::m20240301_000001_create_drivers::Driver;
use super::m20240301_000002_create_passengers::Passenger;
use super::m20240301_000004_create_order_details::OrderDetail;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(pk_auto(Orders::Id))
                    .col(integer_null(Orders::DriverId))
                    .col(integer(Orders::PassengerId).not_null())
                    .col(integer(Orders::OrderDetailId).not_null())
                    .col(
                        timestamp_with_time_zone(Orders::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_driver")
                            .from(Orders::Table, Orders::DriverId)
                            .to(Driver::Table, Driver::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_passenger")
                            .from(Orders::Table, Orders::PassengerId)
                            .to(Passenger::Table, Passenger::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_order_detail")
                            .from(Orders::Table, Orders::OrderDetailId)
                            .to(OrderDetail::Table, OrderDetail::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_order_detail")
                    .table(Orders::Table)
                    .col(Orders::OrderDetailId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Orders {
    Table,
    Id,
    DriverId,
    PassengerId,
    OrderDetailId,
    CreatedAt,
}
