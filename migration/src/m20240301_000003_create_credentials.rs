use sea_orm_migration::{prelude::*, schema::*};

use super::m20240301_000001_create_drivers::Driver;
use super::m20240301_000002_create_passengers::Passenger;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Exactly one owner column is set per row; nullable UNIQUE keeps each owner 1:1.
        manager
            .create_table(
                Table::create()
                    .table(Credential::Table)
                    .if_not_exists()
                    .col(pk_auto(Credential::Id))
                    .col(integer_null(Credential::DriverId).unique_key())
                    .col(integer_null(Credential::PassengerId).unique_key())
                    .col(string_len(Credential::PasswordDigest, 255).not_null())
                    .col(string_len(Credential::Salt, 64).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_credential_driver")
                            .from(Credential::Table, Credential::DriverId)
                            .to(Driver::Table, Driver::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_credential_passenger")
                            .from(Credential::Table, Credential::PassengerId)
                            .to(Passenger::Table, Passenger::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Credential::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Credential {
    Table,
    Id,
    DriverId,
    PassengerId,
    PasswordDigest,
    Salt,
}
