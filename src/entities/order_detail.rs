use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Address/time/price payload of a ride. Lives as long as some order references it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_detail")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub requested_time: String,
    pub price: f64,
    pub distance_km: f64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
