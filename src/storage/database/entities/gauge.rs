use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One recorded gauge observation; the newest row per name is current
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gauge")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Metric id
    pub name: String,

    #[sea_orm(column_type = "Double")]
    pub value: f64,

    pub recorded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
