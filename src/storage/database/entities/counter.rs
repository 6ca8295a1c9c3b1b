use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One recorded counter total; the newest row per name is current
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "counter")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Metric id
    pub name: String,

    /// Absolute total at the time of the write
    pub delta: i64,

    pub recorded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
