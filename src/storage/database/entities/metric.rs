use sea_orm::entity::prelude::*;

/// Persisted metric row
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "metrics")]
pub struct Model {
    /// Metric name
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Metric kind ("counter" or "gauge")
    pub mtype: String,

    /// Counter total
    pub delta: Option<i64>,

    /// Gauge value
    pub mvalue: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
