/// Metric entity module
pub mod metric;

pub use metric::Entity as Metric;
