//! Metric definition tables shared by the service crates.
//!
//! Each crate declares its metrics as [`MetricDef`] constants so names and
//! descriptions live in one place; the macros route a definition to the
//! matching `metrics` recorder handle. The aggregation pipeline only
//! counts events and times provider fetches, so only those two shapes
//! exist here.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub description: &'static str,
}

#[macro_export]
macro_rules! counter {
    ($def:expr) => {
        metrics::counter!($def.name)
    };
}

#[macro_export]
macro_rules! histogram {
    ($def:expr) => {
        metrics::histogram!($def.name)
    };
}
