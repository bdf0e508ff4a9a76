//! Metrics definitions for the provider clients.

use shared::metrics_defs::{MetricDef, MetricType};

pub const TTL_CACHE_HIT: MetricDef = MetricDef {
    name: "ttl_cache.hit",
    metric_type: MetricType::Counter,
    description: "Number of lookups served from a live TTL cache entry",
};

pub const TTL_CACHE_MISS: MetricDef = MetricDef {
    name: "ttl_cache.miss",
    metric_type: MetricType::Counter,
    description: "Number of lookups that found no live TTL cache entry",
};

pub const TOKEN_REFRESH: MetricDef = MetricDef {
    name: "classifieds.token_refresh",
    metric_type: MetricType::Counter,
    description: "Number of OAuth client-credentials token refreshes",
};

pub const ALL_METRICS: &[MetricDef] = &[TTL_CACHE_HIT, TTL_CACHE_MISS, TOKEN_REFRESH];
