use shared::metrics_defs::{MetricDef, MetricType};

pub const SEARCH_REQUESTS: MetricDef = MetricDef {
    name: "search.requests",
    metric_type: MetricType::Counter,
    description: "Number of search/trending aggregation passes",
};

pub const PROVIDER_FETCH_DURATION: MetricDef = MetricDef {
    name: "provider.fetch.duration",
    metric_type: MetricType::Histogram,
    description: "Per-provider fetch duration in seconds, including timeouts",
};

pub const PROVIDER_FETCH_FAILURE: MetricDef = MetricDef {
    name: "provider.fetch.failure",
    metric_type: MetricType::Counter,
    description: "Provider fetches degraded to an empty contribution",
};

pub const ALL_METRICS: &[MetricDef] = &[
    SEARCH_REQUESTS,
    PROVIDER_FETCH_DURATION,
    PROVIDER_FETCH_FAILURE,
];
