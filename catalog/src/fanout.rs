//! Concurrent provider fan-out.
//!
//! One task per provider, each bound to that provider's own deadline.
//! A timeout, transport failure or parse failure degrades that provider's
//! slot to an error; it never propagates to sibling tasks or aborts the
//! join. Total latency is the slowest provider's budget, not the sum.

use crate::metrics_defs::{PROVIDER_FETCH_DURATION, PROVIDER_FETCH_FAILURE};
use providers::model::Listing;
use providers::{ListingSource, ProviderError};
use shared::{counter, histogram};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::{Instant, timeout};

/// One provider's contribution to an aggregation pass. Failures stay in
/// the slot; the merge stage decides what an empty contribution means.
pub struct ProviderSlot {
    pub provider: &'static str,
    pub outcome: Result<Vec<Listing>, ProviderError>,
}

/// Dispatches one search task per provider and waits for every slot to
/// settle. Results come back in provider registration order, which the
/// aggregation stage relies on for stable tie-breaking.
pub async fn fan_out(
    sources: &[Arc<dyn ListingSource>],
    query: &str,
    limit: usize,
) -> Vec<ProviderSlot> {
    let mut join_set = JoinSet::new();
    let mut task_meta: HashMap<tokio::task::Id, (usize, &'static str)> = HashMap::new();

    for (idx, source) in sources.iter().enumerate() {
        let source = source.clone();
        let name = source.name();
        let query = query.to_string();
        let handle = join_set.spawn(async move {
            let budget = source.timeout();
            let started = Instant::now();

            let outcome = match timeout(budget, source.search(&query, limit)).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout { provider: name }),
            };
            (idx, name, started.elapsed(), outcome)
        });
        task_meta.insert(handle.id(), (idx, name));
    }

    let mut slots: Vec<Option<ProviderSlot>> = Vec::new();
    slots.resize_with(sources.len(), || None);

    while let Some(join_result) = join_set.join_next_with_id().await {
        match join_result {
            Ok((task_id, (idx, provider, elapsed, outcome))) => {
                task_meta.remove(&task_id);
                histogram!(PROVIDER_FETCH_DURATION).record(elapsed.as_secs_f64());
                match &outcome {
                    Ok(listings) => {
                        tracing::debug!(
                            provider,
                            count = listings.len(),
                            elapsed_ms = elapsed.as_millis() as u64,
                            "provider fetch complete"
                        );
                    }
                    Err(e) => {
                        counter!(PROVIDER_FETCH_FAILURE).increment(1);
                        tracing::warn!(
                            provider,
                            elapsed_ms = elapsed.as_millis() as u64,
                            error = %e,
                            "provider fetch degraded to empty"
                        );
                    }
                }
                slots[idx] = Some(ProviderSlot { provider, outcome });
            }
            Err(join_error) => {
                let (idx, provider) = task_meta
                    .remove(&join_error.id())
                    .unwrap_or((0, "unknown"));
                counter!(PROVIDER_FETCH_FAILURE).increment(1);
                tracing::error!(provider, error = %join_error, "provider task failed");
                slots[idx] = Some(ProviderSlot {
                    provider,
                    outcome: Err(ProviderError::Unavailable {
                        provider,
                        reason: join_error.to_string(),
                    }),
                });
            }
        }
    }

    slots
        .into_iter()
        .map(|slot| {
            slot.unwrap_or(ProviderSlot {
                provider: "unknown",
                outcome: Ok(Vec::new()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use providers::Result;
    use providers::model::Source;
    use std::time::Duration;

    struct StaticSource {
        name: &'static str,
        listings: Vec<Listing>,
        delay: Duration,
        budget: Duration,
        fail: bool,
    }

    impl StaticSource {
        fn ok(name: &'static str, titles: &[&str]) -> Self {
            StaticSource {
                name,
                listings: titles
                    .iter()
                    .map(|t| Listing::new(Source::Marketplace, *t, *t))
                    .collect(),
                delay: Duration::ZERO,
                budget: Duration::from_secs(5),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl ListingSource for StaticSource {
        fn name(&self) -> &'static str {
            self.name
        }

        fn timeout(&self) -> Duration {
            self.budget
        }

        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<Listing>> {
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(ProviderError::Unavailable {
                    provider: self.name,
                    reason: "boom".to_string(),
                });
            }
            Ok(self.listings.clone())
        }
    }

    #[tokio::test]
    async fn results_come_back_in_registration_order() {
        let slow = StaticSource {
            delay: Duration::from_millis(100),
            ..StaticSource::ok("slow", &["a"])
        };
        let fast = StaticSource::ok("fast", &["b"]);
        let sources: Vec<Arc<dyn ListingSource>> = vec![Arc::new(slow), Arc::new(fast)];

        let slots = fan_out(&sources, "q", 10).await;

        assert_eq!(slots[0].provider, "slow");
        assert_eq!(slots[1].provider, "fast");
        assert!(slots.iter().all(|s| s.outcome.is_ok()));
    }

    #[tokio::test]
    async fn one_failure_never_affects_siblings() {
        let bad = StaticSource {
            fail: true,
            ..StaticSource::ok("bad", &[])
        };
        let good = StaticSource::ok("good", &["dunk-low"]);
        let sources: Vec<Arc<dyn ListingSource>> = vec![Arc::new(bad), Arc::new(good)];

        let slots = fan_out(&sources, "q", 10).await;

        assert!(slots[0].outcome.is_err());
        let listings = slots[1].outcome.as_ref().unwrap();
        assert_eq!(listings.len(), 1);
    }

    #[tokio::test]
    async fn a_slot_past_its_deadline_resolves_to_timeout() {
        let stuck = StaticSource {
            delay: Duration::from_secs(30),
            budget: Duration::from_millis(50),
            ..StaticSource::ok("stuck", &["never"])
        };
        let good = StaticSource::ok("good", &["a"]);
        let sources: Vec<Arc<dyn ListingSource>> = vec![Arc::new(stuck), Arc::new(good)];

        let started = Instant::now();
        let slots = fan_out(&sources, "q", 10).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(matches!(
            slots[0].outcome,
            Err(ProviderError::Timeout { provider: "stuck" })
        ));
        assert!(slots[1].outcome.is_ok());
    }
}
