//! Policy collection capability.

use std::sync::Arc;

use crate::policy::FetchPolicy;

/// Produces the fetch-policy records for a response, before filtering.
pub trait PolicyCollector: Send + Sync {
    fn collect(&self) -> Vec<FetchPolicy>;
}

/// A collector over a fixed set of records.
#[derive(Debug, Clone, Default)]
pub struct StaticPolicyCollector {
    policies: Arc<[FetchPolicy]>,
}

impl StaticPolicyCollector {
    #[must_use]
    pub fn new(policies: Vec<FetchPolicy>) -> Self {
        Self {
            policies: policies.into(),
        }
    }

    #[must_use]
    pub fn policies(&self) -> &[FetchPolicy] {
        &self.policies
    }
}

impl PolicyCollector for StaticPolicyCollector {
    fn collect(&self) -> Vec<FetchPolicy> {
        self.policies.to_vec()
    }
}

impl<C: PolicyCollector + ?Sized> PolicyCollector for Arc<C> {
    fn collect(&self) -> Vec<FetchPolicy> {
        (**self).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_collector_returns_copies() {
        let collector = StaticPolicyCollector::new(vec![
            FetchPolicy::builder("default-src").allow_self(true).build(),
        ]);

        let first = collector.collect();
        let second = collector.collect();
        assert_eq!(first, second);
        assert_eq!(collector.policies().len(), 1);
    }

    #[test]
    fn test_arc_dyn_collector() {
        let collector: Arc<dyn PolicyCollector> = Arc::new(StaticPolicyCollector::default());
        assert!(collector.collect().is_empty());
    }
}
