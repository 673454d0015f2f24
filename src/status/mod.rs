//! Last routing decision, for observability.
//!
//! Holds exactly one decision. Publishing swaps in a whole new record, so a
//! reader always sees all fields of a single decision.

use arc_swap::ArcSwapOption;
use std::sync::Arc;

use crate::routing::RoutingDecision;

/// Single-slot, lock-free holder of the most recent [`RoutingDecision`].
#[derive(Debug, Default)]
pub struct StatusPublisher {
    last: ArcSwapOption<RoutingDecision>,
}

impl StatusPublisher {
    pub fn new() -> Self {
        Self {
            last: ArcSwapOption::const_empty(),
        }
    }

    /// Replace the last decision. Last write wins.
    pub fn publish(&self, decision: RoutingDecision) {
        self.last.store(Some(Arc::new(decision)));
    }

    /// `None` until the first publish.
    pub fn last(&self) -> Option<Arc<RoutingDecision>> {
        self.last.load_full()
    }

    /// Forget the last decision.
    pub fn reset(&self) {
        self.last.store(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::RoutingLabel;
    use chrono::Utc;

    #[test]
    fn test_last_is_none_before_publish() {
        let publisher = StatusPublisher::new();
        assert!(publisher.last().is_none());
    }

    #[test]
    fn test_publish_then_last() {
        let publisher = StatusPublisher::new();
        let decision =
            RoutingDecision::routed(RoutingLabel::Think, "model-A", "model-T", Utc::now());
        publisher.publish(decision.clone());
        assert_eq!(*publisher.last().unwrap(), decision);

        let newer = RoutingDecision::passthrough("model-Z", Utc::now());
        publisher.publish(newer.clone());
        assert_eq!(*publisher.last().unwrap(), newer);
    }

    #[test]
    fn test_reset_clears_slot() {
        let publisher = StatusPublisher::new();
        publisher.publish(RoutingDecision::passthrough("m", Utc::now()));
        publisher.reset();
        assert!(publisher.last().is_none());
    }

    #[test]
    fn test_concurrent_publish_and_read_never_mix_fields() {
        // Each publisher writes decisions whose fields all encode the same id.
        let publisher = Arc::new(StatusPublisher::new());

        let writers: Vec<_> = (0..4)
            .map(|w| {
                let publisher = Arc::clone(&publisher);
                std::thread::spawn(move || {
                    for i in 0..2_000 {
                        let id = format!("{}-{}", w, i);
                        let passthrough = i % 2 == 0;
                        publisher.publish(RoutingDecision {
                            rule: (!passthrough).then(|| format!("rule-{}", id)),
                            routed_model: format!("routed-{}", id),
                            original_model: format!("original-{}", id),
                            is_passthrough: passthrough,
                            timestamp: Utc::now(),
                        });
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let publisher = Arc::clone(&publisher);
                std::thread::spawn(move || {
                    for _ in 0..5_000 {
                        if let Some(d) = publisher.last() {
                            let id = d.original_model.trim_start_matches("original-");
                            assert_eq!(d.routed_model, format!("routed-{}", id));
                            match &d.rule {
                                Some(rule) => {
                                    assert!(!d.is_passthrough);
                                    assert_eq!(rule, &format!("rule-{}", id));
                                }
                                None => assert!(d.is_passthrough),
                            }
                        }
                    }
                })
            })
            .collect();

        for handle in writers.into_iter().chain(readers) {
            handle.join().unwrap();
        }
        assert!(publisher.last().is_some());
    }
}
