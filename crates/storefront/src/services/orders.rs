//! Buyer-facing order tracking.

use serde::Serialize;

use velora_core::FulfillmentStatus;

/// The fixed four-stage fulfillment timeline shown on the tracking page.
const TIMELINE: [(FulfillmentStatus, &str); 4] = [
    (FulfillmentStatus::Pending, "Order placed"),
    (FulfillmentStatus::Processing, "Processing"),
    (FulfillmentStatus::Shipped, "Shipped"),
    (FulfillmentStatus::Delivered, "Delivered"),
];

/// One stage on the tracking timeline.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineStage {
    pub status: FulfillmentStatus,
    pub label: &'static str,
    pub complete: bool,
}

/// Tracking view for one order.
///
/// A cancelled order renders as a distinct banner, not as progress along
/// the timeline; no stage is marked complete for it.
#[derive(Debug, Clone, Serialize)]
pub struct OrderTimeline {
    pub stages: Vec<TimelineStage>,
    pub cancelled: bool,
}

/// Project a fulfillment status onto the timeline. A stage is complete
/// when the order has reached or passed it.
#[must_use]
pub fn order_timeline(status: FulfillmentStatus) -> OrderTimeline {
    let reached = status.ordinal();
    OrderTimeline {
        stages: TIMELINE
            .iter()
            .map(|&(stage, label)| TimelineStage {
                status: stage,
                label,
                complete: matches!(
                    (reached, stage.ordinal()),
                    (Some(reached), Some(ordinal)) if reached >= ordinal
                ),
            })
            .collect(),
        cancelled: status == FulfillmentStatus::Cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_count(timeline: &OrderTimeline) -> usize {
        timeline.stages.iter().filter(|s| s.complete).count()
    }

    #[test]
    fn test_processing_completes_first_two_stages() {
        let timeline = order_timeline(FulfillmentStatus::Processing);
        assert_eq!(complete_count(&timeline), 2);
        assert!(timeline.stages[0].complete);
        assert!(timeline.stages[1].complete);
        assert!(!timeline.stages[2].complete);
        assert!(!timeline.cancelled);
    }

    #[test]
    fn test_delivered_completes_all_stages() {
        let timeline = order_timeline(FulfillmentStatus::Delivered);
        assert_eq!(complete_count(&timeline), 4);
    }

    #[test]
    fn test_cancelled_is_a_banner_not_progress() {
        let timeline = order_timeline(FulfillmentStatus::Cancelled);
        assert!(timeline.cancelled);
        assert_eq!(complete_count(&timeline), 0);
    }
}
