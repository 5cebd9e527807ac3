use crate::{
    error::AppError,
    models::{Epoch, GenerationJob, QueueState},
    services::{discovery::Discovery, poller},
};

/// One-shot-per-epoch low-watermark check
///
/// The flag lives on the epoch's `QueueState`, so a fresh batch re-arms it for free.
#[derive(Debug, Clone, Copy)]
pub struct GenerationTrigger {
    low_watermark: i64,
}

impl Default for GenerationTrigger {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LOW_WATERMARK)
    }
}

impl GenerationTrigger {
    pub const DEFAULT_LOW_WATERMARK: i64 = 10;

    pub fn new(low_watermark: i64) -> Self {
        Self { low_watermark }
    }

    /// Called after every consumption. Returns true when the caller must issue the
    /// generation request; the flag is already set by then.
    pub fn observe(&self, queue: &mut QueueState) -> bool {
        let remaining = queue.remaining_supply();
        if remaining >= self.low_watermark {
            return false;
        }

        let fired = queue.mark_generation_triggered();
        if fired {
            tracing::info!(
                epoch = %queue.epoch(),
                remaining,
                low_watermark = self.low_watermark,
                "Supply below low watermark, requesting generation"
            );
        }
        fired
    }
}

/// Issues the generation request for `epoch` and hands an accepted job to the poller
///
/// A decline (`generating: false`) keeps the epoch's flag set. So does any failure after
/// the request may have reached the backend (error status, bad body, timeout), since a
/// job could already be running; the user recovers with an explicit retry. Only a request
/// that never left this machine re-arms the flag.
pub(crate) async fn request(discovery: Discovery, epoch: Epoch) {
    match discovery.backend().request_generation().await {
        Ok(ticket) if ticket.generating => {
            let job = GenerationJob::started(ticket.job_id, ticket.estimated_seconds);
            poller::start(&discovery, epoch, job).await;
        }
        Ok(ticket) => {
            tracing::info!(
                epoch = %epoch,
                message = ?ticket.message,
                "Backend declined generation"
            );
        }
        Err(e @ AppError::BackendUnreachable(_)) => {
            tracing::warn!(error = %e, epoch = %epoch, "Backend unreachable, generation re-armed");

            let mut session = discovery.session().await;
            if let Some(queue) = session.queue_for(epoch) {
                queue.rearm_generation();
            }
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                epoch = %epoch,
                "Generation request failed; waiting for an explicit retry"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Batch, ContentId, FilterSelection, RecommendationItem, SwipeDecision};

    fn queue(len: u64, total_unshown: u32) -> QueueState {
        let items = (1..=len)
            .map(|id| RecommendationItem {
                content_id: ContentId(id),
                title: format!("Movie {}", id),
                year: None,
                score: None,
                metadata: Default::default(),
            })
            .collect();

        QueueState::new(
            Epoch::default().next(),
            FilterSelection::none(),
            Batch {
                items,
                total_unshown,
            },
        )
    }

    #[test]
    fn test_fires_once_when_crossing_watermark() {
        let trigger = GenerationTrigger::default();
        let mut q = queue(50, 50);
        let mut fired = Vec::new();

        for n in 1..=50 {
            q.advance(SwipeDecision::Reject);
            if trigger.observe(&mut q) {
                fired.push(n);
            }
        }

        assert_eq!(fired, vec![41]);
        assert!(q.generation_triggered());
    }

    #[test]
    fn test_does_not_fire_at_exactly_the_watermark() {
        let trigger = GenerationTrigger::new(10);
        let mut q = queue(50, 50);
        for _ in 0..40 {
            q.advance(SwipeDecision::Accept);
        }
        assert_eq!(q.remaining_supply(), 10);
        assert!(!trigger.observe(&mut q));
    }

    #[test]
    fn test_large_server_pool_keeps_trigger_quiet() {
        let trigger = GenerationTrigger::default();
        let mut q = queue(50, 500);
        for _ in 0..50 {
            q.advance(SwipeDecision::Accept);
            assert!(!trigger.observe(&mut q));
        }
    }

    #[test]
    fn test_fires_again_after_rearm() {
        let trigger = GenerationTrigger::default();
        let mut q = queue(5, 5);
        q.advance(SwipeDecision::Accept);
        assert!(trigger.observe(&mut q));
        assert!(!trigger.observe(&mut q));

        q.rearm_generation();
        assert!(trigger.observe(&mut q));
    }
}
