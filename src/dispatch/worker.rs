//! Per-worker scheduling loop: pop a scheduled registration, run one
//! throughput quantum, then requeue it, drop it, or reschedule it if the
//! mailbox woke up again in the handoff window.

// Layer 1: Standard library imports
use std::sync::atomic::Ordering;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

// Layer 3: Internal module imports
use super::pool::Registration;
use crate::actor::cell::QuantumOutcome;
use crate::actor::Actor;
use crate::broker::MessageBroker;
use crate::message::Message;

/// Run until the ready queue closes (the dispatcher is shutting down).
pub(super) async fn run<A, B>(
    worker_id: usize,
    dispatcher_name: String,
    ready_rx: Arc<AsyncMutex<UnboundedReceiver<Arc<Registration<A, B>>>>>,
    ready_tx: UnboundedSender<Arc<Registration<A, B>>>,
    throughput: usize,
) where
    A: Actor + Send + 'static,
    B: MessageBroker<A::Message> + 'static,
    A::Message: Message,
{
    loop {
        let registration = {
            let mut guard = ready_rx.lock().await;
            match guard.recv().await {
                Some(registration) => registration,
                None => break,
            }
        };

        run_one_quantum(worker_id, &dispatcher_name, &registration, &ready_tx, throughput).await;
    }
}

async fn run_one_quantum<A, B>(
    worker_id: usize,
    dispatcher_name: &str,
    registration: &Arc<Registration<A, B>>,
    ready_tx: &UnboundedSender<Arc<Registration<A, B>>>,
    throughput: usize,
) where
    A: Actor + Send + 'static,
    B: MessageBroker<A::Message> + 'static,
    A::Message: Message,
{
    let mut slot_guard = registration.slot.lock().await;
    let Some(slot) = slot_guard.as_mut() else {
        return;
    };

    let mut outcome = slot.cell.run_quantum(&mut slot.mailbox, throughput).await;

    if matches!(outcome, QuantumOutcome::Idle) {
        registration.scheduled.store(false, Ordering::Release);
        // A send racing with the store above sees `scheduled` still `true`
        // and does nothing, so the only way to not strand a message that
        // landed in that window is to check the mailbox again ourselves,
        // still holding the slot lock so no other worker can interleave.
        outcome = slot.cell.run_quantum(&mut slot.mailbox, throughput).await;
        if !matches!(outcome, QuantumOutcome::Idle) {
            registration.scheduled.store(true, Ordering::Release);
        }
    }

    match outcome {
        QuantumOutcome::Stopped(_exit) => {
            *slot_guard = None;
            debug!(dispatcher = %dispatcher_name, worker_id, "actor cell stopped");
        }
        QuantumOutcome::MoreWork => {
            drop(slot_guard);
            let _ = ready_tx.send(Arc::clone(registration));
        }
        QuantumOutcome::Idle => {}
    }
}
