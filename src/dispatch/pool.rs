//! Dispatcher configuration, the registration/scheduling state shared
//! between a mailbox sender and the worker pool, and the `Dispatcher`
//! itself.

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinSet;
use tracing::info;

// Layer 3: Internal module imports
use super::worker;
use super::DispatchError;
use crate::actor::{Actor, ActorCell};
use crate::broker::MessageBroker;
use crate::message::{Message, MessageEnvelope};

/// How many workers a named dispatcher owns and how many messages each
/// actor cell runs per turn before yielding its worker back to the pool.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub name: String,
    pub parallelism: usize,
    pub throughput: usize,
}

impl DispatcherConfig {
    pub fn new(name: impl Into<String>, parallelism: usize, throughput: usize) -> Self {
        Self {
            name: name.into(),
            parallelism: parallelism.max(1),
            throughput: throughput.max(1),
        }
    }
}

/// An actor cell and its mailbox, held behind an async mutex so a worker
/// can take exclusive access for the duration of a quantum.
pub(super) struct Slot<A: Actor, B: MessageBroker<A::Message>> {
    pub(super) cell: ActorCell<A, B>,
    pub(super) mailbox: UnboundedReceiver<MessageEnvelope<A::Message>>,
}

/// Scheduling state for one registered actor, shared between its
/// [`DispatchSender`] and whichever worker currently owns it.
///
/// `scheduled` implements the empty -> non-empty mailbox transition: a
/// send only pushes the registration onto the ready queue if it manages to
/// flip `scheduled` from `false` to `true`, so an actor with a full
/// mailbox and a worker already processing it is never double-queued.
pub(super) struct Registration<A: Actor, B: MessageBroker<A::Message>> {
    pub(super) slot: AsyncMutex<Option<Slot<A, B>>>,
    pub(super) scheduled: AtomicBool,
}

fn schedule<A, B>(registration: &Arc<Registration<A, B>>, ready: &UnboundedSender<Arc<Registration<A, B>>>)
where
    A: Actor,
    B: MessageBroker<A::Message>,
{
    if registration
        .scheduled
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
    {
        let _ = ready.send(Arc::clone(registration));
    }
}

/// Sender handle returned by [`Dispatcher::register`]. Sending through this
/// (rather than a raw channel sender) is what keeps the actor's cell
/// scheduled on the worker pool.
pub struct DispatchSender<A: Actor, B: MessageBroker<A::Message>> {
    inner: UnboundedSender<MessageEnvelope<A::Message>>,
    registration: Arc<Registration<A, B>>,
    ready: UnboundedSender<Arc<Registration<A, B>>>,
}

impl<A, B> Clone for DispatchSender<A, B>
where
    A: Actor,
    B: MessageBroker<A::Message>,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            registration: Arc::clone(&self.registration),
            ready: self.ready.clone(),
        }
    }
}

impl<A, B> DispatchSender<A, B>
where
    A: Actor,
    B: MessageBroker<A::Message>,
{
    /// Enqueue `envelope` in the actor's mailbox, scheduling its cell with
    /// the dispatcher if it was idle.
    pub fn send(&self, envelope: MessageEnvelope<A::Message>) -> Result<(), DispatchError> {
        self.inner.send(envelope).map_err(|_| DispatchError::MailboxClosed)?;
        schedule(&self.registration, &self.ready);
        Ok(())
    }
}

/// A named worker-pool dispatcher.
///
/// `A`/`B` pin a dispatcher to one actor/broker pairing at compile time
/// rather than erasing it behind a trait object; sharing one worker pool
/// across unrelated actor types would need type erasure the rest of the
/// kernel deliberately avoids (§6.2). Two actor types that want to share a
/// scheduling budget instead run two `Dispatcher`s with the same `name` and
/// `parallelism`, which still gives them comparable fairness and the same
/// `dispatcher.<name>.*` metrics key.
pub struct Dispatcher<A: Actor, B: MessageBroker<A::Message>> {
    config: DispatcherConfig,
    ready_tx: UnboundedSender<Arc<Registration<A, B>>>,
    workers: JoinSet<()>,
}

impl<A, B> Dispatcher<A, B>
where
    A: Actor + Send + 'static,
    B: MessageBroker<A::Message> + 'static,
    A::Message: Message,
{
    /// Start the dispatcher's worker pool.
    pub fn start(config: DispatcherConfig) -> Self {
        let (ready_tx, ready_rx) = mpsc::unbounded_channel();
        let ready_rx = Arc::new(AsyncMutex::new(ready_rx));

        let mut workers = JoinSet::new();
        for worker_id in 0..config.parallelism {
            let ready_rx = Arc::clone(&ready_rx);
            let ready_tx = ready_tx.clone();
            let name = config.name.clone();
            let throughput = config.throughput;
            workers.spawn(worker::run(worker_id, name, ready_rx, ready_tx, throughput));
        }

        info!(dispatcher = %config.name, parallelism = config.parallelism, "dispatcher started");

        Self {
            config,
            ready_tx,
            workers,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn parallelism(&self) -> usize {
        self.config.parallelism
    }

    /// Register a freshly-built actor cell with this dispatcher, returning
    /// the sender half callers should hand out as the actor's mailbox
    /// address. `pre_start` does not run until the first message arrives.
    pub fn register(&self, cell: ActorCell<A, B>) -> DispatchSender<A, B> {
        let (tx, rx) = mpsc::unbounded_channel();
        let registration = Arc::new(Registration {
            slot: AsyncMutex::new(Some(Slot { cell, mailbox: rx })),
            scheduled: AtomicBool::new(false),
        });

        DispatchSender {
            inner: tx,
            registration,
            ready: self.ready_tx.clone(),
        }
    }

    /// Stop accepting new work and wait for every worker to drain its
    /// current quantum and exit.
    pub async fn shutdown(mut self) {
        drop(self.ready_tx);
        while self.workers.join_next().await.is_some() {}
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::actor::{ActorContext, ErrorAction};
    use crate::broker::InMemoryMessageBroker;
    use crate::util::ActorAddress;
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Tick;
    impl Message for Tick {
        const MESSAGE_TYPE: &'static str = "tick";
    }

    #[derive(Debug)]
    struct Boom;
    impl std::fmt::Display for Boom {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "boom")
        }
    }
    impl std::error::Error for Boom {}

    struct CountingActor {
        counter: Arc<AtomicU32>,
        fail_at: Option<u32>,
    }

    #[async_trait]
    impl Actor for CountingActor {
        type Message = Tick;
        type Error = Boom;

        async fn handle_message<Br: MessageBroker<Self::Message>>(
            &mut self,
            _message: Self::Message,
            _context: &mut ActorContext<Self::Message, Br>,
        ) -> Result<(), Self::Error> {
            let seen = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_at == Some(seen) {
                return Err(Boom);
            }
            Ok(())
        }

        async fn on_error<Br: MessageBroker<Self::Message>>(
            &mut self,
            _error: Self::Error,
            _context: &mut ActorContext<Self::Message, Br>,
        ) -> ErrorAction {
            ErrorAction::Stop
        }
    }

    fn cell(
        counter: Arc<AtomicU32>,
        fail_at: Option<u32>,
    ) -> ActorCell<CountingActor, InMemoryMessageBroker<Tick>> {
        let broker = InMemoryMessageBroker::<Tick>::new();
        let context = ActorContext::new(ActorAddress::anonymous(), broker);
        ActorCell::new(CountingActor { counter, fail_at }, context)
    }

    async fn wait_until(counter: &AtomicU32, target: u32) {
        for _ in 0..100 {
            if counter.load(Ordering::SeqCst) == target {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("counter never reached {target}");
    }

    #[tokio::test]
    async fn dispatcher_drives_a_registered_actor_to_completion() {
        let dispatcher: Dispatcher<CountingActor, InMemoryMessageBroker<Tick>> =
            Dispatcher::start(DispatcherConfig::new("test-pool", 2, 4));
        let counter = Arc::new(AtomicU32::new(0));

        let sender = dispatcher.register(cell(Arc::clone(&counter), None));
        for _ in 0..10 {
            sender.send(MessageEnvelope::new(Tick)).unwrap();
        }

        wait_until(&counter, 10).await;
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn send_after_the_cell_stops_reports_mailbox_closed() {
        let dispatcher: Dispatcher<CountingActor, InMemoryMessageBroker<Tick>> =
            Dispatcher::start(DispatcherConfig::new("test-pool", 1, 4));
        let counter = Arc::new(AtomicU32::new(0));
        let sender = dispatcher.register(cell(Arc::clone(&counter), Some(1)));

        sender.send(MessageEnvelope::new(Tick)).unwrap();
        wait_until(&counter, 1).await;
        // Give the worker time to observe the error and drop the slot.
        tokio::time::sleep(Duration::from_millis(20)).await;

        let err = sender.send(MessageEnvelope::new(Tick)).unwrap_err();
        assert_eq!(err, DispatchError::MailboxClosed);

        dispatcher.shutdown().await;
    }

    #[test]
    fn dispatcher_config_floors_parallelism_and_throughput_at_one() {
        let config = DispatcherConfig::new("zeroed", 0, 0);
        assert_eq!(config.parallelism, 1);
        assert_eq!(config.throughput, 1);
    }
}
