//! Blocking dispatcher variant: one dedicated OS thread per registered
//! actor via `tokio::task::spawn_blocking`, for actors whose message
//! handling does synchronous, not-Tokio-aware I/O (file access, FFI,
//! CPU-bound parsing) that would otherwise starve the async worker pool.
//!
//! Unlike [`super::pool::Dispatcher`], there is no shared ready queue or
//! throughput quantum here: a blocking call can't be time-sliced
//! cooperatively, so each registration gets its own thread for its whole
//! lifetime rather than competing for a pool slot.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinSet;
use tracing::{debug, info};

// Layer 3: Internal module imports
use super::DispatchError;
use crate::actor::{Actor, ActorCell};
use crate::broker::MessageBroker;
use crate::message::{Message, MessageEnvelope};

/// Sender handle returned by [`BlockingDispatcher::register`].
pub struct BlockingSender<A: Actor> {
    inner: UnboundedSender<MessageEnvelope<A::Message>>,
}

impl<A: Actor> Clone for BlockingSender<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A: Actor> BlockingSender<A> {
    pub fn send(&self, envelope: MessageEnvelope<A::Message>) -> Result<(), DispatchError> {
        self.inner.send(envelope).map_err(|_| DispatchError::MailboxClosed)
    }
}

/// A dispatcher that runs each registered actor cell to completion on its
/// own blocking thread, via `Handle::block_on` inside `spawn_blocking`.
pub struct BlockingDispatcher {
    name: String,
    handle: Handle,
    tasks: JoinSet<()>,
}

impl BlockingDispatcher {
    /// Capture the current Tokio runtime handle so registered cells can be
    /// driven from inside a blocking thread, which has no runtime context
    /// of its own.
    pub fn start(name: impl Into<String>) -> Self {
        let name = name.into();
        info!(dispatcher = %name, "blocking dispatcher started");
        Self {
            name,
            handle: Handle::current(),
            tasks: JoinSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register `cell`, spawning its full run loop on a dedicated blocking
    /// thread. `pre_start` runs as soon as the thread is scheduled, not
    /// lazily on first message.
    pub fn register<A, B>(&mut self, mut cell: ActorCell<A, B>) -> BlockingSender<A>
    where
        A: Actor + Send + 'static,
        B: MessageBroker<A::Message> + Send + 'static,
        A::Message: Message,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = self.handle.clone();
        let dispatcher_name = self.name.clone();

        self.tasks.spawn_blocking(move || {
            let exit = handle.block_on(cell.run(&mut rx));
            debug!(dispatcher = %dispatcher_name, ?exit, "blocking actor cell stopped");
        });

        BlockingSender { inner: tx }
    }

    /// Wait for every registered cell's thread to finish. Callers must stop
    /// sending (drop every [`BlockingSender`]) first; there is no
    /// `ready_tx` to close, since blocking threads aren't pulled from a
    /// shared queue.
    pub async fn shutdown(mut self) {
        while self.tasks.join_next().await.is_some() {}
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
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
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
            self.counter.fetch_add(1, Ordering::SeqCst);
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
    async fn blocking_dispatcher_drives_a_registered_actor_to_completion() {
        let mut dispatcher = BlockingDispatcher::start("blocking-pool");
        let counter = Arc::new(AtomicU32::new(0));

        let broker = InMemoryMessageBroker::<Tick>::new();
        let context = ActorContext::new(ActorAddress::anonymous(), broker);
        let cell = ActorCell::new(
            CountingActor {
                counter: Arc::clone(&counter),
            },
            context,
        );
        let sender = dispatcher.register(cell);

        for _ in 0..5 {
            sender.send(MessageEnvelope::new(Tick)).unwrap();
        }

        wait_until(&counter, 5).await;
        drop(sender);
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn dropping_every_sender_lets_the_blocking_thread_exit() {
        let mut dispatcher = BlockingDispatcher::start("blocking-pool");
        let counter = Arc::new(AtomicU32::new(0));

        let broker = InMemoryMessageBroker::<Tick>::new();
        let context = ActorContext::new(ActorAddress::anonymous(), broker);
        let cell = ActorCell::new(CountingActor { counter }, context);
        let sender = dispatcher.register(cell);

        drop(sender.clone());
        drop(sender);

        // shutdown() only returns once the blocking thread's run loop sees
        // its mailbox close and returns; a hang here means the sender drop
        // above didn't actually close the channel.
        tokio::time::timeout(Duration::from_secs(2), dispatcher.shutdown())
            .await
            .expect("dispatcher shutdown should complete once every sender is dropped");
    }
}
