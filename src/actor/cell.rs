//! `ActorCell`: the generalized per-actor run loop factored out of the
//! kernel's inline spawn task so the supervisor can drive restarts without
//! re-deriving the dequeue/dispatch/error-handling sequence at each call
//! site.

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;

// Layer 3: Internal module imports
use super::context::ActorContext;
use super::lifecycle::{ActorLifecycle, ActorState};
use super::traits::{Actor, ErrorAction};
use crate::broker::MessageBroker;
use crate::message::{Message, MessageEnvelope};

/// Outcome of running an actor cell to completion, handed back to whatever
/// spawned the task so it can decide whether to restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellExit {
    /// The actor stopped on its own terms (mailbox closed, or `Stop`/`Resume`-
    /// exhausted loop) with no pending supervisor action.
    Stopped,
    /// The actor's `on_error` hook asked for a restart.
    Restart,
    /// The actor's `on_error` hook asked to escalate to the parent supervisor.
    Escalate,
}

/// Outcome of running one scheduling quantum, used by a worker-pool
/// dispatcher to decide whether to requeue the cell, let it go idle until
/// its mailbox wakes it again, or drop it for good.
#[derive(Debug)]
pub enum QuantumOutcome {
    /// The mailbox ran dry before the throughput budget did.
    Idle,
    /// The throughput budget ran out with messages still queued.
    MoreWork,
    /// The cell reached a terminal state during this quantum.
    Stopped(CellExit),
}

/// Drives a single actor's lifecycle: `pre_start`, the dequeue loop, and
/// `post_stop`, tracking state transitions in an [`ActorLifecycle`].
///
/// Generic over the actor type and its broker, matching the zero-cost
/// dispatch used throughout the kernel (no `dyn Actor`).
pub struct ActorCell<A: Actor, B: MessageBroker<A::Message>> {
    actor: A,
    context: ActorContext<A::Message, B>,
    lifecycle: ActorLifecycle,
}

impl<A: Actor, B: MessageBroker<A::Message>> ActorCell<A, B> {
    /// Wrap `actor` for execution under `context`, starting in `Starting` state.
    pub fn new(actor: A, context: ActorContext<A::Message, B>) -> Self {
        Self {
            actor,
            context,
            lifecycle: ActorLifecycle::new(),
        }
    }

    /// The cell's current lifecycle state.
    pub fn state(&self) -> ActorState {
        self.lifecycle.state()
    }

    /// How many times this cell has restarted.
    pub fn restart_count(&self) -> u32 {
        self.lifecycle.restart_count()
    }

    /// Run `pre_start`, then dequeue and dispatch messages from `mailbox`
    /// until it closes or the actor asks to stop, restart, or escalate.
    pub async fn run(
        &mut self,
        mailbox: &mut UnboundedReceiver<MessageEnvelope<A::Message>>,
    ) -> CellExit
    where
        A::Message: Message,
    {
        self.lifecycle.transition_to(ActorState::Starting);

        if let Err(error) = self.actor.pre_start(&mut self.context).await {
            if let Some(exit) = self.handle_error(error).await {
                return exit;
            }
        }

        self.lifecycle.transition_to(ActorState::Running);

        let exit = loop {
            let Some(envelope) = mailbox.recv().await else {
                break CellExit::Stopped;
            };

            self.context.set_current_correlation_id(envelope.correlation_id);
            match self.actor.handle_message(envelope.payload, &mut self.context).await {
                Ok(()) => continue,
                Err(error) => match self.handle_error(error).await {
                    None => continue,
                    Some(exit) => break exit,
                },
            }
        };

        self.lifecycle.transition_to(ActorState::Stopping);
        let _ = self.actor.post_stop(&mut self.context).await;
        self.lifecycle.transition_to(ActorState::Stopped);

        exit
    }

    /// Like [`ActorCell::run`], but stops the actor (reporting
    /// [`CellExit::Stopped`]) if no message arrives within `idle_timeout`.
    /// Used by sharded entities to passivate after a period of inactivity
    /// instead of holding a mailbox and task open forever.
    pub async fn run_with_idle_timeout(
        &mut self,
        mailbox: &mut UnboundedReceiver<MessageEnvelope<A::Message>>,
        idle_timeout: Duration,
    ) -> CellExit
    where
        A::Message: Message,
    {
        self.lifecycle.transition_to(ActorState::Starting);

        if let Err(error) = self.actor.pre_start(&mut self.context).await {
            if let Some(exit) = self.handle_error(error).await {
                return exit;
            }
        }

        self.lifecycle.transition_to(ActorState::Running);

        let exit = loop {
            let envelope = match tokio::time::timeout(idle_timeout, mailbox.recv()).await {
                Ok(Some(envelope)) => envelope,
                Ok(None) => break CellExit::Stopped,
                Err(_elapsed) => break CellExit::Stopped,
            };

            self.context.set_current_correlation_id(envelope.correlation_id);
            match self.actor.handle_message(envelope.payload, &mut self.context).await {
                Ok(()) => continue,
                Err(error) => match self.handle_error(error).await {
                    None => continue,
                    Some(exit) => break exit,
                },
            }
        };

        self.lifecycle.transition_to(ActorState::Stopping);
        let _ = self.actor.post_stop(&mut self.context).await;
        self.lifecycle.transition_to(ActorState::Stopped);

        exit
    }

    /// Run at most `quantum` messages from `mailbox` before returning
    /// control to the caller, instead of looping until the mailbox closes.
    /// Lets a worker-pool dispatcher time-slice many actors across a fixed
    /// set of tasks rather than giving each one its own `tokio::spawn`ed
    /// loop. Runs `pre_start` on the first call; `post_stop` once the cell
    /// reaches a terminal state.
    pub async fn run_quantum(
        &mut self,
        mailbox: &mut UnboundedReceiver<MessageEnvelope<A::Message>>,
        quantum: usize,
    ) -> QuantumOutcome
    where
        A::Message: Message,
    {
        if self.lifecycle.state() == ActorState::Starting {
            if let Err(error) = self.actor.pre_start(&mut self.context).await {
                if let Some(exit) = self.handle_error(error).await {
                    return self.finish(exit).await;
                }
            }
            self.lifecycle.transition_to(ActorState::Running);
        }

        for _ in 0..quantum.max(1) {
            let envelope = match mailbox.try_recv() {
                Ok(envelope) => envelope,
                Err(TryRecvError::Empty) => return QuantumOutcome::Idle,
                Err(TryRecvError::Disconnected) => return self.finish(CellExit::Stopped).await,
            };

            self.context.set_current_correlation_id(envelope.correlation_id);
            if let Err(error) = self.actor.handle_message(envelope.payload, &mut self.context).await {
                if let Some(exit) = self.handle_error(error).await {
                    return self.finish(exit).await;
                }
            }
        }

        QuantumOutcome::MoreWork
    }

    /// Run the stopping sequence and report a terminal [`QuantumOutcome`].
    async fn finish(&mut self, exit: CellExit) -> QuantumOutcome {
        self.lifecycle.transition_to(ActorState::Stopping);
        let _ = self.actor.post_stop(&mut self.context).await;
        self.lifecycle.transition_to(ActorState::Stopped);
        QuantumOutcome::Stopped(exit)
    }

    /// Consult `on_error`; `None` means the cell should keep dequeuing,
    /// `Some` carries the terminal outcome to return from `run`.
    async fn handle_error(&mut self, error: A::Error) -> Option<CellExit> {
        self.lifecycle.transition_to(ActorState::Suspended);
        match self.actor.on_error(error, &mut self.context).await {
            ErrorAction::Stop => Some(CellExit::Stopped),
            ErrorAction::Resume => {
                self.lifecycle.transition_to(ActorState::Running);
                None
            }
            ErrorAction::Restart => {
                self.lifecycle.transition_to(ActorState::Restarting);
                Some(CellExit::Restart)
            }
            ErrorAction::Escalate => Some(CellExit::Escalate),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::broker::InMemoryMessageBroker;
    use crate::util::ActorAddress;
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use tokio::sync::mpsc::unbounded_channel;

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
        seen: u32,
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
            self.seen += 1;
            if self.fail_at == Some(self.seen) {
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

    #[tokio::test]
    async fn cell_processes_messages_until_mailbox_closes() {
        let broker = InMemoryMessageBroker::<Tick>::new();
        let context = ActorContext::new(ActorAddress::anonymous(), broker);
        let mut cell = ActorCell::new(
            CountingActor {
                seen: 0,
                fail_at: None,
            },
            context,
        );

        let (sender, mut mailbox) = unbounded_channel();
        sender.send(MessageEnvelope::new(Tick)).unwrap();
        sender.send(MessageEnvelope::new(Tick)).unwrap();
        drop(sender);

        let exit = cell.run(&mut mailbox).await;
        assert_eq!(exit, CellExit::Stopped);
        assert_eq!(cell.state(), ActorState::Stopped);
    }

    #[tokio::test]
    async fn cell_reports_stop_on_handler_error() {
        let broker = InMemoryMessageBroker::<Tick>::new();
        let context = ActorContext::new(ActorAddress::anonymous(), broker);
        let mut cell = ActorCell::new(
            CountingActor {
                seen: 0,
                fail_at: Some(1),
            },
            context,
        );

        let (sender, mut mailbox) = unbounded_channel();
        sender.send(MessageEnvelope::new(Tick)).unwrap();

        let exit = cell.run(&mut mailbox).await;
        assert_eq!(exit, CellExit::Stopped);
        assert_eq!(cell.state(), ActorState::Stopped);
    }

    #[tokio::test]
    async fn idle_timeout_passivates_when_no_messages_arrive() {
        let broker = InMemoryMessageBroker::<Tick>::new();
        let context = ActorContext::new(ActorAddress::anonymous(), broker);
        let mut cell = ActorCell::new(
            CountingActor {
                seen: 0,
                fail_at: None,
            },
            context,
        );

        let (_sender, mut mailbox) = unbounded_channel::<MessageEnvelope<Tick>>();
        let exit = cell
            .run_with_idle_timeout(&mut mailbox, Duration::from_millis(20))
            .await;
        assert_eq!(exit, CellExit::Stopped);
        assert_eq!(cell.state(), ActorState::Stopped);
    }

    #[tokio::test]
    async fn run_quantum_reports_idle_on_empty_mailbox() {
        let broker = InMemoryMessageBroker::<Tick>::new();
        let context = ActorContext::new(ActorAddress::anonymous(), broker);
        let mut cell = ActorCell::new(
            CountingActor {
                seen: 0,
                fail_at: None,
            },
            context,
        );

        let (_sender, mut mailbox) = unbounded_channel::<MessageEnvelope<Tick>>();
        let outcome = cell.run_quantum(&mut mailbox, 4).await;
        assert!(matches!(outcome, QuantumOutcome::Idle));
        assert_eq!(cell.state(), ActorState::Running);
    }

    #[tokio::test]
    async fn run_quantum_stops_at_the_throughput_budget_with_more_work_left() {
        let broker = InMemoryMessageBroker::<Tick>::new();
        let context = ActorContext::new(ActorAddress::anonymous(), broker);
        let mut cell = ActorCell::new(
            CountingActor {
                seen: 0,
                fail_at: None,
            },
            context,
        );

        let (sender, mut mailbox) = unbounded_channel();
        for _ in 0..5 {
            sender.send(MessageEnvelope::new(Tick)).unwrap();
        }

        let outcome = cell.run_quantum(&mut mailbox, 2).await;
        assert!(matches!(outcome, QuantumOutcome::MoreWork));
        assert_eq!(cell.state(), ActorState::Running);

        let outcome = cell.run_quantum(&mut mailbox, 2).await;
        assert!(matches!(outcome, QuantumOutcome::MoreWork));

        let outcome = cell.run_quantum(&mut mailbox, 2).await;
        assert!(matches!(outcome, QuantumOutcome::Idle));
    }

    #[tokio::test]
    async fn run_quantum_reports_stopped_when_mailbox_closes() {
        let broker = InMemoryMessageBroker::<Tick>::new();
        let context = ActorContext::new(ActorAddress::anonymous(), broker);
        let mut cell = ActorCell::new(
            CountingActor {
                seen: 0,
                fail_at: None,
            },
            context,
        );

        let (sender, mut mailbox) = unbounded_channel::<MessageEnvelope<Tick>>();
        drop(sender);

        let outcome = cell.run_quantum(&mut mailbox, 4).await;
        assert!(matches!(outcome, QuantumOutcome::Stopped(CellExit::Stopped)));
        assert_eq!(cell.state(), ActorState::Stopped);
    }

    #[tokio::test]
    async fn run_quantum_reports_stopped_on_handler_error_mid_quantum() {
        let broker = InMemoryMessageBroker::<Tick>::new();
        let context = ActorContext::new(ActorAddress::anonymous(), broker);
        let mut cell = ActorCell::new(
            CountingActor {
                seen: 0,
                fail_at: Some(2),
            },
            context,
        );

        let (sender, mut mailbox) = unbounded_channel();
        sender.send(MessageEnvelope::new(Tick)).unwrap();
        sender.send(MessageEnvelope::new(Tick)).unwrap();
        sender.send(MessageEnvelope::new(Tick)).unwrap();

        let outcome = cell.run_quantum(&mut mailbox, 10).await;
        assert!(matches!(outcome, QuantumOutcome::Stopped(CellExit::Stopped)));
        assert_eq!(cell.state(), ActorState::Stopped);
    }
}
