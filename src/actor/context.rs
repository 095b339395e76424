//! Actor execution context: the handle a running behavior uses to reach
//! its own identity, send to other actors, watch children, and ask for a
//! reply — without ever touching the broker or dispatcher directly.

// Layer 1: Standard library imports
use std::marker::PhantomData;
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc}; // §3.2 MANDATORY
use dashmap::DashMap;

// Layer 3: Internal module imports
use crate::broker::MessageBroker;
use crate::message::{Message, MessageEnvelope};
use crate::util::{ActorAddress, ActorId};

/// Per-actor execution context, handed to `Actor::handle_message` (and the
/// other lifecycle hooks) on every invocation.
///
/// Generic over the broker type `B` so tests can substitute a mock broker
/// (ADR-006 dependency injection) without the kernel reaching for `dyn`.
pub struct ActorContext<M: Message, B: MessageBroker<M>> {
    address: ActorAddress,
    id: ActorId,
    broker: B,
    parent: Option<ActorAddress>,
    children: DashMap<String, ActorAddress>,
    created_at: DateTime<Utc>,
    /// Correlation id of the envelope currently being handled, set by the
    /// cell right before `handle_message` runs a message that was sent via
    /// `request`/`ask`. `None` for fire-and-forget `tell`s.
    current_correlation_id: Option<uuid::Uuid>,
    _marker: PhantomData<M>,
}

impl<M: Message, B: MessageBroker<M>> ActorContext<M, B> {
    /// Create a new actor context bound to `address` and routed through `broker`.
    pub fn new(address: ActorAddress, broker: B) -> Self {
        Self {
            id: *address.id(),
            address,
            broker,
            parent: None,
            children: DashMap::new(),
            created_at: Utc::now(), // §3.2
            current_correlation_id: None,
            _marker: PhantomData,
        }
    }

    /// Create a child context with `parent` recorded for `Terminated` routing.
    pub fn with_parent(address: ActorAddress, broker: B, parent: ActorAddress) -> Self {
        let mut ctx = Self::new(address, broker);
        ctx.parent = Some(parent);
        ctx
    }

    /// This actor's address.
    pub fn address(&self) -> &ActorAddress {
        &self.address
    }

    /// This actor's id.
    pub fn id(&self) -> &ActorId {
        &self.id
    }

    /// This context's creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// This actor's parent, if it has one (the root guardian does not).
    pub fn parent(&self) -> Option<&ActorAddress> {
        self.parent.as_ref()
    }

    /// The broker used for outbound routing; exposed so callers building
    /// on top of the kernel (sharding, pub/sub) can route without
    /// re-deriving context plumbing.
    pub fn broker(&self) -> &B {
        &self.broker
    }

    /// Record a child under `local_name`, failing with `NameInUse`
    /// semantics left to the caller (the cell enforces uniqueness at
    /// spawn time; this records the already-validated mapping).
    pub fn register_child(&self, local_name: impl Into<String>, address: ActorAddress) {
        self.children.insert(local_name.into(), address);
    }

    /// Remove a child mapping, typically on `Terminated`.
    pub fn remove_child(&self, local_name: &str) -> Option<ActorAddress> {
        self.children.remove(local_name).map(|(_, addr)| addr)
    }

    /// This actor's children, by local name.
    pub fn children(&self) -> Vec<ActorAddress> {
        self.children.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Fire-and-forget send to `target`. Builds the envelope with this
    /// actor as `sender` and routes through the broker.
    pub async fn tell(&self, target: ActorAddress, message: M) -> Result<(), B::Error>
    where
        M: serde::Serialize,
    {
        let envelope = MessageEnvelope::new(message)
            .with_sender(self.address.clone())
            .with_reply_to(target);
        self.broker.send(envelope).await
    }

    /// Request/response send: awaits a reply of type `R` within `deadline`.
    /// Most application code should prefer the fluent `ask` builder
    /// (`crate::ask`); this is the low-level primitive it is built on.
    pub async fn request<R>(
        &self,
        target: ActorAddress,
        message: M,
        deadline: Duration,
    ) -> Result<Option<MessageEnvelope<R>>, B::Error>
    where
        M: serde::Serialize,
        R: Message + for<'de> serde::Deserialize<'de>,
    {
        let envelope = MessageEnvelope::new(message)
            .with_sender(self.address.clone())
            .with_reply_to(target);
        self.broker.request(envelope, deadline).await
    }

    /// Start a fluent ask against `target` with `message`, to be configured
    /// with a deadline and executed via `crate::ask::AskBuilder`. Most
    /// application code should prefer this over calling `request` directly.
    pub fn ask(&self, target: ActorAddress, message: M) -> crate::ask::AskBuilder<'_, M, B> {
        crate::ask::AskBuilder::new(self, target, message)
    }

    /// Record the correlation id of the envelope about to be handled. Called
    /// by `ActorCell` before dispatching to `Actor::handle_message`; not
    /// meant to be called from application code.
    pub(crate) fn set_current_correlation_id(&mut self, correlation_id: Option<uuid::Uuid>) {
        self.current_correlation_id = correlation_id;
    }

    /// Reply to whoever is awaiting the message currently being handled.
    ///
    /// A no-op returning `Ok(())` if the current message wasn't sent via
    /// `request`/`ask` (no correlation id to reply against) — callers that
    /// always want request semantics should check `is_request()` first.
    pub async fn reply<R>(&self, reply: R) -> Result<(), B::Error>
    where
        R: Message + serde::Serialize,
    {
        match self.current_correlation_id {
            Some(correlation_id) => self.broker.reply(correlation_id, reply).await,
            None => Ok(()),
        }
    }

    /// Whether the message currently being handled was sent via
    /// `request`/`ask` and so has a pending reply waiting on it.
    pub fn is_request(&self) -> bool {
        self.current_correlation_id.is_some()
    }
}
