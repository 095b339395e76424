//! Monitoring event types and configuration structures.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::traits::{EventSeverity, MonitoringEvent};
use crate::util::ActorId;

/// Configuration for monitoring behavior.
///
/// Controls how events are recorded, filtered, and stored in the monitor.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringConfig {
    /// Whether monitoring is enabled
    pub enabled: bool,

    /// Maximum number of events to keep in history
    pub max_history_size: usize,

    /// Minimum severity level to record (events below this are filtered)
    pub severity_filter: EventSeverity,

    /// Interval for snapshot generation (if using background snapshots)
    #[serde(with = "crate::util::duration_serde")]
    pub snapshot_interval: Duration,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_history_size: 1000,
            severity_filter: EventSeverity::Info,
            snapshot_interval: Duration::from_secs(60),
        }
    }
}

/// Snapshot of monitoring state at a point in time.
///
/// Provides queryable access to monitoring counters and recent event history.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringSnapshot<E: MonitoringEvent> {
    /// Timestamp when snapshot was taken
    pub timestamp: DateTime<Utc>,

    /// Total number of events recorded
    pub total_events: u64,

    /// Number of trace-level events
    pub trace_count: u64,

    /// Number of debug-level events
    pub debug_count: u64,

    /// Number of info-level events
    pub info_count: u64,

    /// Number of warning-level events
    pub warning_count: u64,

    /// Number of error-level events
    pub error_count: u64,

    /// Number of critical-level events
    pub critical_count: u64,

    /// Recent events (up to max_history_size)
    pub recent_events: Vec<E>,
}

// ============================================================================
// Supervision Events
// ============================================================================

/// Events related to supervisor operations and child management.
#[derive(Debug, Clone, Serialize)]
pub struct SupervisionEvent {
    /// Timestamp when event occurred (§3.2 chrono DateTime<Utc>)
    pub timestamp: DateTime<Utc>,

    /// ID of the supervisor
    pub supervisor_id: String,

    /// ID of the child actor (if applicable)
    pub child_id: Option<String>,

    /// Specific supervision event type
    pub event_kind: SupervisionEventKind,

    /// Additional event metadata
    pub metadata: HashMap<String, String>,
}

impl MonitoringEvent for SupervisionEvent {
    const EVENT_TYPE: &'static str = "supervision";

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn severity(&self) -> EventSeverity {
        match &self.event_kind {
            SupervisionEventKind::ChildStarted => EventSeverity::Info,
            SupervisionEventKind::ChildStopped => EventSeverity::Info,
            SupervisionEventKind::ChildFailed { .. } => EventSeverity::Error,
            SupervisionEventKind::ChildRestarted { .. } => EventSeverity::Warning,
            SupervisionEventKind::RestartLimitExceeded { .. } => EventSeverity::Critical,
            SupervisionEventKind::StrategyApplied { .. } => EventSeverity::Info,
        }
    }
}

/// Specific types of supervision events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum SupervisionEventKind {
    /// Child actor successfully started
    ChildStarted,

    /// Child actor gracefully stopped
    ChildStopped,

    /// Child actor failed with error
    ChildFailed {
        /// Error message
        error: String,
        /// Current restart count
        restart_count: u32,
    },

    /// Child actor was restarted after failure
    ChildRestarted {
        /// Restart count after this restart
        restart_count: u32,
    },

    /// Restart rate limit exceeded
    RestartLimitExceeded {
        /// Number of restarts attempted
        restart_count: u32,
        /// Time window for restart limit
        #[serde(with = "crate::util::duration_serde")]
        window: Duration,
    },

    /// Supervision strategy was applied
    StrategyApplied {
        /// Name of the strategy (OneForOne, OneForAll, RestForOne)
        strategy: String,
        /// Number of children affected
        affected_count: usize,
    },
}

// ============================================================================
// Actor Events
// ============================================================================

/// Events related to actor lifecycle and message processing.
#[derive(Debug, Clone, Serialize)]
pub struct ActorEvent {
    /// Timestamp when event occurred (§3.2 chrono DateTime<Utc>)
    pub timestamp: DateTime<Utc>,

    /// ID of the actor
    pub actor_id: ActorId,

    /// Specific actor event type
    pub event_kind: ActorEventKind,

    /// Additional event metadata
    pub metadata: HashMap<String, String>,
}

impl MonitoringEvent for ActorEvent {
    const EVENT_TYPE: &'static str = "actor";

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn severity(&self) -> EventSeverity {
        match &self.event_kind {
            ActorEventKind::Spawned => EventSeverity::Debug,
            ActorEventKind::Started => EventSeverity::Info,
            ActorEventKind::MessageReceived { .. } => EventSeverity::Trace,
            ActorEventKind::MessageProcessed { .. } => EventSeverity::Trace,
            ActorEventKind::ErrorOccurred { .. } => EventSeverity::Error,
            ActorEventKind::Stopped => EventSeverity::Info,
        }
    }
}

/// Specific types of actor events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ActorEventKind {
    /// Actor was spawned
    Spawned,

    /// Actor started execution
    Started,

    /// Actor received a message
    MessageReceived {
        /// Message type name
        message_type: String,
    },

    /// Actor finished processing a message
    MessageProcessed {
        /// Message type name
        message_type: String,
        /// Processing duration in microseconds
        duration_micros: u64,
    },

    /// Error occurred during actor execution
    ErrorOccurred {
        /// Error message
        error: String,
    },

    /// Actor stopped execution
    Stopped,
}

// ============================================================================
// System Events
// ============================================================================

/// Events related to actor system operations.
#[derive(Debug, Clone, Serialize)]
pub struct SystemEvent {
    /// Timestamp when event occurred (§3.2 chrono DateTime<Utc>)
    pub timestamp: DateTime<Utc>,

    /// Specific system event type
    pub event_kind: SystemEventKind,

    /// Additional event metadata
    pub metadata: HashMap<String, String>,
}

impl MonitoringEvent for SystemEvent {
    const EVENT_TYPE: &'static str = "system";

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn severity(&self) -> EventSeverity {
        match &self.event_kind {
            SystemEventKind::Started => EventSeverity::Info,
            SystemEventKind::Shutdown => EventSeverity::Info,
            SystemEventKind::ActorRegistered { .. } => EventSeverity::Debug,
            SystemEventKind::ActorDeregistered { .. } => EventSeverity::Debug,
            SystemEventKind::ConfigurationChanged => EventSeverity::Info,
        }
    }
}

/// Specific types of system events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum SystemEventKind {
    /// Actor system started
    Started,

    /// Actor system shutting down
    Shutdown,

    /// Actor registered with the system
    ActorRegistered {
        /// ID of the registered actor
        actor_id: ActorId,
    },

    /// Actor deregistered from the system
    ActorDeregistered {
        /// ID of the deregistered actor
        actor_id: ActorId,
    },

    /// System configuration was changed
    ConfigurationChanged,
}

// ============================================================================
// Broker Events
// ============================================================================

/// Events related to message broker operations.
#[derive(Debug, Clone, Serialize)]
pub struct BrokerEvent {
    /// Timestamp when event occurred (§3.2 chrono DateTime<Utc>)
    pub timestamp: DateTime<Utc>,

    /// Specific broker event type
    pub event_kind: BrokerEventKind,

    /// Additional event metadata
    pub metadata: HashMap<String, String>,
}

impl MonitoringEvent for BrokerEvent {
    const EVENT_TYPE: &'static str = "broker";

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn severity(&self) -> EventSeverity {
        match &self.event_kind {
            BrokerEventKind::MessagePublished { .. } => EventSeverity::Trace,
            BrokerEventKind::MessageRouted { .. } => EventSeverity::Trace,
            BrokerEventKind::SubscriberAdded { .. } => EventSeverity::Debug,
            BrokerEventKind::SubscriberRemoved { .. } => EventSeverity::Debug,
            BrokerEventKind::RoutingFailed { .. } => EventSeverity::Error,
            BrokerEventKind::DeadLetter { .. } => EventSeverity::Warning,
        }
    }
}

/// Specific types of broker events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum BrokerEventKind {
    /// Message published to broker
    MessagePublished {
        /// Message type name
        message_type: String,
    },

    /// Message successfully routed to actor
    MessageRouted {
        /// Destination actor ID
        actor_id: ActorId,
        /// Message type name
        message_type: String,
    },

    /// New subscriber added
    SubscriberAdded {
        /// Subscriber identifier
        subscriber_id: String,
    },

    /// Subscriber removed
    SubscriberRemoved {
        /// Subscriber identifier
        subscriber_id: String,
    },

    /// Failed to route message
    RoutingFailed {
        /// Target actor ID
        actor_id: ActorId,
        /// Failure reason
        reason: String,
    },

    /// Message sent to dead letter queue
    DeadLetter {
        /// Message type name
        message_type: String,
        /// Reason for dead lettering
        reason: String,
    },
}

// ============================================================================
// Mailbox Events
// ============================================================================

/// Events related to mailbox operations and backpressure.
#[derive(Debug, Clone, Serialize)]
pub struct MailboxEvent {
    /// Timestamp when event occurred (§3.2 chrono DateTime<Utc>)
    pub timestamp: DateTime<Utc>,

    /// ID of the actor owning the mailbox
    pub actor_id: ActorId,

    /// Specific mailbox event type
    pub event_kind: MailboxEventKind,

    /// Additional event metadata
    pub metadata: HashMap<String, String>,
}

impl MonitoringEvent for MailboxEvent {
    const EVENT_TYPE: &'static str = "mailbox";

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn severity(&self) -> EventSeverity {
        match &self.event_kind {
            MailboxEventKind::MessageEnqueued { .. } => EventSeverity::Trace,
            MailboxEventKind::MessageDequeued { .. } => EventSeverity::Trace,
            MailboxEventKind::BackpressureApplied { .. } => EventSeverity::Warning,
            MailboxEventKind::CapacityReached => EventSeverity::Warning,
            MailboxEventKind::MessageDropped { .. } => EventSeverity::Error,
        }
    }
}

/// Specific types of mailbox events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum MailboxEventKind {
    /// Message enqueued in mailbox
    MessageEnqueued {
        /// Current queue size
        queue_size: usize,
    },

    /// Message dequeued from mailbox
    MessageDequeued {
        /// Remaining queue size
        queue_size: usize,
    },

    /// Backpressure strategy applied
    BackpressureApplied {
        /// Strategy applied (Block, Drop, Error)
        strategy: String,
    },

    /// Mailbox capacity reached
    CapacityReached,

    /// Message dropped due to backpressure
    MessageDropped {
        /// Reason for dropping
        reason: String,
    },
}

// ============================================================================
// Cluster Events
// ============================================================================

/// Events related to cluster membership and gossip.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterEvent {
    /// Timestamp when event occurred (§3.2 chrono DateTime<Utc>)
    pub timestamp: DateTime<Utc>,

    /// Node address the event concerns.
    pub node: String,

    /// Specific cluster event type.
    pub event_kind: ClusterEventKind,

    /// Additional event metadata.
    pub metadata: HashMap<String, String>,
}

impl MonitoringEvent for ClusterEvent {
    const EVENT_TYPE: &'static str = "cluster";

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn severity(&self) -> EventSeverity {
        match &self.event_kind {
            ClusterEventKind::MemberJoined => EventSeverity::Info,
            ClusterEventKind::MemberUp => EventSeverity::Info,
            ClusterEventKind::MemberUnreachable => EventSeverity::Warning,
            ClusterEventKind::MemberDown => EventSeverity::Error,
            ClusterEventKind::MemberRemoved => EventSeverity::Info,
            ClusterEventKind::LeaderChanged { .. } => EventSeverity::Info,
            ClusterEventKind::SplitBrainResolved { .. } => EventSeverity::Critical,
        }
    }
}

/// Specific types of cluster membership events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ClusterEventKind {
    /// A node announced itself to the gossip ring.
    MemberJoined,
    /// A joining node's status converged to `Up`.
    MemberUp,
    /// The failure detector stopped hearing from a member.
    MemberUnreachable,
    /// A member was marked `Down` after the unreachable timeout elapsed.
    MemberDown,
    /// A down member was pruned from the membership table.
    MemberRemoved,
    /// Leader election produced a new leader.
    LeaderChanged {
        /// The new leader's node address, if any remains.
        new_leader: Option<String>,
    },
    /// A split-brain partition was resolved by the configured strategy.
    SplitBrainResolved {
        /// The strategy that made the decision (keep-majority, keep-oldest, static-quorum).
        strategy: String,
        /// Nodes downed as losers of the partition.
        downed: Vec<String>,
    },
}

// ============================================================================
// Shard Events
// ============================================================================

/// Events related to shard allocation and entity placement.
#[derive(Debug, Clone, Serialize)]
pub struct ShardEvent {
    /// Timestamp when event occurred (§3.2 chrono DateTime<Utc>)
    pub timestamp: DateTime<Utc>,

    /// The shard id the event concerns.
    pub shard_id: u32,

    /// Specific shard event type.
    pub event_kind: ShardEventKind,

    /// Additional event metadata.
    pub metadata: HashMap<String, String>,
}

impl MonitoringEvent for ShardEvent {
    const EVENT_TYPE: &'static str = "shard";

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn severity(&self) -> EventSeverity {
        match &self.event_kind {
            ShardEventKind::Allocated { .. } => EventSeverity::Info,
            ShardEventKind::HandoffStarted { .. } => EventSeverity::Info,
            ShardEventKind::HandoffCompleted { .. } => EventSeverity::Info,
            ShardEventKind::EntityPassivated { .. } => EventSeverity::Debug,
            ShardEventKind::EntityActivated { .. } => EventSeverity::Debug,
        }
    }
}

/// Specific types of shard events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ShardEventKind {
    /// The coordinator assigned this shard to a region.
    Allocated {
        /// The node the shard was allocated to.
        node: String,
    },
    /// A rebalance handoff began for this shard.
    HandoffStarted {
        /// Source node handing off.
        from: String,
        /// Destination node.
        to: String,
    },
    /// A rebalance handoff finished.
    HandoffCompleted {
        /// Destination node now hosting the shard.
        to: String,
    },
    /// An entity in this shard was passivated after its idle timeout.
    EntityPassivated {
        /// The entity id.
        entity_id: String,
    },
    /// An entity in this shard was lazily activated on first message.
    EntityActivated {
        /// The entity id.
        entity_id: String,
    },
}

// ============================================================================
// Pub/Sub Topic Events
// ============================================================================

/// Events related to distributed topic subscription.
#[derive(Debug, Clone, Serialize)]
pub struct TopicEvent {
    /// Timestamp when event occurred (§3.2 chrono DateTime<Utc>)
    pub timestamp: DateTime<Utc>,

    /// The topic name.
    pub topic: String,

    /// Specific topic event type.
    pub event_kind: TopicEventKind,

    /// Additional event metadata.
    pub metadata: HashMap<String, String>,
}

impl MonitoringEvent for TopicEvent {
    const EVENT_TYPE: &'static str = "topic";

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn severity(&self) -> EventSeverity {
        match &self.event_kind {
            TopicEventKind::Subscribed => EventSeverity::Debug,
            TopicEventKind::Unsubscribed => EventSeverity::Debug,
            TopicEventKind::Published { .. } => EventSeverity::Trace,
            TopicEventKind::TopicRetired => EventSeverity::Info,
        }
    }
}

/// Specific types of topic events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum TopicEventKind {
    /// A subscriber joined the topic.
    Subscribed,
    /// A subscriber left the topic (explicitly, or its node disconnected).
    Unsubscribed,
    /// A message was fanned out to the topic's local subscribers.
    Published {
        /// How many local subscribers received the message.
        subscriber_count: usize,
    },
    /// The last owner-scoped subscriber left and the topic was torn down.
    TopicRetired,
}

// ============================================================================
// Remote Transport Events
// ============================================================================

/// Events related to node-to-node transport connections.
#[derive(Debug, Clone, Serialize)]
pub struct TransportEvent {
    /// Timestamp when event occurred (§3.2 chrono DateTime<Utc>)
    pub timestamp: DateTime<Utc>,

    /// The peer node address the event concerns.
    pub peer: String,

    /// Specific transport event type.
    pub event_kind: TransportEventKind,

    /// Additional event metadata.
    pub metadata: HashMap<String, String>,
}

impl MonitoringEvent for TransportEvent {
    const EVENT_TYPE: &'static str = "transport";

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn severity(&self) -> EventSeverity {
        match &self.event_kind {
            TransportEventKind::Connected => EventSeverity::Info,
            TransportEventKind::Disconnected { .. } => EventSeverity::Warning,
            TransportEventKind::HandshakeFailed { .. } => EventSeverity::Error,
            TransportEventKind::BackpressureApplied => EventSeverity::Warning,
        }
    }
}

/// Specific types of transport events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum TransportEventKind {
    /// A framed connection to `peer` was established.
    Connected,
    /// The connection to `peer` was lost.
    Disconnected {
        /// Human-readable disconnect reason.
        reason: String,
    },
    /// The TLS/security handshake with `peer` failed.
    HandshakeFailed {
        /// Human-readable failure reason.
        reason: String,
    },
    /// Per-destination backpressure kicked in for `peer`.
    BackpressureApplied,
}
