//! Hierarchical actor paths and cluster-aware actor references.
//!
//! The kernel addresses local actors by path (`/user/...`, `/system/...`);
//! [`ActorRef`] pairs a path with the system address that hosts it so refs
//! stay meaningful once remote transport is involved.

// Layer 1: Standard library imports
use std::fmt::{self, Display};
use std::marker::PhantomData;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use super::ids::ActorId;
use crate::message::Message;

/// The three guardian roots every actor path descends from.
///
/// `Root` is the system's own guardian and is never a valid spawn target
/// for application actors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Guardian {
    /// `/` — hosts the `user` and `system` guardians.
    Root,
    /// `/user` — application-spawned actors live here.
    User,
    /// `/system` — kernel-internal actors (shard regions, topic registry, singleton coordinators).
    System,
}

impl Display for Guardian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, ""),
            Self::User => write!(f, "user"),
            Self::System => write!(f, "system"),
        }
    }
}

/// A hierarchical actor path, e.g. `/user/shard-region-Worker/w-42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorPath {
    guardian: Guardian,
    segments: Vec<String>,
}

impl ActorPath {
    /// The path of the root guardian itself.
    pub fn root() -> Self {
        Self {
            guardian: Guardian::Root,
            segments: Vec::new(),
        }
    }

    /// A path rooted under `/user` with a single named segment.
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            guardian: Guardian::User,
            segments: vec![name.into()],
        }
    }

    /// A path rooted under `/system` with a single named segment.
    pub fn system(name: impl Into<String>) -> Self {
        Self {
            guardian: Guardian::System,
            segments: vec![name.into()],
        }
    }

    /// Derive a child path by appending a local name.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        Self {
            guardian: self.guardian,
            segments,
        }
    }

    /// The guardian this path descends from.
    pub fn guardian(&self) -> Guardian {
        self.guardian
    }

    /// The path segments below the guardian, root to leaf.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The leaf (local) name of this path, if any.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The parent path, or `None` if this path is a guardian root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self {
            guardian: self.guardian,
            segments,
        })
    }
}

impl Display for ActorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.guardian)?;
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// A node's address within the cluster — `host:port` or an equivalent
/// opaque, stable identifier. Used as the system-address half of an
/// [`ActorRef`] and as the gossip/transport peer identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeAddress(String);

impl NodeAddress {
    /// Wrap a `host:port` (or equivalent) string as a node address.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// The raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NodeAddress {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NodeAddress {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A typed, cluster-aware reference to an actor: `(system-address, path)`
/// plus the incarnation identity needed to detect stale refs after a stop
/// — creating a new incarnation after stop yields a new ref; callers
/// holding the old ref see messages silently dropped.
///
/// `ActorRef<M>` is a zero-cost typed wrapper over an untyped identity —
/// the `PhantomData<fn() -> M>` carries no data and does not constrain
/// `M`'s own `Send`/`Sync`/`Clone` bounds.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActorRef<M: Message> {
    node: NodeAddress,
    path: ActorPath,
    incarnation: ActorId,
    #[serde(skip)]
    _marker: PhantomData<fn() -> M>,
}

impl<M: Message> Clone for ActorRef<M> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            path: self.path.clone(),
            incarnation: self.incarnation,
            _marker: PhantomData,
        }
    }
}

impl<M: Message> PartialEq for ActorRef<M> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && self.path == other.path && self.incarnation == other.incarnation
    }
}
impl<M: Message> Eq for ActorRef<M> {}

impl<M: Message> ActorRef<M> {
    /// Construct a reference to an actor hosted on `node` at `path`, bound
    /// to the incarnation identity `incarnation` (a fresh [`ActorId`] is
    /// minted for every new incarnation of the same path).
    pub fn new(node: NodeAddress, path: ActorPath, incarnation: ActorId) -> Self {
        Self {
            node,
            path,
            incarnation,
            _marker: PhantomData,
        }
    }

    /// The node hosting this actor.
    pub fn node(&self) -> &NodeAddress {
        &self.node
    }

    /// The actor's path.
    pub fn path(&self) -> &ActorPath {
        &self.path
    }

    /// The incarnation identity this ref was minted against.
    pub fn incarnation(&self) -> ActorId {
        self.incarnation
    }

    /// Reinterpret this reference as carrying a different message type.
    ///
    /// Used at protocol boundaries (e.g. embedding a typed reply-to ref
    /// inside an envelope of a different message type) where the caller
    /// is responsible for the type being correct.
    pub fn retype<N: Message>(&self) -> ActorRef<N> {
        ActorRef {
            node: self.node.clone(),
            path: self.path.clone(),
            incarnation: self.incarnation,
            _marker: PhantomData,
        }
    }
}

impl<M: Message> Display for ActorRef<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}#{}", self.node, self.path, self.incarnation)
    }
}
