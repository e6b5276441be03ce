use thiserror::Error;

use crate::short_channel_id::ShortChannelId;

/// Errors the router can return to a caller. Maps 1:1 onto §7 of the spec.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum RouterError {
    /// Bad signature, unknown chain hash, or malformed direction flags.
    /// Callers reply with a protocol `Error` frame and must not have mutated
    /// state before returning this.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// An update referenced a channel never seen and not under validation.
    /// Dropped silently after acknowledgement; kept as a typed variant so
    /// callers can still observe/log it if they want to.
    #[error("update for unknown channel {0}")]
    UnknownChannel(ShortChannelId),

    /// No endpoint present in the working graph, or no path between them.
    #[error("no route found")]
    RouteNotFound,

    /// `source == target` in a route request.
    #[error("cannot route to self")]
    CannotRouteToSelf,

    /// The persistence layer failed. Fatal to the event loop: the router
    /// does not retry persistence calls itself.
    #[error("persistence failure: {0}")]
    PersistenceFailure(#[from] PersistError),
}

/// Errors surfaced by a [`ChannelPersister`](crate) implementation. Kept
/// separate from [`RouterError`] so persistence backends don't need to know
/// about routing-specific failure modes.
#[derive(Debug, Error, Eq, PartialEq)]
#[error("{message}")]
pub struct PersistError {
    pub message: String,
}

impl PersistError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
