//! Commands sent from proxies and broadcasters to the stub task.

use crate::{sync::ResponseSender, EventId, MethodId, ReturnCode};
use bytes::Bytes;
use tokio::sync::mpsc;

/// Operation requested on a method or attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    /// Calls a method.
    Call,
    /// Reads the value of an attribute.
    Get,
    /// Replaces the value of an attribute.
    Set,
}

/// Reply to a request: the serialized results, or the reason of an error reply.
pub(crate) type Reply = Result<Bytes, ReturnCode>;

/// Operations that the stub task can be requested to perform.
#[derive(Debug)]
pub(crate) enum Command {
    /// Invokes a method or attribute with the serialized `body` and replies through `reply`.
    Invoke {
        method: MethodId,
        operation: Operation,
        body: Bytes,
        reply: ResponseSender<Bytes, ReturnCode>,
    },
    /// Registers `events` to receive the broadcasts of `event`.
    Subscribe {
        event: EventId,
        events: mpsc::Sender<Bytes>,
        ack: ResponseSender<(), ReturnCode>,
    },
    /// Delivers the serialized `body` to every subscriber of `event`.
    Fire { event: EventId, body: Bytes },
}
