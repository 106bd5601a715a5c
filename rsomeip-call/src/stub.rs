//! Service side of the loopback channel.

use crate::{
    command::{Command, Operation, Reply},
    decode, encode, CallError, EventId, MethodDeployment, MethodId, ReturnCode,
};
use bytes::Bytes;
use rsomeip_deploy::{ByteOrder, Deployment, Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Serves a single method or attribute.
type Handler = Box<dyn FnMut(Operation, Bytes, ByteOrder) -> Reply + Send>;

/// Serves the methods and attributes of a service interface to a [`Proxy`].
///
/// Created by [`channel`]. Register methods and attributes, then [`spawn`] the stub to start
/// serving requests.
///
/// [`Proxy`]: crate::Proxy
/// [`channel`]: crate::channel
/// [`spawn`]: Stub::spawn
#[derive(Debug)]
pub struct Stub {
    /// Channel for firing broadcasts once the stub is spawned.
    sender: mpsc::Sender<Command>,
    task: StubTask,
}

impl Stub {
    /// Creates a new [`Stub`].
    pub(crate) fn new(sender: mpsc::Sender<Command>, commands: mpsc::Receiver<Command>) -> Self {
        Self {
            sender,
            task: StubTask {
                commands,
                handlers: HashMap::new(),
                subscribers: HashMap::new(),
                byte_order: ByteOrder::default(),
            },
        }
    }

    /// Returns `self` with the given byte order for numeric values.
    #[must_use]
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.task.byte_order = byte_order;
        self
    }

    /// Returns `self` with the given method.
    ///
    /// Requests whose arguments cannot be deserialized are answered with
    /// [`ReturnCode::MalformedMessage`], without calling `handler`. Results that cannot be
    /// serialized are answered with [`ReturnCode::NotOk`].
    #[must_use]
    pub fn with_method<In, Out, F>(
        mut self,
        id: MethodId,
        deployment: MethodDeployment,
        mut handler: F,
    ) -> Self
    where
        In: Deserialize + 'static,
        Out: Serialize + 'static,
        F: FnMut(In) -> Out + Send + 'static,
    {
        let handler = move |operation: Operation, body: Bytes, byte_order: ByteOrder| -> Reply {
            if operation != Operation::Call {
                return Err(ReturnCode::WrongMessageType);
            }
            let args = decode::<In>(body, deployment.in_args.as_ref(), byte_order)
                .map_err(|error| {
                    tracing::warn!(method = %id, %error, "dropping malformed request");
                    ReturnCode::MalformedMessage
                })?;
            let results = handler(args);
            encode(&results, deployment.out_args.as_ref(), byte_order).map_err(|error| {
                tracing::warn!(method = %id, %error, "failed to serialize the reply");
                ReturnCode::NotOk
            })
        };
        _ = self.task.handlers.insert(id, Box::new(handler));
        self
    }

    /// Returns `self` with the given attribute, holding `initial` as its value.
    ///
    /// A set request replaces the value and is answered with the value held afterwards. Values
    /// that cannot be deserialized leave the attribute untouched.
    #[must_use]
    pub fn with_attribute<T>(mut self, id: MethodId, deployment: Option<Deployment>, initial: T) -> Self
    where
        T: Serialize + Deserialize + Send + 'static,
    {
        let mut value = initial;
        let handler = move |operation: Operation, body: Bytes, byte_order: ByteOrder| -> Reply {
            match operation {
                Operation::Call => return Err(ReturnCode::WrongMessageType),
                Operation::Get => {}
                Operation::Set => {
                    value = decode(body, deployment.as_ref(), byte_order).map_err(|error| {
                        tracing::warn!(attribute = %id, %error, "dropping malformed value");
                        ReturnCode::MalformedMessage
                    })?;
                }
            }
            encode(&value, deployment.as_ref(), byte_order).map_err(|error| {
                tracing::warn!(attribute = %id, %error, "failed to serialize the value");
                ReturnCode::NotOk
            })
        };
        _ = self.task.handlers.insert(id, Box::new(handler));
        self
    }

    /// Spawns a task serving requests until every [`Proxy`] and [`Broadcaster`] is dropped.
    ///
    /// Returns a [`Broadcaster`] to fire broadcasts to subscribed proxies.
    ///
    /// # Runtime
    ///
    /// This method must be called from within a tokio runtime.
    ///
    /// [`Proxy`]: crate::Proxy
    pub fn spawn(self) -> Broadcaster {
        let Self { sender, task } = self;
        let broadcaster = Broadcaster {
            commands: sender,
            byte_order: task.byte_order,
        };
        tokio::spawn(task.serve());
        broadcaster
    }
}

/// State of a spawned [`Stub`].
struct StubTask {
    commands: mpsc::Receiver<Command>,
    handlers: HashMap<MethodId, Handler>,
    subscribers: HashMap<EventId, Vec<mpsc::Sender<Bytes>>>,
    byte_order: ByteOrder,
}

impl std::fmt::Debug for StubTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubTask")
            .field("methods", &self.handlers.keys().collect::<Vec<_>>())
            .field("events", &self.subscribers.keys().collect::<Vec<_>>())
            .field("byte_order", &self.byte_order)
            .finish_non_exhaustive()
    }
}

impl StubTask {
    async fn serve(mut self) {
        tracing::trace!(stub = ?self, "serving requests");
        while let Some(command) = self.commands.recv().await {
            match command {
                Command::Invoke {
                    method,
                    operation,
                    body,
                    reply,
                } => {
                    let response = match self.handlers.get_mut(&method) {
                        Some(handler) => handler(operation, body, self.byte_order),
                        None => Err(ReturnCode::UnknownMethod),
                    };
                    reply.send(response);
                }
                Command::Subscribe { event, events, ack } => {
                    self.subscribers.entry(event).or_default().push(events);
                    ack.send(Ok(()));
                }
                Command::Fire { event, body } => self.fire(event, &body),
            }
        }
        tracing::trace!("stub closed");
    }

    /// Delivers `body` to the subscribers of `event`, forgetting those that are gone.
    fn fire(&mut self, event: EventId, body: &Bytes) {
        let Some(subscribers) = self.subscribers.get_mut(&event) else {
            return;
        };
        subscribers.retain(|subscriber| match subscriber.try_send(body.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(%event, "subscriber is lagging, dropping broadcast");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }
}

/// Fires broadcasts from a spawned [`Stub`].
#[derive(Debug, Clone)]
pub struct Broadcaster {
    commands: mpsc::Sender<Command>,
    byte_order: ByteOrder,
}

impl Broadcaster {
    /// Fires `value` to every subscriber of `event`.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Serialization`] if the value cannot be serialized, in which case
    /// nothing is delivered, or [`CallError::Closed`] if the stub is gone.
    pub async fn fire<T>(
        &self,
        event: EventId,
        value: &T,
        deployment: Option<&Deployment>,
    ) -> Result<(), CallError>
    where
        T: Serialize + ?Sized,
    {
        let body = encode(value, deployment, self.byte_order).map_err(|error| {
            tracing::warn!(%event, %error, "dropping broadcast");
            error
        })?;
        self.commands
            .send(Command::Fire { event, body })
            .await
            .map_err(|_| CallError::Closed)
    }
}
