//! Consumer side of the loopback channel.

use crate::{
    command::{Command, Operation},
    decode, encode,
    sync::response_channels,
    CallError, EventId, MethodDeployment, MethodId,
};
use bytes::Bytes;
use rsomeip_deploy::{ByteOrder, Deployment, Deserialize, Serialize};
use std::{marker::PhantomData, time::Duration};
use tokio::sync::mpsc;

/// Capacity of the channel buffering the broadcasts of a subscription.
const EVENT_CAPACITY: usize = 16;

/// Calls the methods and attributes served by a [`Stub`].
///
/// Created by [`channel`]. Proxies are cheap to clone, and every clone talks to the same stub.
///
/// [`Stub`]: crate::Stub
/// [`channel`]: crate::channel
#[derive(Debug, Clone)]
pub struct Proxy {
    commands: mpsc::Sender<Command>,
    byte_order: ByteOrder,
    timeout: Option<Duration>,
}

impl Proxy {
    /// Creates a new [`Proxy`].
    pub(crate) fn new(commands: mpsc::Sender<Command>) -> Self {
        Self {
            commands,
            byte_order: ByteOrder::default(),
            timeout: None,
        }
    }

    /// Returns `self` with the given byte order for numeric values.
    #[must_use]
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Returns `self` with a limit on how long to wait for replies.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Calls the method `id` with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Serialization`] if the arguments cannot be serialized, in which case
    /// nothing is sent. Returns [`CallError::Remote`] if the stub answers with an error reply,
    /// and [`CallError::Deserialization`] if its reply cannot be deserialized.
    pub async fn call<In, Out>(
        &self,
        id: MethodId,
        deployment: &MethodDeployment,
        args: &In,
    ) -> Result<Out, CallError>
    where
        In: Serialize + ?Sized,
        Out: Deserialize,
    {
        let body = encode(args, deployment.in_args.as_ref(), self.byte_order).map_err(|error| {
            tracing::debug!(method = %id, %error, "failed to serialize the arguments");
            error
        })?;
        let reply = self.invoke(id, Operation::Call, body).await?;
        self.decode_reply(id, reply, deployment.out_args.as_ref())
    }

    /// Returns the value of the attribute `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Remote`] if the stub answers with an error reply, and
    /// [`CallError::Deserialization`] if the value cannot be deserialized.
    pub async fn get<T>(&self, id: MethodId, deployment: Option<&Deployment>) -> Result<T, CallError>
    where
        T: Deserialize,
    {
        let reply = self.invoke(id, Operation::Get, Bytes::new()).await?;
        self.decode_reply(id, reply, deployment)
    }

    /// Sets the value of the attribute `id`, returning the value held by the stub afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Serialization`] if the value cannot be serialized, in which case
    /// nothing is sent. Returns [`CallError::Remote`] if the stub rejects the value.
    pub async fn set<T>(
        &self,
        id: MethodId,
        deployment: Option<&Deployment>,
        value: &T,
    ) -> Result<T, CallError>
    where
        T: Serialize + Deserialize,
    {
        let body = encode(value, deployment, self.byte_order)?;
        let reply = self.invoke(id, Operation::Set, body).await?;
        self.decode_reply(id, reply, deployment)
    }

    /// Subscribes to the broadcast `event`.
    ///
    /// Broadcasts fired after this returns are delivered to the [`Subscription`].
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Closed`] if the stub is gone.
    pub async fn subscribe<T>(
        &self,
        event: EventId,
        deployment: Option<Deployment>,
    ) -> Result<Subscription<T>, CallError>
    where
        T: Deserialize,
    {
        let (tx, rx) = mpsc::channel(EVENT_CAPACITY);
        let (ack, response) = response_channels();
        self.commands
            .send(Command::Subscribe {
                event,
                events: tx,
                ack,
            })
            .await
            .map_err(|_| CallError::Closed)?;
        response
            .get()
            .await
            .ok_or(CallError::Closed)?
            .map_err(CallError::Remote)?;
        Ok(Subscription {
            events: rx,
            deployment,
            byte_order: self.byte_order,
            event,
            _marker: PhantomData,
        })
    }

    /// Sends a request to the stub and awaits the reply.
    async fn invoke(&self, id: MethodId, operation: Operation, body: Bytes) -> Result<Bytes, CallError> {
        let (reply, response) = response_channels();
        self.commands
            .send(Command::Invoke {
                method: id,
                operation,
                body,
                reply,
            })
            .await
            .map_err(|_| CallError::Closed)?;
        let response = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, response.get())
                .await
                .map_err(|_| CallError::Timeout)?,
            None => response.get().await,
        };
        response.ok_or(CallError::Closed)?.map_err(|code| {
            tracing::debug!(method = %id, %code, "remote replied with an error");
            CallError::Remote(code)
        })
    }

    fn decode_reply<T>(
        &self,
        id: MethodId,
        reply: Bytes,
        deployment: Option<&Deployment>,
    ) -> Result<T, CallError>
    where
        T: Deserialize,
    {
        decode(reply, deployment, self.byte_order).map_err(|error| {
            tracing::warn!(method = %id, %error, "failed to deserialize the reply");
            CallError::Deserialization(error)
        })
    }
}

/// Receives the broadcasts of an event.
///
/// Created by [`Proxy::subscribe`]. Broadcasts that cannot be deserialized are dropped.
#[derive(Debug)]
pub struct Subscription<T> {
    events: mpsc::Receiver<Bytes>,
    deployment: Option<Deployment>,
    byte_order: ByteOrder,
    event: EventId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Subscription<T>
where
    T: Deserialize,
{
    /// Waits for the next broadcast.
    ///
    /// Returns [`None`] once the stub is gone.
    pub async fn next(&mut self) -> Option<T> {
        loop {
            let body = self.events.recv().await?;
            match decode(body, self.deployment.as_ref(), self.byte_order) {
                Ok(value) => return Some(value),
                Err(error) => {
                    tracing::warn!(event = %self.event, %error, "dropping malformed broadcast");
                }
            }
        }
    }

    /// Waits up to `timeout` for the next broadcast.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Timeout`] if no broadcast arrives in time, and [`CallError::Closed`]
    /// if the stub is gone.
    pub async fn next_within(&mut self, timeout: Duration) -> Result<T, CallError> {
        tokio::time::timeout(timeout, self.next())
            .await
            .map_err(|_| CallError::Timeout)?
            .ok_or(CallError::Closed)
    }
}
