//! Synchronization primitives for use in asynchronous contexts.
//!
//! - [`ResponseSender`] and [`ResponseReceiver`] carry the reply of a request between tasks.

use tokio::sync::oneshot;

/// Creates a connected pair of [`ResponseSender`] and [`ResponseReceiver`].
pub(crate) fn response_channels<T, E>() -> (ResponseSender<T, E>, ResponseReceiver<T, E>) {
    let (sender, receiver) = oneshot::channel();
    (
        ResponseSender { inner: sender },
        ResponseReceiver { inner: receiver },
    )
}

/// Receives a response from the associated [`ResponseSender`].
#[derive(Debug)]
pub(crate) struct ResponseReceiver<T, E> {
    inner: oneshot::Receiver<Result<T, E>>,
}

impl<T, E> ResponseReceiver<T, E> {
    /// Gets the response from the [`ResponseSender`].
    ///
    /// Returns [`None`] if the sender is dropped before sending the response.
    pub async fn get(self) -> Option<Result<T, E>> {
        self.inner.await.ok()
    }
}

/// Sends a response to the associated [`ResponseReceiver`].
#[derive(Debug)]
pub(crate) struct ResponseSender<T, E> {
    inner: oneshot::Sender<Result<T, E>>,
}

impl<T, E> ResponseSender<T, E> {
    /// Sends the given [`Result`] to the [`ResponseReceiver`].
    ///
    /// The response is discarded if the receiver is gone.
    pub fn send(self, result: Result<T, E>) {
        _ = self.inner.send(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn response_is_delivered() {
        let (sender, receiver) = response_channels::<(), i32>();
        let handle = tokio::spawn(async move {
            sender.send(Err(-1));
        });
        assert_eq!(receiver.get().await, Some(Err(-1)));
        handle.await.expect("should complete successfully");
    }

    #[tokio::test]
    async fn dropped_sender_yields_none() {
        let (_, receiver) = response_channels::<(), i32>();
        assert_eq!(receiver.get().await, None);
    }
}
