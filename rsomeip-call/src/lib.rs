#![doc = include_str!("../README.md")]
#![warn(
    clippy::nursery,
    clippy::pedantic,
    clippy::expect_used,
    clippy::unwrap_used
)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::must_use_candidate
)]

use bytes::Bytes;
use rsomeip_deploy::{
    ByteOrder, Deployment, Deserialize, DeserializeError, Reader, Serialize, SerializeError, Writer,
};
use tokio::sync::mpsc;

mod command;

mod primitives;
pub use primitives::{EventId, MethodId, ReturnCode};

mod proxy;
pub use proxy::{Proxy, Subscription};

mod status;
pub use status::{CallError, CallStatus};

mod stub;
pub use stub::{Broadcaster, Stub};

mod sync;

/// Capacity of the command channel between proxies and the stub.
const COMMAND_CAPACITY: usize = 8;

/// Creates a connected pair of [`Proxy`] and [`Stub`].
///
/// Methods and attributes are registered on the stub, which must then be spawned to start
/// serving the proxy.
///
/// # Examples
///
/// ```rust
/// use rsomeip_call::{channel, MethodDeployment, MethodId};
/// # tokio_test::block_on(async {
///
/// let (proxy, stub) = channel();
/// let _broadcaster = stub
///     .with_method(MethodId::new(1), MethodDeployment::default(), |x: u32| x + 1)
///     .spawn();
///
/// let reply: u32 = proxy
///     .call(MethodId::new(1), &MethodDeployment::default(), &41u32)
///     .await
///     .expect("should call the method");
/// assert_eq!(reply, 42);
/// # });
/// ```
#[must_use]
pub fn channel() -> (Proxy, Stub) {
    let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
    (Proxy::new(tx.clone()), Stub::new(tx, rx))
}

/// Deployments of the arguments and results of a method.
///
/// A missing deployment falls back to the deployment of the argument type.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MethodDeployment {
    /// Deployment of the arguments sent to the stub.
    pub in_args: Option<Deployment>,
    /// Deployment of the results sent back to the proxy.
    pub out_args: Option<Deployment>,
}

impl MethodDeployment {
    /// Returns `self` with the given deployment for the arguments.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rsomeip_call::MethodDeployment;
    /// use rsomeip_deploy::{Deployment, IntegerDeployment};
    ///
    /// let deployment = MethodDeployment::default().with_in_args(IntegerDeployment::new(4));
    /// assert_eq!(deployment.in_args, Some(Deployment::from(IntegerDeployment::new(4))));
    /// ```
    #[must_use]
    pub fn with_in_args(mut self, deployment: impl Into<Deployment>) -> Self {
        self.in_args = Some(deployment.into());
        self
    }

    /// Returns `self` with the given deployment for the results.
    #[must_use]
    pub fn with_out_args(mut self, deployment: impl Into<Deployment>) -> Self {
        self.out_args = Some(deployment.into());
        self
    }
}

/// Serializes `value` into a new body.
fn encode<T>(
    value: &T,
    site: Option<&Deployment>,
    byte_order: ByteOrder,
) -> Result<Bytes, SerializeError>
where
    T: Serialize + ?Sized,
{
    let mut writer = Writer::new().with_byte_order(byte_order);
    writer.serialize_site(value, site)?;
    Ok(writer.into_body())
}

/// Deserializes a value from `body`.
fn decode<T>(body: Bytes, site: Option<&Deployment>, byte_order: ByteOrder) -> Result<T, DeserializeError>
where
    T: Deserialize,
{
    Reader::new(body)
        .with_byte_order(byte_order)
        .deserialize_site(site)
}
