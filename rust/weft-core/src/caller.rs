//! The core role traits: anything that can execute a call.
//!
//! A [`Caller`] is the seam between the invocation core and the outside
//! world: a network endpoint talking to a remote server and a local service
//! provider satisfy the same contract, so filter chains and clusters never
//! care which one they are wrapping.

use std::sync::Arc;

use weft_types::Url;

use crate::{CoreError, ExtensionLifecycle, Serialization, Value, WeftRequest, WeftResponse};

/// Has a (registration) name.
pub trait Name {
    fn name(&self) -> &str;
}

/// Has a stable identity string, used to key listener registrations.
pub trait Identity {
    fn identity(&self) -> &str;
}

/// Carries the URL it was configured from.
pub trait WithUrl {
    fn url(&self) -> &Url;
    fn set_url(&mut self, url: Url);
}

/// Availability probe for endpoints and clusters.
pub trait Status: Send + Sync {
    fn is_available(&self) -> bool;
}

/// Can release held resources. Must be idempotent.
pub trait Destroyable {
    fn destroy(&self);
}

/// Anything capable of executing a call.
///
/// The request is handed over mutably: executing a call may attach context
/// (serialization hints, trace spans) or resolve pending deserialization.
/// The response is always produced, carrying an
/// [`Exception`](weft_types::Exception) when the service failed at the
/// application level.
pub trait Caller: WithUrl + Status + Destroyable + Send + Sync {
    fn call(&self, request: &mut WeftRequest) -> WeftResponse;
}

/// A caller that executes calls against a remote server.
pub trait EndPoint: Name + Caller {
    /// Attach the codec used for this endpoint's payloads.
    fn set_serialization(&mut self, serialization: Arc<dyn Serialization>);

    /// Mark this endpoint as forwarding proxied calls.
    fn set_proxy(&mut self, proxy: bool);
}

/// A caller that executes calls against a local service implementation.
pub trait Provider: Caller {
    /// Attach the service implementation this provider dispatches to.
    fn set_service(&mut self, service: Value);

    /// The service path this provider answers for.
    fn path(&self) -> &str;
}

/// Routes incoming requests to the provider registered for their service.
pub trait MessageHandler: ExtensionLifecycle + Send + Sync {
    fn call(&self, request: &mut WeftRequest) -> WeftResponse;

    /// Register a provider. Fails when a provider for the same path would be
    /// silently shadowed.
    fn add_provider(&self, provider: Arc<dyn Provider>) -> Result<(), CoreError>;

    fn rm_provider(&self, provider: &dyn Provider);

    fn provider(&self, service_name: &str) -> Option<Arc<dyn Provider>>;
}
