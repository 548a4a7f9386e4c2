//! Server and exporter contracts.

use std::sync::Arc;

use crate::{
    CoreError, Destroyable, ExtensionFactory, ExtensionLifecycle, MessageHandler, Name, Provider,
    WithUrl,
};

/// An RPC server: listens on its URL's port and feeds incoming requests to a
/// message handler.
///
/// Servers are shared once opened, so all methods take `&self`;
/// implementations keep their mutable state behind their own locks.
pub trait Server: Name + WithUrl + Destroyable + ExtensionLifecycle + Send + Sync {
    fn set_message_handler(&self, handler: Arc<dyn MessageHandler>);

    fn message_handler(&self) -> Option<Arc<dyn MessageHandler>>;

    /// Start serving.
    ///
    /// With `block` the call only returns when the server shuts down;
    /// otherwise it returns once the listener is up. `proxy` marks the
    /// server as forwarding proxied calls.
    fn open(
        &self,
        block: bool,
        proxy: bool,
        handler: Arc<dyn MessageHandler>,
        factory: Arc<ExtensionFactory>,
    ) -> Result<(), CoreError>;
}

/// Manages the exported lifetime of one service on one server.
pub trait Exporter: WithUrl + Send + Sync {
    fn export(
        &mut self,
        server: Arc<dyn Server>,
        factory: Arc<ExtensionFactory>,
    ) -> Result<(), CoreError>;

    fn unexport(&mut self) -> Result<(), CoreError>;

    fn set_provider(&mut self, provider: Arc<dyn Provider>);

    fn provider(&self) -> Option<Arc<dyn Provider>>;

    /// Mark the exported service as taking traffic.
    fn available(&self);

    /// Take the exported service out of rotation without unexporting it.
    fn unavailable(&self);

    fn is_available(&self) -> bool;
}
