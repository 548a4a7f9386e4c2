//! Service discovery and registration contracts.
//!
//! Concrete registry backends (a coordination service, a local file, a
//! static list) live outside the core; this module defines the behavior the
//! core needs from them. A registry instance is a per-identity singleton,
//! see [`ExtensionFactory::get_registry`](crate::ExtensionFactory::get_registry).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use weft_types::Url;

use crate::{CoreError, ExtensionLifecycle, Identity, Name, WithUrl};

/// Configuration for the registry's periodic snapshot-to-disk capability.
#[derive(Debug, Clone)]
pub struct SnapshotConf {
    /// How often a snapshot is written.
    pub interval: Duration,
    /// Directory snapshots are written into.
    pub dir: PathBuf,
}

/// Callback invoked when the discovered set of service URLs changes.
///
/// Listener registrations are keyed by [`Identity`], so the same logical
/// listener can be unsubscribed later even if handed over as a different
/// reference.
pub trait NotifyListener: Identity + Send + Sync {
    fn notify(&self, registry_url: &Url, urls: &[Url]);
}

/// Callback invoked when a governance command changes.
pub trait CommandNotifyListener: Identity + Send + Sync {
    fn notify_command(&self, registry_url: &Url, command_type: i32, command_info: &str);
}

/// Client-side discovery surface of a registry.
pub trait DiscoverService: Send + Sync {
    fn subscribe(&self, url: &Url, listener: Arc<dyn NotifyListener>);

    fn unsubscribe(&self, url: &Url, listener: &dyn NotifyListener);

    fn discover(&self, url: &Url) -> Vec<Url>;
}

/// Discovery of all service groups known to a registry.
pub trait GroupDiscoverService: Send + Sync {
    fn discover_all_groups(&self) -> Result<Vec<String>, CoreError>;
}

/// Discovery of governance command strings.
pub trait DiscoverCommand: Send + Sync {
    fn subscribe_command(&self, url: &Url, listener: Arc<dyn CommandNotifyListener>);

    fn unsubscribe_command(&self, url: &Url, listener: &dyn CommandNotifyListener);

    fn discover_command(&self, url: &Url) -> String;
}

/// Server-side registration surface of a registry.
pub trait RegisterService: Send + Sync {
    fn register(&self, server_url: &Url);

    fn unregister(&self, server_url: &Url);

    /// Mark a registered service as ready for traffic.
    fn available(&self, server_url: &Url);

    /// Mark a registered service as not taking traffic, without removing it.
    fn unavailable(&self, server_url: &Url);

    fn registered_services(&self) -> Vec<Url>;
}

/// Periodic snapshot-to-disk capability.
pub trait SnapshotService: Send + Sync {
    fn start_snapshot(&self, conf: &SnapshotConf);
}

/// A full registry backend: discovery plus registration plus snapshots.
pub trait Registry:
    Name
    + WithUrl
    + DiscoverService
    + RegisterService
    + SnapshotService
    + ExtensionLifecycle
    + Send
    + Sync
{
}
