//! The extension factory: name-keyed resolution of pluggable roles.
//!
//! Every major role (ha strategy, load balance, filter, endpoint, provider,
//! registry, server, message handler, serialization) is resolved at
//! configuration time from a logical name to a constructed instance through
//! one explicitly-owned factory. Lookups are non-fatal: a missing plugin for
//! one role is logged and yields `None` rather than taking down a process
//! serving many roles.
//!
//! Registration happens during single-threaded bootstrap and is plain
//! overwrite-on-conflict; steady state only reads. The one construction-time
//! cache is the registry singleton map: at most one [`Registry`] instance is
//! ever built per URL identity, guarded by a double-checked lock.
//!
//! # Example
//!
//! ```ignore
//! let factory = Arc::new(ExtensionFactory::new());
//! factory.register_ha("failover", Box::new(|url| Box::new(FailoverHa::new(url))));
//! factory.register_lb("random", Box::new(|url| Box::new(RandomLb::new(url))));
//!
//! let ha = factory.get_ha(&url);   // picks the url's `ha` param, default "failover"
//! let lb = factory.get_lb(&url);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{error, warn};

use weft_types::{Url, parse_export_info};

use crate::{
    ClusterFilter, EndPoint, EndPointFilter, Filter, FilterType, HaStrategy, LoadBalance,
    MessageHandler, Name, Provider, Registry, Serialization, Server,
};

// ============================================================================
// Parameter keys and defaults
// ============================================================================

/// URL parameter naming the ha strategy.
pub const HA_KEY: &str = "ha";
/// URL parameter naming the load balance.
pub const LB_KEY: &str = "lb";
/// URL parameter naming the provider.
pub const PROVIDER_KEY: &str = "provider";
/// URL parameter carrying an encoded export descriptor.
pub const PROXY_KEY: &str = "proxy";

/// Ha strategy used when the URL names none.
pub const DEFAULT_HA: &str = "failover";
/// Load balance used when the URL names none.
pub const DEFAULT_LB: &str = "random";
/// Provider used when neither a provider nor a proxy parameter is set.
pub const DEFAULT_PROVIDER: &str = "default";
/// Server protocol assumed when the URL carries none.
pub const DEFAULT_SERVER_PROTOCOL: &str = "motan2";

// ============================================================================
// Lifecycle hooks
// ============================================================================

/// Optional post-construction hooks for extension implementations.
///
/// The factory invokes [`initialize`](ExtensionLifecycle::initialize) once
/// after constructing a registry, server or message handler;
/// [`bind_factory`](ExtensionLifecycle::bind_factory) is for bootstrap code
/// that wants to hand a constructed extension the factory it came from. Both
/// default to doing nothing, so extensions opt in by overriding; no runtime
/// type inspection involved.
pub trait ExtensionLifecycle {
    /// One-time setup after construction.
    fn initialize(&self) {}

    /// Receive the factory this extension was resolved from.
    fn bind_factory(&self, _factory: &Arc<ExtensionFactory>) {}
}

// ============================================================================
// Constructor types
// ============================================================================

/// A registered filter prototype, tagged with the protocol it speaks so
/// chain builders validate at construction time instead of downcasting.
#[derive(Clone)]
pub enum FilterPrototype {
    EndPoint(Arc<dyn EndPointFilter>),
    Cluster(Arc<dyn ClusterFilter>),
}

impl FilterPrototype {
    pub fn name(&self) -> &str {
        match self {
            FilterPrototype::EndPoint(f) => f.name(),
            FilterPrototype::Cluster(f) => f.name(),
        }
    }

    pub fn index(&self) -> i32 {
        match self {
            FilterPrototype::EndPoint(f) => f.index(),
            FilterPrototype::Cluster(f) => f.index(),
        }
    }

    pub fn filter_type(&self) -> FilterType {
        match self {
            FilterPrototype::EndPoint(_) => FilterType::EndPoint,
            FilterPrototype::Cluster(_) => FilterType::Cluster,
        }
    }

    pub fn into_endpoint(self) -> Option<Arc<dyn EndPointFilter>> {
        match self {
            FilterPrototype::EndPoint(f) => Some(f),
            FilterPrototype::Cluster(_) => None,
        }
    }

    pub fn into_cluster(self) -> Option<Arc<dyn ClusterFilter>> {
        match self {
            FilterPrototype::Cluster(f) => Some(f),
            FilterPrototype::EndPoint(_) => None,
        }
    }
}

pub type FilterFactory = Box<dyn Fn() -> FilterPrototype + Send + Sync>;
pub type HaFactory = Box<dyn Fn(&Url) -> Box<dyn HaStrategy> + Send + Sync>;
pub type LbFactory = Box<dyn Fn(&Url) -> Box<dyn LoadBalance> + Send + Sync>;
pub type EndPointFactory = Box<dyn Fn(&Url) -> Box<dyn EndPoint> + Send + Sync>;
pub type ProviderFactory = Box<dyn Fn(&Url) -> Box<dyn Provider> + Send + Sync>;
pub type RegistryFactory = Box<dyn Fn(&Url) -> Arc<dyn Registry> + Send + Sync>;
pub type ServerFactory = Box<dyn Fn(&Url) -> Arc<dyn Server> + Send + Sync>;
pub type MessageHandlerFactory = Box<dyn Fn() -> Arc<dyn MessageHandler> + Send + Sync>;
pub type SerializationFactory = Box<dyn Fn() -> Arc<dyn Serialization> + Send + Sync>;

// ============================================================================
// Factory
// ============================================================================

/// The pluggable-implementation resolver.
pub struct ExtensionFactory {
    filter_factories: RwLock<HashMap<String, FilterFactory>>,
    ha_factories: RwLock<HashMap<String, HaFactory>>,
    lb_factories: RwLock<HashMap<String, LbFactory>>,
    endpoint_factories: RwLock<HashMap<String, EndPointFactory>>,
    provider_factories: RwLock<HashMap<String, ProviderFactory>>,
    registry_factories: RwLock<HashMap<String, RegistryFactory>>,
    server_factories: RwLock<HashMap<String, ServerFactory>>,
    message_handler_factories: RwLock<HashMap<String, MessageHandlerFactory>>,
    serialization_factories: RwLock<HashMap<String, SerializationFactory>>,

    /// Singleton registry instances, keyed by URL identity.
    registries: RwLock<HashMap<String, Arc<dyn Registry>>>,
    /// Guards the registry-singleton miss path only; hits stay read-locked.
    new_registry_lock: Mutex<()>,
}

impl ExtensionFactory {
    pub fn new() -> Self {
        Self {
            filter_factories: RwLock::new(HashMap::new()),
            ha_factories: RwLock::new(HashMap::new()),
            lb_factories: RwLock::new(HashMap::new()),
            endpoint_factories: RwLock::new(HashMap::new()),
            provider_factories: RwLock::new(HashMap::new()),
            registry_factories: RwLock::new(HashMap::new()),
            server_factories: RwLock::new(HashMap::new()),
            message_handler_factories: RwLock::new(HashMap::new()),
            serialization_factories: RwLock::new(HashMap::new()),
            registries: RwLock::new(HashMap::new()),
            new_registry_lock: Mutex::new(()),
        }
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Resolve the ha strategy named by the URL's `ha` parameter.
    pub fn get_ha(&self, url: &Url) -> Option<Box<dyn HaStrategy>> {
        let name = url.param_or(HA_KEY, DEFAULT_HA);
        if let Some(ctor) = self.ha_factories.read().get(name) {
            return Some(ctor(url));
        }
        error!(ha = name, "ha strategy is not registered in the extension factory");
        None
    }

    /// Resolve the load balance named by the URL's `lb` parameter.
    pub fn get_lb(&self, url: &Url) -> Option<Box<dyn LoadBalance>> {
        let name = url.param_or(LB_KEY, DEFAULT_LB);
        if let Some(ctor) = self.lb_factories.read().get(name) {
            return Some(ctor(url));
        }
        error!(lb = name, "load balance is not registered in the extension factory");
        None
    }

    /// Resolve a filter prototype by name.
    pub fn get_filter(&self, name: &str) -> Option<FilterPrototype> {
        let name = name.trim();
        if let Some(ctor) = self.filter_factories.read().get(name) {
            return Some(ctor());
        }
        error!(filter = name, "filter is not registered in the extension factory");
        None
    }

    /// Resolve an endpoint by the URL's protocol.
    pub fn get_endpoint(&self, url: &Url) -> Option<Box<dyn EndPoint>> {
        if let Some(ctor) = self.endpoint_factories.read().get(&url.protocol) {
            return Some(ctor(url));
        }
        error!(
            protocol = %url.protocol,
            "endpoint protocol is not registered in the extension factory"
        );
        None
    }

    /// Resolve a provider.
    ///
    /// The name comes from the URL's `provider` parameter; when absent it is
    /// derived from the `proxy` parameter's export descriptor, and when that
    /// is absent too the `default` provider is used.
    pub fn get_provider(&self, url: &Url) -> Option<Box<dyn Provider>> {
        let mut name = url.param_or(PROVIDER_KEY, "").to_string();
        if name.is_empty() {
            match url.param(PROXY_KEY) {
                // A proxy descriptor that does not parse leaves the name
                // empty and the lookup below reports the miss.
                Some(proxy) if !proxy.is_empty() => {
                    if let Ok((protocol, _port)) = parse_export_info(proxy) {
                        name = protocol;
                    }
                }
                _ => name = DEFAULT_PROVIDER.to_string(),
            }
        }
        if let Some(ctor) = self.provider_factories.read().get(&name) {
            return Some(ctor(url));
        }
        error!(provider = %name, "provider is not registered in the extension factory");
        None
    }

    /// Resolve a server by the URL's protocol, then run its initialize hook.
    pub fn get_server(&self, url: &Url) -> Option<Arc<dyn Server>> {
        let name = if url.protocol.is_empty() {
            warn!("url carries no server protocol, using {DEFAULT_SERVER_PROTOCOL}");
            DEFAULT_SERVER_PROTOCOL
        } else {
            url.protocol.as_str()
        };
        if let Some(ctor) = self.server_factories.read().get(name) {
            let server = ctor(url);
            server.initialize();
            return Some(server);
        }
        error!(server = name, "server is not registered in the extension factory");
        None
    }

    /// Resolve a message handler by name, then run its initialize hook.
    pub fn get_message_handler(&self, name: &str) -> Option<Arc<dyn MessageHandler>> {
        let name = name.trim();
        if let Some(ctor) = self.message_handler_factories.read().get(name) {
            let handler = ctor();
            handler.initialize();
            return Some(handler);
        }
        error!(
            handler = name,
            "message handler is not registered in the extension factory"
        );
        None
    }

    /// Resolve a serialization by name, or by numeric id when no name is
    /// given and `id` is non-negative.
    pub fn get_serialization(&self, name: &str, id: i32) -> Option<Arc<dyn Serialization>> {
        let name = name.trim();
        if !name.is_empty() {
            if let Some(ctor) = self.serialization_factories.read().get(name) {
                return Some(ctor());
            }
        } else if id > -1
            && let Some(ctor) = self.serialization_factories.read().get(&id.to_string())
        {
            return Some(ctor());
        }
        error!(
            serialization = name,
            id, "serialization is not registered in the extension factory"
        );
        None
    }

    /// Resolve the singleton registry for the URL's identity.
    ///
    /// At most one instance is ever constructed per identity, even under
    /// arbitrary concurrent first access, and every caller for the same
    /// identity observes the same instance. The hit path takes only the read
    /// lock; the miss path serializes on one shared lock and re-checks
    /// before constructing.
    pub fn get_registry(&self, url: &Url) -> Option<Arc<dyn Registry>> {
        let key = url.identity();
        if let Some(registry) = self.registries.read().get(&key) {
            return Some(registry.clone());
        }

        let _guard = self.new_registry_lock.lock();
        // Another caller may have raced us here and won.
        if let Some(registry) = self.registries.read().get(&key) {
            return Some(registry.clone());
        }
        let registry = match self.registry_factories.read().get(&url.protocol) {
            Some(ctor) => ctor(url),
            None => {
                error!(
                    protocol = %url.protocol,
                    "registry protocol is not registered in the extension factory"
                );
                return None;
            }
        };
        registry.initialize();
        self.registries.write().insert(key, registry.clone());
        Some(registry)
    }

    // ------------------------------------------------------------------
    // Registration: bootstrap only, last writer wins
    // ------------------------------------------------------------------

    pub fn register_filter(&self, name: impl Into<String>, factory: FilterFactory) {
        self.filter_factories.write().insert(name.into(), factory);
    }

    pub fn register_ha(&self, name: impl Into<String>, factory: HaFactory) {
        self.ha_factories.write().insert(name.into(), factory);
    }

    pub fn register_lb(&self, name: impl Into<String>, factory: LbFactory) {
        self.lb_factories.write().insert(name.into(), factory);
    }

    pub fn register_endpoint(&self, name: impl Into<String>, factory: EndPointFactory) {
        self.endpoint_factories.write().insert(name.into(), factory);
    }

    pub fn register_provider(&self, name: impl Into<String>, factory: ProviderFactory) {
        self.provider_factories.write().insert(name.into(), factory);
    }

    pub fn register_registry(&self, name: impl Into<String>, factory: RegistryFactory) {
        self.registry_factories.write().insert(name.into(), factory);
    }

    pub fn register_server(&self, name: impl Into<String>, factory: ServerFactory) {
        self.server_factories.write().insert(name.into(), factory);
    }

    pub fn register_message_handler(&self, name: impl Into<String>, factory: MessageHandlerFactory) {
        self.message_handler_factories
            .write()
            .insert(name.into(), factory);
    }

    /// Serializations are resolvable both by name and by id.
    pub fn register_serialization(
        &self,
        name: impl Into<String>,
        id: i32,
        factory: SerializationFactory,
    ) {
        let factory = Arc::new(factory);
        let by_name = factory.clone();
        self.serialization_factories
            .write()
            .insert(name.into(), Box::new(move || (*by_name)()));
        self.serialization_factories
            .write()
            .insert(id.to_string(), Box::new(move || (*factory)()));
    }
}

impl Default for ExtensionFactory {
    fn default() -> Self {
        Self::new()
    }
}
