//! The two filter-chain protocols.
//!
//! Every call is wrapped by interceptor chains at two independent levels:
//!
//! - **endpoint filters** wrap a single call to one concrete callee; the
//!   chain terminates by invoking the [`Caller`] itself.
//! - **cluster filters** wrap the high-availability/load-balance decision
//!   across many candidate callees; the chain terminates by invoking
//!   `ha_strategy.call(request, load_balance)`.
//!
//! The two have different signatures and must not be mixed: a filter
//! declares which protocol it speaks via [`Filter::filter_type`], and the
//! factory hands out prototypes as a [`FilterPrototype`](crate::FilterPrototype)
//! so mixing is caught at chain-construction time.
//!
//! Chains are singly linked and execute in ascending index order as
//! assembled by the chain builder. Each chain ends in a process-wide
//! terminal sentinel at index [`LAST_FILTER_INDEX`] which performs the real
//! delegation and refuses any attempt to link something after it.

use std::sync::{Arc, OnceLock};

use tracing::error;

use weft_types::{Span, Url};

use crate::{Caller, HaStrategy, LoadBalance, Name, WeftRequest, WeftResponse, WithUrl};

/// Index of the terminal sentinel filters. Configured filters use indices
/// below this so the sentinel sorts last regardless of builder logic.
pub const LAST_FILTER_INDEX: i32 = 100;

/// Span recorded by a filter endpoint when a traced call enters its chain.
pub const SPAN_EP_FILTER_START: &str = "ep_filter_start";
/// Span recorded by the endpoint sentinel just before the real call.
pub const SPAN_EP_FILTER_END: &str = "ep_filter_end";
/// Span recorded by the cluster sentinel just before the ha strategy runs.
pub const SPAN_CLUSTER_FILTER: &str = "cluster_filter";

/// Which chain protocol a filter speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    EndPoint,
    Cluster,
}

/// Behavior shared by both filter protocols.
pub trait Filter: Name + Send + Sync {
    /// Position in the chain; lower indices run first.
    fn index(&self) -> i32;

    fn filter_type(&self) -> FilterType;
}

/// A node in an endpoint-level chain.
///
/// Concrete filters are prototypes: a stateless registered instance produces
/// a per-call-site instance via [`new_filter`](EndPointFilter::new_filter),
/// so per-route configuration read from the URL can parameterize an
/// otherwise shared filter type.
///
/// A filter's [`filter`](EndPointFilter::filter) performs its cross-cutting
/// work and then either short-circuits with its own response or delegates to
/// [`next`](EndPointFilter::next).
pub trait EndPointFilter: Filter {
    /// Produce the instance for one call site.
    fn new_filter(&self, url: &Url) -> Arc<dyn EndPointFilter>;

    /// Link the following node. Refused (with a logged error) on terminal
    /// sentinels, whose chains are structurally closed at the tail.
    fn set_next(&self, next: Arc<dyn EndPointFilter>);

    fn next(&self) -> Option<Arc<dyn EndPointFilter>>;

    fn has_next(&self) -> bool {
        self.next().is_some()
    }

    fn filter(&self, caller: &dyn Caller, request: &mut WeftRequest) -> WeftResponse;
}

/// A node in a cluster-level chain. Symmetric to [`EndPointFilter`].
pub trait ClusterFilter: Filter {
    /// Produce the instance for one call site.
    fn new_filter(&self, url: &Url) -> Arc<dyn ClusterFilter>;

    /// Link the following node. Refused (with a logged error) on terminal
    /// sentinels.
    fn set_next(&self, next: Arc<dyn ClusterFilter>);

    fn next(&self) -> Option<Arc<dyn ClusterFilter>>;

    fn has_next(&self) -> bool {
        self.next().is_some()
    }

    fn filter(
        &self,
        ha_strategy: &dyn HaStrategy,
        load_balance: &dyn LoadBalance,
        request: &mut WeftRequest,
    ) -> WeftResponse;
}

// ============================================================================
// Terminal sentinels
// ============================================================================

/// The terminal endpoint filter: delegates to the caller.
struct LastEndPointFilter;

/// The shared terminal endpoint-filter instance, created once on first use.
pub fn last_endpoint_filter() -> Arc<dyn EndPointFilter> {
    static HOLDER: OnceLock<Arc<LastEndPointFilter>> = OnceLock::new();
    HOLDER.get_or_init(|| Arc::new(LastEndPointFilter)).clone()
}

impl Name for LastEndPointFilter {
    fn name(&self) -> &str {
        "last_endpoint_filter"
    }
}

impl Filter for LastEndPointFilter {
    fn index(&self) -> i32 {
        LAST_FILTER_INDEX
    }

    fn filter_type(&self) -> FilterType {
        FilterType::EndPoint
    }
}

impl EndPointFilter for LastEndPointFilter {
    fn new_filter(&self, _url: &Url) -> Arc<dyn EndPointFilter> {
        last_endpoint_filter()
    }

    fn set_next(&self, next: Arc<dyn EndPointFilter>) {
        error!(
            filter = next.name(),
            "refusing to set next on the terminal endpoint filter"
        );
    }

    fn next(&self) -> Option<Arc<dyn EndPointFilter>> {
        None
    }

    fn filter(&self, caller: &dyn Caller, request: &mut WeftRequest) -> WeftResponse {
        if let Some(tc) = request.context_mut().trace_context.clone() {
            tc.put_req_span(Span::with_address(SPAN_EP_FILTER_END, caller.url().address()));
        }
        caller.call(request)
    }
}

/// The terminal cluster filter: delegates to the ha strategy.
struct LastClusterFilter;

/// The shared terminal cluster-filter instance, created once on first use.
pub fn last_cluster_filter() -> Arc<dyn ClusterFilter> {
    static HOLDER: OnceLock<Arc<LastClusterFilter>> = OnceLock::new();
    HOLDER.get_or_init(|| Arc::new(LastClusterFilter)).clone()
}

impl Name for LastClusterFilter {
    fn name(&self) -> &str {
        "last_cluster_filter"
    }
}

impl Filter for LastClusterFilter {
    fn index(&self) -> i32 {
        LAST_FILTER_INDEX
    }

    fn filter_type(&self) -> FilterType {
        FilterType::Cluster
    }
}

impl ClusterFilter for LastClusterFilter {
    fn new_filter(&self, _url: &Url) -> Arc<dyn ClusterFilter> {
        last_cluster_filter()
    }

    fn set_next(&self, next: Arc<dyn ClusterFilter>) {
        error!(
            filter = next.name(),
            "refusing to set next on the terminal cluster filter"
        );
    }

    fn next(&self) -> Option<Arc<dyn ClusterFilter>> {
        None
    }

    fn filter(
        &self,
        ha_strategy: &dyn HaStrategy,
        load_balance: &dyn LoadBalance,
        request: &mut WeftRequest,
    ) -> WeftResponse {
        if let Some(tc) = request.context_mut().trace_context.clone() {
            tc.put_req_span(Span::new(SPAN_CLUSTER_FILTER));
        }
        ha_strategy.call(request, load_balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_are_singletons() {
        let a = last_endpoint_filter();
        let b = last_endpoint_filter();
        assert!(Arc::ptr_eq(&a, &b));

        let c = last_cluster_filter();
        let d = last_cluster_filter();
        assert!(Arc::ptr_eq(&c, &d));
    }

    #[test]
    fn sentinel_prototype_returns_itself() {
        let url = Url::new("motan2", "127.0.0.1", 8002, "svc");
        let sentinel = last_endpoint_filter();
        assert!(Arc::ptr_eq(&sentinel.new_filter(&url), &sentinel));

        let sentinel = last_cluster_filter();
        assert!(Arc::ptr_eq(&sentinel.new_filter(&url), &sentinel));
    }

    #[test]
    fn sentinel_refuses_set_next() {
        let ep = last_endpoint_filter();
        ep.set_next(last_endpoint_filter());
        assert!(!ep.has_next());
        assert!(ep.next().is_none());

        let cl = last_cluster_filter();
        cl.set_next(last_cluster_filter());
        assert!(!cl.has_next());
        assert!(cl.next().is_none());
    }

    #[test]
    fn sentinel_reports_tail_position() {
        assert_eq!(last_endpoint_filter().index(), LAST_FILTER_INDEX);
        assert_eq!(last_cluster_filter().index(), LAST_FILTER_INDEX);
        assert_eq!(last_endpoint_filter().filter_type(), FilterType::EndPoint);
        assert_eq!(last_cluster_filter().filter_type(), FilterType::Cluster);
    }
}
