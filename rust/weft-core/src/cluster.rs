//! High-availability strategy and load-balance contracts.

use std::sync::Arc;

use crate::{EndPoint, Name, WeftRequest, WeftResponse, WithUrl};

/// High-availability call policy.
///
/// An `HaStrategy` owns the retry/failover loop of a clustered call: it asks
/// the load balance for candidates and decides how many attempts to make and
/// against whom. It is the terminal delegate of every cluster filter chain.
pub trait HaStrategy: Name + WithUrl + Send + Sync {
    fn call(&self, request: &mut WeftRequest, load_balance: &dyn LoadBalance) -> WeftResponse;
}

/// Selects endpoints among the cluster's current membership.
///
/// Refreshed with the full candidate list whenever membership changes; all
/// methods take `&self` since selection runs concurrently with refreshes.
pub trait LoadBalance: Send + Sync {
    /// Replace the candidate set.
    fn on_refresh(&self, endpoints: Vec<Arc<dyn EndPoint>>);

    /// Pick one endpoint for this request, if any candidate qualifies.
    fn select(&self, request: &WeftRequest) -> Option<Arc<dyn EndPoint>>;

    /// Pick an ordered list of candidates for this request, best first.
    fn select_array(&self, request: &WeftRequest) -> Vec<Arc<dyn EndPoint>>;

    /// Configure weighting from a string spec.
    fn set_weight(&self, weight: &str);
}
