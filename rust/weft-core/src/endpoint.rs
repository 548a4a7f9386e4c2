//! The filter endpoint decorator.

use std::sync::Arc;

use weft_types::{Span, Url};

use crate::{
    Caller, Destroyable, EndPoint, EndPointFilter, Name, SPAN_EP_FILTER_START, Serialization,
    Status, WeftRequest, WeftResponse, WithUrl,
};

/// Binds a concrete [`Caller`] to an endpoint filter chain.
///
/// Every endpoint a cluster selects from is one of these: the wrapped caller
/// does the actual network or local call, the chain wraps it with
/// cross-cutting behavior, and the auxiliary status checks fold
/// circuit-breaker-like probes into the endpoint's availability.
///
/// The decorator itself never synthesizes a failure response; producing the
/// response, success or failure, is the chain's and the caller's job.
pub struct FilterEndPoint {
    url: Url,
    filter: Arc<dyn EndPointFilter>,
    status_filters: Vec<Arc<dyn Status>>,
    caller: Arc<dyn Caller>,
}

impl FilterEndPoint {
    /// Wrap `caller` with the chain starting at `filter`.
    pub fn new(url: Url, filter: Arc<dyn EndPointFilter>, caller: Arc<dyn Caller>) -> Self {
        Self {
            url,
            filter,
            status_filters: Vec::new(),
            caller,
        }
    }

    /// Install the auxiliary availability probes, in registration order.
    pub fn set_status_filters(&mut self, status_filters: Vec<Arc<dyn Status>>) {
        self.status_filters = status_filters;
    }
}

impl Name for FilterEndPoint {
    fn name(&self) -> &str {
        "filter_endpoint"
    }
}

impl WithUrl for FilterEndPoint {
    fn url(&self) -> &Url {
        &self.url
    }

    fn set_url(&mut self, url: Url) {
        self.url = url;
    }
}

impl Status for FilterEndPoint {
    /// Pure conjunction of every auxiliary status check and the wrapped
    /// caller's own availability. Probes are scanned in reverse registration
    /// order; the direction only affects short-circuit speed, never the
    /// result.
    fn is_available(&self) -> bool {
        for status in self.status_filters.iter().rev() {
            if !status.is_available() {
                return false;
            }
        }
        self.caller.is_available()
    }
}

impl Destroyable for FilterEndPoint {
    fn destroy(&self) {
        self.caller.destroy();
    }
}

impl Caller for FilterEndPoint {
    fn call(&self, request: &mut WeftRequest) -> WeftResponse {
        if let Some(tc) = request.context_mut().trace_context.clone() {
            tc.put_req_span(Span::with_address(SPAN_EP_FILTER_START, self.url.address()));
        }
        self.filter.filter(self.caller.as_ref(), request)
    }
}

impl EndPoint for FilterEndPoint {
    /// The decorator routes through the filter chain only; the wrapped
    /// caller keeps its own serialization.
    fn set_serialization(&mut self, _serialization: Arc<dyn Serialization>) {}

    /// No proxy state at this layer.
    fn set_proxy(&mut self, _proxy: bool) {}
}
