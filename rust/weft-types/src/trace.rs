//! Optional per-call tracing handle.
//!
//! A [`TraceContext`] rides along on a call's RPC context and collects
//! [`Span`]s as the call moves through filter chains and endpoints. It is
//! entirely opportunistic: absence of a trace context never changes call
//! semantics, and every component that records spans must check for one
//! first.

use std::time::Instant;

use parking_lot::Mutex;

/// A single named point-in-time marker, optionally tagged with the address
/// of the party being called.
#[derive(Debug, Clone)]
pub struct Span {
    pub name: String,
    pub address: Option<String>,
    pub time: Instant,
}

impl Span {
    /// Create a span stamped with the current time.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            time: Instant::now(),
        }
    }

    /// Create a span carrying the callee's address.
    pub fn with_address(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: Some(address.into()),
            time: Instant::now(),
        }
    }
}

/// Collects spans for one call, split into request-path and response-path.
///
/// Shared by reference between a request and its clones so that every
/// participant in a call appends to the same timeline.
#[derive(Debug, Default)]
pub struct TraceContext {
    req_spans: Mutex<Vec<Span>>,
    res_spans: Mutex<Vec<Span>>,
}

impl TraceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a span to the request path.
    pub fn put_req_span(&self, span: Span) {
        self.req_spans.lock().push(span);
    }

    /// Append a span to the response path.
    pub fn put_res_span(&self, span: Span) {
        self.res_spans.lock().push(span);
    }

    /// Snapshot the request-path spans recorded so far.
    pub fn req_spans(&self) -> Vec<Span> {
        self.req_spans.lock().clone()
    }

    /// Snapshot the response-path spans recorded so far.
    pub fn res_spans(&self) -> Vec<Span> {
        self.res_spans.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_accumulate_in_order() {
        let tc = TraceContext::new();
        tc.put_req_span(Span::new("enter"));
        tc.put_req_span(Span::with_address("dispatch", "10.0.0.1:8002"));
        tc.put_res_span(Span::new("done"));

        let req = tc.req_spans();
        assert_eq!(req.len(), 2);
        assert_eq!(req[0].name, "enter");
        assert_eq!(req[1].address.as_deref(), Some("10.0.0.1:8002"));
        assert_eq!(tc.res_spans().len(), 1);
    }
}
