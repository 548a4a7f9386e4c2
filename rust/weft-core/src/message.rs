//! The request/response value model.
//!
//! [`WeftRequest`] and [`WeftResponse`] are the concrete payload objects a
//! call travels as. Both lazily allocate their attachment map (most calls
//! never touch it), and both may carry their payload as a pending
//! [`DeserializableValue`] until someone asks for the decoded form.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

use weft_types::{Attachments, Exception};

use crate::{CoreError, DeserializableValue, RpcContext, Value};

// ============================================================================
// Attachment access
// ============================================================================

/// Shared attachment surface of requests and responses.
///
/// The attachment map is created lazily, exactly once per owner, even under
/// concurrent first access; reading attachments never allocates it.
pub trait Attachment {
    /// The owner's attachment map, created on first access.
    fn attachments(&self) -> &Attachments;

    /// Look up one attachment without allocating the map.
    fn attachment(&self, key: &str) -> Option<String>;

    /// Set one attachment, allocating the map if needed.
    fn set_attachment(&self, key: &str, value: &str);
}

// ============================================================================
// Request
// ============================================================================

/// One logical remote call.
pub struct WeftRequest {
    request_id: u64,
    service_name: String,
    method: String,
    method_desc: String,
    arguments: Vec<Value>,
    attachments: OnceLock<Attachments>,
    context: Option<Box<RpcContext>>,
}

impl WeftRequest {
    pub fn new(
        request_id: u64,
        service_name: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            request_id,
            service_name: service_name.into(),
            method: method.into(),
            method_desc: String::new(),
            arguments: Vec::new(),
            attachments: OnceLock::new(),
            context: None,
        }
    }

    /// Id correlating this request with its reply, unique per client session.
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Service path or interface name.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Method descriptor disambiguating overloads; empty when not needed.
    pub fn method_desc(&self) -> &str {
        &self.method_desc
    }

    pub fn set_method_desc(&mut self, desc: impl Into<String>) {
        self.method_desc = desc.into();
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    pub fn set_arguments(&mut self, arguments: Vec<Value>) {
        self.arguments = arguments;
    }

    /// The call's RPC context, if one has been attached.
    pub fn context(&self) -> Option<&RpcContext> {
        self.context.as_deref()
    }

    /// The call's RPC context, created on first demand.
    pub fn context_mut(&mut self) -> &mut RpcContext {
        self.context.get_or_insert_default()
    }

    /// Whether the argument list is still a single undecoded payload.
    ///
    /// Business logic must not read the arguments while this is `true`; run
    /// [`process_deserializable`](Self::process_deserializable) first.
    pub fn deserialization_pending(&self) -> bool {
        self.arguments.len() == 1
            && self.arguments[0]
                .downcast_ref::<DeserializableValue>()
                .is_some()
    }

    /// Decode a pending argument payload in place.
    ///
    /// A no-op unless the argument list is exactly one
    /// [`DeserializableValue`]. On failure the arguments are left unchanged
    /// so the error can be surfaced and the request retried or rejected.
    pub fn process_deserializable(&mut self) -> Result<(), CoreError> {
        let decoded = match self.arguments.first() {
            Some(first) if self.arguments.len() == 1 => {
                match first.downcast_ref::<DeserializableValue>() {
                    Some(dv) => dv.deserialize_multi()?,
                    None => return Ok(()),
                }
            }
            _ => return Ok(()),
        };
        self.arguments = decoded;
        Ok(())
    }
}

impl Attachment for WeftRequest {
    fn attachments(&self) -> &Attachments {
        self.attachments.get_or_init(Attachments::new)
    }

    fn attachment(&self, key: &str) -> Option<String> {
        self.attachments.get().and_then(|a| a.load(key))
    }

    fn set_attachment(&self, key: &str, value: &str) {
        self.attachments().store(key, value);
    }
}

impl Clone for WeftRequest {
    /// Clones share the scalar fields and the argument values by reference,
    /// carry an independent copy of the attachment map, and structurally
    /// copy the RPC context (see [`RpcContext::clone`]).
    fn clone(&self) -> Self {
        let cloned = Self {
            request_id: self.request_id,
            service_name: self.service_name.clone(),
            method: self.method.clone(),
            method_desc: self.method_desc.clone(),
            arguments: self.arguments.clone(),
            attachments: OnceLock::new(),
            context: self.context.clone(),
        };
        if let Some(att) = self.attachments.get() {
            let _ = cloned.attachments.set(att.copy());
        }
        cloned
    }
}

// ============================================================================
// Response
// ============================================================================

/// Reply to one logical remote call.
pub struct WeftResponse {
    request_id: u64,
    value: Option<Value>,
    exception: Option<Exception>,
    process_time_ms: i64,
    attachments: OnceLock<Attachments>,
    context: Option<Box<RpcContext>>,
}

impl WeftResponse {
    /// An empty response correlated with `request_id`.
    pub fn new(request_id: u64) -> Self {
        Self {
            request_id,
            value: None,
            exception: None,
            process_time_ms: 0,
            attachments: OnceLock::new(),
            context: None,
        }
    }

    /// A successful response carrying `value`.
    pub fn with_value(request_id: u64, value: Value) -> Self {
        let mut res = Self::new(request_id);
        res.value = Some(value);
        res
    }

    /// A response carrying only an application-level exception.
    pub fn from_exception(request_id: u64, exception: Exception) -> Self {
        let mut res = Self::new(request_id);
        res.exception = Some(exception);
        res
    }

    /// Id of the request this response answers.
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn set_value(&mut self, value: Value) {
        self.value = Some(value);
    }

    /// The application-level failure, when the call reached the service and
    /// the service reported an error.
    pub fn exception(&self) -> Option<&Exception> {
        self.exception.as_ref()
    }

    pub fn set_exception(&mut self, exception: Exception) {
        self.exception = Some(exception);
    }

    /// Service-side processing time in milliseconds.
    pub fn process_time_ms(&self) -> i64 {
        self.process_time_ms
    }

    pub fn set_process_time_ms(&mut self, millis: i64) {
        self.process_time_ms = millis;
    }

    pub fn context(&self) -> Option<&RpcContext> {
        self.context.as_deref()
    }

    pub fn context_mut(&mut self) -> &mut RpcContext {
        self.context.get_or_insert_default()
    }

    /// Whether the result value is still an undecoded payload.
    pub fn deserialization_pending(&self) -> bool {
        self.value
            .as_ref()
            .is_some_and(|v| v.downcast_ref::<DeserializableValue>().is_some())
    }

    /// Decode a pending result payload in place.
    ///
    /// A no-op unless the value is a [`DeserializableValue`]. On failure the
    /// value is left unchanged.
    pub fn process_deserializable(&mut self) -> Result<(), CoreError> {
        let decoded = match self
            .value
            .as_ref()
            .and_then(|v| v.downcast_ref::<DeserializableValue>())
        {
            Some(dv) => dv.deserialize()?,
            None => return Ok(()),
        };
        self.value = Some(decoded);
        Ok(())
    }
}

impl Attachment for WeftResponse {
    fn attachments(&self) -> &Attachments {
        self.attachments.get_or_init(Attachments::new)
    }

    fn attachment(&self, key: &str) -> Option<String> {
        self.attachments.get().and_then(|a| a.load(key))
    }

    fn set_attachment(&self, key: &str, value: &str) {
        self.attachments().store(key, value);
    }
}

// ============================================================================
// Request id generation
// ============================================================================

/// Generates request ids unique within one client session.
pub struct RequestIdGenerator {
    next: AtomicU64,
}

impl RequestIdGenerator {
    /// Create a new generator starting at 1.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Generate the next unique request id.
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
