//! Per-call side-channel state and the async rendezvous.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::warn;

use weft_types::TraceContext;

use crate::{BoxError, ExtensionFactory, Value};

/// The wire-level message a request or response was decoded from, retained
/// for protocols that need round-trip access to it.
///
/// Implementations that can be deep-cloned opt in by overriding
/// [`try_clone`](OriginalMessage::try_clone); otherwise clones of the owning
/// context share the message by reference.
pub trait OriginalMessage: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// Deep-clone this message, if supported.
    fn try_clone(&self) -> Option<Arc<dyn OriginalMessage>> {
        None
    }
}

/// Ephemeral per-call state, created on first demand.
///
/// A context is attached to a request or response when some participant in
/// the call needs side-channel state: serialization hints for the transport,
/// async dispatch markers, the tracing handle. A freshly constructed request
/// has none; everything here must tolerate absence.
#[derive(Default)]
pub struct RpcContext {
    /// Factory that resolves pluggable implementations for this call.
    pub ext_factory: Option<Arc<ExtensionFactory>>,
    /// Wire-level message this call was decoded from.
    pub original_message: Option<Arc<dyn OriginalMessage>>,
    /// The caller does not expect a response.
    pub oneway: bool,
    /// The call is being forwarded by a proxy rather than originated here.
    pub proxy: bool,
    /// Payloads at or above this size are compressed, in bytes. Zero disables.
    pub gzip_size: usize,
    /// Numeric id of the codec used for this call's payloads.
    pub serial_num: i32,
    /// The arguments have already been serialized into the outgoing payload.
    pub serialized: bool,

    /// The call was dispatched without blocking the caller.
    pub async_call: bool,
    /// Rendezvous for the async reply; shared with clones of the request.
    pub result: Option<Arc<AsyncResult>>,
    /// Placeholder for the decoded reply, shared with clones by reference.
    pub reply: Option<Value>,

    /// Tracing handle; absence never alters call semantics.
    pub trace_context: Option<Arc<TraceContext>>,
}

impl RpcContext {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clone for RpcContext {
    /// Structural copy. The async result, reply placeholder and trace
    /// context are shared by reference so clones of an in-flight async call
    /// observe the same completion; the original message is deep-cloned only
    /// when it supports cloning.
    fn clone(&self) -> Self {
        Self {
            ext_factory: self.ext_factory.clone(),
            original_message: self
                .original_message
                .as_ref()
                .map(|m| m.try_clone().unwrap_or_else(|| m.clone())),
            oneway: self.oneway,
            proxy: self.proxy,
            gzip_size: self.gzip_size,
            serial_num: self.serial_num,
            serialized: self.serialized,
            async_call: self.async_call,
            result: self.result.clone(),
            reply: self.reply.clone(),
            trace_context: self.trace_context.clone(),
        }
    }
}

/// Terminal outcome of an asynchronously dispatched call.
#[derive(Default)]
pub struct AsyncOutcome {
    /// Decoded reply, when the call succeeded.
    pub reply: Option<Value>,
    /// Failure, when the call could not be completed.
    pub error: Option<BoxError>,
}

impl AsyncOutcome {
    pub fn ok(reply: Option<Value>) -> Self {
        Self {
            reply,
            error: None,
        }
    }

    pub fn err(error: impl Into<BoxError>) -> Self {
        Self {
            reply: None,
            error: Some(error.into()),
        }
    }
}

/// One-shot rendezvous between an async caller and the endpoint completing
/// the call.
///
/// The dispatching side creates the pair with [`AsyncResult::new`], stores
/// the `AsyncResult` on the request's RPC context, and keeps the receiver.
/// Whoever finishes the call signals it exactly once; later attempts are
/// refused and logged. The core never blocks on the receiver itself;
/// waiting, with or without a timeout, is the caller's business:
///
/// ```ignore
/// let (result, done) = AsyncResult::new();
/// request.context_mut().async_call = true;
/// request.context_mut().result = Some(result);
/// endpoint.call(&mut request);
/// let outcome = tokio::time::timeout(deadline, done).await??;
/// ```
pub struct AsyncResult {
    start: Instant,
    done: Mutex<Option<oneshot::Sender<AsyncOutcome>>>,
}

impl AsyncResult {
    /// Create the rendezvous and the receiver for its completion.
    pub fn new() -> (Arc<AsyncResult>, oneshot::Receiver<AsyncOutcome>) {
        let (tx, rx) = oneshot::channel();
        let result = Arc::new(AsyncResult {
            start: Instant::now(),
            done: Mutex::new(Some(tx)),
        });
        (result, rx)
    }

    /// When the call was dispatched.
    pub fn start_time(&self) -> Instant {
        self.start
    }

    /// Signal completion. Returns `false` (and logs) if the result was
    /// already completed; only the first signal is delivered.
    pub fn finish(&self, outcome: AsyncOutcome) -> bool {
        let Some(tx) = self.done.lock().take() else {
            warn!("async result finished more than once, dropping later outcome");
            return false;
        };
        // A dropped receiver just means nobody is waiting anymore.
        let _ = tx.send(outcome);
        true
    }

    /// Signal successful completion.
    pub fn finish_ok(&self, reply: Option<Value>) -> bool {
        self.finish(AsyncOutcome::ok(reply))
    }

    /// Signal failure.
    pub fn finish_err(&self, error: impl Into<BoxError>) -> bool {
        self.finish(AsyncOutcome::err(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_of;

    #[tokio::test]
    async fn completion_is_delivered_once() {
        let (result, done) = AsyncResult::new();

        assert!(result.finish_ok(Some(value_of(7i64))));
        assert!(!result.finish_err(std::io::Error::other("late")));

        let outcome = done.await.expect("sender completed");
        assert!(outcome.error.is_none());
        let reply = outcome.reply.expect("reply set");
        assert_eq!(reply.downcast_ref::<i64>(), Some(&7));
    }

    #[tokio::test]
    async fn error_outcome_reaches_receiver() {
        let (result, done) = AsyncResult::new();
        result.finish_err(std::io::Error::other("connect refused"));

        let outcome = done.await.unwrap();
        assert!(outcome.reply.is_none());
        assert!(outcome.error.unwrap().to_string().contains("connect refused"));
    }

    #[test]
    fn finish_with_dropped_receiver_still_counts() {
        let (result, done) = AsyncResult::new();
        drop(done);
        assert!(result.finish_ok(None));
        assert!(!result.finish_ok(None));
    }

    struct CloneableMsg(i32);

    impl OriginalMessage for CloneableMsg {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn try_clone(&self) -> Option<Arc<dyn OriginalMessage>> {
            Some(Arc::new(CloneableMsg(self.0)))
        }
    }

    struct OpaqueMsg;

    impl OriginalMessage for OpaqueMsg {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn clone_deep_copies_cloneable_original_message() {
        let mut ctx = RpcContext::new();
        ctx.original_message = Some(Arc::new(CloneableMsg(42)));

        let cloned = ctx.clone();
        let original = ctx.original_message.unwrap();
        let copy = cloned.original_message.unwrap();
        assert!(!Arc::ptr_eq(&original, &copy));
        assert_eq!(copy.as_any().downcast_ref::<CloneableMsg>().unwrap().0, 42);
    }

    #[test]
    fn clone_shares_opaque_original_message() {
        let mut ctx = RpcContext::new();
        ctx.original_message = Some(Arc::new(OpaqueMsg));

        let cloned = ctx.clone();
        assert!(Arc::ptr_eq(
            ctx.original_message.as_ref().unwrap(),
            cloned.original_message.as_ref().unwrap()
        ));
    }

    #[test]
    fn clone_shares_async_result() {
        let (result, _done) = AsyncResult::new();
        let mut ctx = RpcContext::new();
        ctx.async_call = true;
        ctx.result = Some(result);

        let cloned = ctx.clone();
        assert!(Arc::ptr_eq(
            ctx.result.as_ref().unwrap(),
            cloned.result.as_ref().unwrap()
        ));
    }
}
