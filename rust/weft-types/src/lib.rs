#![deny(unsafe_code)]

//! Value types shared across the weft RPC framework.
//!
//! This crate holds the small, dependency-light types the invocation core
//! builds on:
//!
//! - [`Url`]: how services and their configuration are addressed
//! - [`Attachments`]: concurrency-safe per-call string metadata
//! - [`Exception`]: application-level error descriptor carried on responses
//! - [`TraceContext`] / [`Span`]: optional per-call tracing handle

mod attachment;
pub use attachment::*;

mod exception;
pub use exception::*;

mod trace;
pub use trace::*;

mod url;
pub use url::*;
