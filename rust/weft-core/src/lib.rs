#![deny(unsafe_code)]

//! Invocation core for the weft RPC framework.
//!
//! This crate is the call-dispatch skeleton a cross-language RPC stack plugs
//! into. It stays agnostic to wire protocol, transport, codec and discovery
//! backend; those arrive as pluggable implementations resolved by name
//! through the [`ExtensionFactory`]. What lives here:
//!
//! - [`WeftRequest`] / [`WeftResponse`]: the call payload objects, with
//!   lazily created concurrency-safe attachments and lazy deserialization
//! - [`RpcContext`] / [`AsyncResult`]: per-call side-channel state and the
//!   one-shot rendezvous for async dispatch
//! - [`EndPointFilter`] / [`ClusterFilter`]: the two interceptor-chain
//!   protocols, each closed off by a terminal sentinel that performs the
//!   real delegation
//! - [`FilterEndPoint`]: the decorator binding a concrete [`Caller`] to an
//!   endpoint chain plus auxiliary availability probes
//! - [`ExtensionFactory`]: the registry of constructors for every pluggable
//!   role, with a per-identity singleton cache for registries
//!
//! A call flows cluster chain → ha strategy → load balance → selected
//! [`FilterEndPoint`] → endpoint chain → the real caller.

mod caller;
pub use caller::*;

mod cluster;
pub use cluster::*;

mod context;
pub use context::*;

mod endpoint;
pub use endpoint::*;

mod errors;
pub use errors::*;

mod extension;
pub use extension::*;

mod filter;
pub use filter::*;

mod message;
pub use message::*;

mod registry;
pub use registry::*;

mod serialize;
pub use serialize::*;

mod server;
pub use server::*;

pub use weft_types::{
    Attachments, Exception, ParseExportError, Span, TraceContext, Url, parse_export_info,
};
