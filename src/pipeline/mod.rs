//! The request transport pipeline.
//!
//! # Data Flow
//! ```text
//! Inbound request (axum fallback service)
//!     → tagger.rs    (X-K8s-Proxy-Id overwritten with a fresh UUID)
//!     → logging.rs   (observes the outcome, never changes it)
//!     → resolver.rs  (Host → backend, rewrites scheme + authority)
//!     → filter.rs    (path policy; rejection → 403 status envelope)
//!     → executor.rs  (pooled TLS 1.3 round trip to the backend)
//! ```
//!
//! # Design Decisions
//! - Every stage is a tower `Service` with the same request, response and
//!   error types, so any stage can wrap any other
//! - The order lives in [`compose`] and nowhere else. The resolver runs
//!   before the filter but only touches scheme and authority, so swapping
//!   the two changes no decision
//! - Expected outcomes (denials) become responses inside the stage;
//!   only real failures travel as `ProxyError`
//! - The executor slot is generic so tests can count backend calls

use std::sync::Arc;

use axum::body::Body;
use axum::http::Response;
use futures_util::future::BoxFuture;
use tower::ServiceBuilder;

use crate::error::ProxyError;
use crate::policy::PathPolicy;
use crate::routing::Backend;
use crate::status::DenialResponder;

pub mod executor;
pub mod filter;
pub mod logging;
pub mod resolver;
pub mod tagger;

pub use executor::UpstreamClient;
pub use filter::{PathFilter, PathFilterLayer};
pub use logging::{Logging, LoggingLayer};
pub use resolver::{BackendResolver, BackendResolverLayer};
pub use tagger::{request_tagger_layer, CorrelationIdMaker, RequestTagger, CORRELATION_ID_HEADER};

/// Future returned by every pipeline stage.
pub type ProxyFuture = BoxFuture<'static, Result<Response<Body>, ProxyError>>;

/// The composed chain, outermost stage first.
pub type Pipeline<S> = RequestTagger<Logging<BackendResolver<PathFilter<S>>>>;

/// Shared, immutable inputs of the pipeline stages.
#[derive(Debug, Clone)]
pub struct Stages {
    pub backends: Arc<dyn Backend>,
    pub policy: Arc<PathPolicy>,
    pub responder: Arc<DenialResponder>,
}

/// Wire the stages around `executor`.
///
/// Call order: tagger → logging → resolver → filter → executor.
pub fn compose<S>(stages: Stages, executor: S) -> Pipeline<S> {
    ServiceBuilder::new()
        .layer(request_tagger_layer())
        .layer(LoggingLayer::new())
        .layer(BackendResolverLayer::new(stages.backends))
        .layer(PathFilterLayer::new(stages.policy, stages.responder))
        .service(executor)
}
