//! gql-jit - compiled-query execution cache
//!
//! Turns GraphQL requests into results by reusing a previously compiled
//! execution plan or compiling a new one, at most once per
//! (namespace prefix, document, operation name). Subscriptions bypass
//! compilation and stream results directly.

pub mod cache;
pub mod error;
pub mod execution;

pub use cache::{create_cache, CacheConfig, CacheKey, CompilationStore, LruCompilationCache};
pub use error::{JitError, Result};
pub use execution::{
    CompileOptions, CompiledArtifact, CompiledQuery, ExecutionOutcome, ExecutionRequest,
    ExecutionResult, JitExecutor, OperationType, QueryCompiler, Subscription,
    SubscriptionExecutor,
};

/// gql-jit version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install a `tracing` subscriber for the executor's diagnostics
///
/// Filtering follows `RUST_LOG` and defaults to `info`. Does nothing when a
/// global subscriber is already installed.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
