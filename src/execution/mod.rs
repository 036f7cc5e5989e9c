//! Compile-or-reuse execution of GraphQL operations
//!
//! The executor turns an [`ExecutionRequest`] into a result by:
//! - Reusing a compiled plan from the compilation cache
//! - Compiling and caching a new plan on a miss
//! - Streaming subscriptions without touching the cache
//!
//! Compilation and subscription execution are delegated to collaborators
//! implementing [`QueryCompiler`] and [`SubscriptionExecutor`].

pub mod artifact;
pub mod executor;
pub mod request;
pub mod response;
pub mod subscription;

pub use artifact::{CompileOptions, CompiledArtifact};
pub use executor::{ExecutionOutcome, JitExecutor, JitExecutorBuilder};
pub use request::{parse_document, Context, Document, ExecutionRequest, OperationType, Variables};
pub use response::{ExecutionResult, GraphQLError, Location};
pub use subscription::Subscription;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

/// Stream of results produced by a subscription
pub type ResponseStream = BoxStream<'static, ExecutionResult>;

/// Compiles operations against a schema of type `S`
pub trait QueryCompiler<S>: Send + Sync {
    /// Compile the operation selected by `operation_name`.
    ///
    /// Returns `CompiledArtifact::Direct` when the operation cannot be
    /// compiled but a result can still be given (for example a validation
    /// error result). An `Err` is a compilation failure and is never cached.
    fn compile(
        &self,
        schema: &S,
        document: &Document,
        operation_name: Option<&str>,
        options: &CompileOptions,
    ) -> Result<CompiledArtifact>;
}

/// A compiled execution plan
#[async_trait]
pub trait CompiledQuery: Send + Sync {
    /// Run the plan. Resolver errors are reported inside the result.
    async fn query(
        &self,
        root_value: Option<&Value>,
        context: &Context,
        variables: &Variables,
    ) -> ExecutionResult;
}

/// Native subscription execution path of a schema of type `S`
#[async_trait]
pub trait SubscriptionExecutor<S>: Send + Sync {
    /// Establish the subscription and return its event results
    async fn subscribe(&self, schema: &S, request: &ExecutionRequest) -> Result<ResponseStream>;
}
