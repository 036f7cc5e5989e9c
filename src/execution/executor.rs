//! JIT executor: compile once, reuse the plan

use super::artifact::{CompileOptions, CompiledArtifact};
use super::request::{ExecutionRequest, OperationType};
use super::response::ExecutionResult;
use super::subscription::Subscription;
use super::{QueryCompiler, SubscriptionExecutor};
use crate::cache::{create_cache, CacheConfig, CacheKey, CompilationStore};
use crate::error::{JitError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};
use tracing::{debug, warn};

/// What `execute` produced for a request
#[derive(Debug)]
pub enum ExecutionOutcome {
    /// Result of a query or mutation
    Response(ExecutionResult),
    /// Live results of a subscription
    Stream(Subscription),
}

impl ExecutionOutcome {
    pub fn into_response(self) -> Option<ExecutionResult> {
        match self {
            ExecutionOutcome::Response(result) => Some(result),
            ExecutionOutcome::Stream(_) => None,
        }
    }

    pub fn into_stream(self) -> Option<Subscription> {
        match self {
            ExecutionOutcome::Response(_) => None,
            ExecutionOutcome::Stream(subscription) => Some(subscription),
        }
    }
}

/// Executes operations against one schema, reusing compiled plans from a
/// shared [`CompilationStore`]
pub struct JitExecutor<S> {
    schema: Arc<S>,
    prefix: String,
    store: Arc<dyn CompilationStore>,
    compiler: Arc<dyn QueryCompiler<S>>,
    subscriptions: Arc<dyn SubscriptionExecutor<S>>,
    guards: Option<CompilationGuards>,
}

impl<S: Send + Sync + 'static> JitExecutor<S> {
    /// Create an executor with the single-flight compilation guard enabled
    pub fn new(
        schema: Arc<S>,
        prefix: impl Into<String>,
        store: Arc<dyn CompilationStore>,
        compiler: Arc<dyn QueryCompiler<S>>,
        subscriptions: Arc<dyn SubscriptionExecutor<S>>,
    ) -> Self {
        Self {
            schema,
            prefix: prefix.into(),
            store,
            compiler,
            subscriptions,
            guards: Some(CompilationGuards::default()),
        }
    }

    pub fn builder(
        schema: Arc<S>,
        compiler: Arc<dyn QueryCompiler<S>>,
        subscriptions: Arc<dyn SubscriptionExecutor<S>>,
    ) -> JitExecutorBuilder<S> {
        JitExecutorBuilder {
            schema,
            compiler,
            subscriptions,
            prefix: String::new(),
            store: None,
            config: CacheConfig::default(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn schema(&self) -> &Arc<S> {
        &self.schema
    }

    pub fn store(&self) -> &Arc<dyn CompilationStore> {
        &self.store
    }

    /// Cache key under which the request's compiled plan is stored
    pub fn cache_key(&self, request: &ExecutionRequest) -> CacheKey {
        CacheKey::new(
            &self.prefix,
            &request.document,
            request.operation_name.as_deref(),
        )
    }

    /// Execute a request.
    ///
    /// Subscriptions bypass the cache and yield a stream. Queries and
    /// mutations yield a single result; `Err` means compilation failed.
    pub async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionOutcome> {
        match request.operation_type {
            OperationType::Subscription => Ok(ExecutionOutcome::Stream(self.subscribe(request).await)),
            OperationType::Query | OperationType::Mutation => {
                Ok(ExecutionOutcome::Response(self.execute_query(request).await?))
            }
        }
    }

    /// Execute a query or mutation through the compilation cache
    ///
    /// Subscriptions are rejected with `JitError::InvalidRequest`; they are
    /// never compiled or cached. Use [`JitExecutor::subscribe`] instead.
    pub async fn execute_query(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        if request.operation_type == OperationType::Subscription {
            return Err(JitError::InvalidRequest(
                "Subscriptions cannot be executed as queries; use subscribe".to_string(),
            ));
        }

        let document_text = request.document.to_string();
        let operation_name = request.operation_name.as_deref();
        debug!(
            prefix = %self.prefix,
            operation = ?operation_name,
            "Executing {}",
            document_text
        );

        let key = CacheKey::from_canonical(&self.prefix, &document_text, operation_name);
        let artifact = self.resolve_artifact(key, request, &document_text).await?;

        match artifact {
            CompiledArtifact::Plan(plan) => Ok(plan
                .query(request.root_value.as_ref(), &request.context, &request.variables)
                .await),
            CompiledArtifact::Direct(result) => Ok(result),
        }
    }

    /// Establish a subscription without consulting the cache
    ///
    /// Setup failures are delivered as the first and only stream item.
    pub async fn subscribe(&self, request: &ExecutionRequest) -> Subscription {
        debug!(
            prefix = %self.prefix,
            operation = ?request.operation_name,
            "Subscribing {}",
            request.document
        );

        match self.subscriptions.subscribe(&self.schema, request).await {
            Ok(events) => Subscription::new(events),
            Err(e) => {
                warn!(prefix = %self.prefix, "Subscription setup failed: {:#}", e);
                Subscription::failed(JitError::SubscriptionSetup(format!("{:#}", e)))
            }
        }
    }

    async fn resolve_artifact(
        &self,
        key: CacheKey,
        request: &ExecutionRequest,
        document_text: &str,
    ) -> Result<CompiledArtifact> {
        if let Some(artifact) = self.lookup(&key, document_text) {
            return Ok(artifact);
        }

        match &self.guards {
            Some(guards) if self.store.is_enabled() => {
                let key_lock = guards.register(&key);
                let _held = key_lock.lock().await;
                // Another caller may have compiled while we waited.
                if let Some(artifact) = self.lookup(&key, document_text) {
                    return Ok(artifact);
                }
                self.compile_and_store(key, request, document_text)
            }
            _ => self.compile_and_store(key, request, document_text),
        }
    }

    fn lookup(&self, key: &CacheKey, document_text: &str) -> Option<CompiledArtifact> {
        if !self.store.has(key) {
            return None;
        }

        match self.store.get(key) {
            Ok(artifact) => {
                debug!(prefix = %self.prefix, "Compiled version found for {}", document_text);
                Some(artifact)
            }
            Err(e) => {
                warn!(prefix = %self.prefix, "Compiled artifact evicted before use: {}", e);
                None
            }
        }
    }

    fn compile_and_store(
        &self,
        key: CacheKey,
        request: &ExecutionRequest,
        document_text: &str,
    ) -> Result<CompiledArtifact> {
        debug!(prefix = %self.prefix, "Compiling {}", document_text);

        let artifact = self
            .compiler
            .compile(
                &self.schema,
                &request.document,
                request.operation_name.as_deref(),
                &CompileOptions::JIT,
            )
            .map_err(|e| {
                warn!(prefix = %self.prefix, "Compilation failed: {:#}", e);
                JitError::CompilationFailed(e)
            })?;

        debug!(prefix = %self.prefix, kind = artifact.kind(), "Caching compiled artifact");
        self.store.set(key, artifact.clone());
        Ok(artifact)
    }
}

/// Builder for [`JitExecutor`]
pub struct JitExecutorBuilder<S> {
    schema: Arc<S>,
    compiler: Arc<dyn QueryCompiler<S>>,
    subscriptions: Arc<dyn SubscriptionExecutor<S>>,
    prefix: String,
    store: Option<Arc<dyn CompilationStore>>,
    config: CacheConfig,
}

impl<S: Send + Sync + 'static> JitExecutorBuilder<S> {
    /// Namespace prefix scoping this schema's cache keys
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Use an existing, possibly shared, store
    pub fn store(mut self, store: Arc<dyn CompilationStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Cache configuration; used to create a private store when none is given
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<JitExecutor<S>> {
        let store = match self.store {
            Some(store) => store,
            None => create_cache(self.config.clone())?,
        };

        Ok(JitExecutor {
            schema: self.schema,
            prefix: self.prefix,
            store,
            compiler: self.compiler,
            subscriptions: self.subscriptions,
            guards: self.config.single_flight.then(CompilationGuards::default),
        })
    }
}

/// Per-key locks allowing one compilation in flight per cache key
#[derive(Default)]
struct CompilationGuards {
    locks: Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>,
}

impl CompilationGuards {
    /// Register interest in `key`; the entry lives while any handle does
    fn register(&self, key: &CacheKey) -> KeyLock<'_> {
        let lock = self.locks().entry(key.clone()).or_default().clone();

        KeyLock {
            guards: self,
            key: key.clone(),
            lock,
        }
    }

    fn locks(&self) -> MutexGuard<'_, HashMap<CacheKey, Arc<AsyncMutex<()>>>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.locks().len()
    }
}

/// Handle on one key's lock, held by the compiling request and by every
/// request waiting behind it
struct KeyLock<'a> {
    guards: &'a CompilationGuards,
    key: CacheKey,
    lock: Arc<AsyncMutex<()>>,
}

impl KeyLock<'_> {
    async fn lock(&self) -> AsyncMutexGuard<'_, ()> {
        self.lock.lock().await
    }
}

impl Drop for KeyLock<'_> {
    fn drop(&mut self) {
        let mut locks = self.guards.locks();
        // Release our reference under the map lock so counts cannot interleave.
        drop(std::mem::take(&mut self.lock));

        let unused = locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if unused {
            locks.remove(&self.key);
        }
    }
}
