//! Shared test collaborators: a JSON-backed schema, a counting compiler,
//! a recording store and a scripted subscription executor.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use gql_jit::cache::{CacheConfig, CacheStats, LruCompilationCache};
use gql_jit::execution::{
    CompileOptions, CompiledArtifact, CompiledQuery, Context, Document, ExecutionRequest,
    ExecutionResult, GraphQLError, QueryCompiler, ResponseStream, SubscriptionExecutor, Variables,
};
use gql_jit::{CacheKey, CompilationStore, JitExecutor};
use graphql_parser::query::{Definition, OperationDefinition, Selection, SelectionSet};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Schema whose root fields resolve from a JSON object
pub struct TestSchema {
    pub data: Value,
}

impl TestSchema {
    pub fn new(data: Value) -> Arc<Self> {
        Arc::new(Self { data })
    }
}

/// Compiles the selected operation into a list of root fields.
///
/// - a field named `unsupported` makes the compiler decline
/// - a field named `broken` makes compilation fail
pub struct CountingCompiler {
    compilations: AtomicUsize,
    delay: Option<Duration>,
    seen_options: Mutex<Vec<CompileOptions>>,
}

impl CountingCompiler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            compilations: AtomicUsize::new(0),
            delay: None,
            seen_options: Mutex::new(Vec::new()),
        })
    }

    /// Compiler that takes `delay` per compilation
    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            compilations: AtomicUsize::new(0),
            delay: Some(delay),
            seen_options: Mutex::new(Vec::new()),
        })
    }

    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::SeqCst)
    }

    pub fn seen_options(&self) -> Vec<CompileOptions> {
        self.seen_options.lock().unwrap().clone()
    }
}

impl QueryCompiler<TestSchema> for CountingCompiler {
    fn compile(
        &self,
        schema: &TestSchema,
        document: &Document,
        operation_name: Option<&str>,
        options: &CompileOptions,
    ) -> anyhow::Result<CompiledArtifact> {
        self.compilations.fetch_add(1, Ordering::SeqCst);
        self.seen_options.lock().unwrap().push(*options);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let fields = root_fields(document, operation_name)
            .ok_or_else(|| anyhow::anyhow!("Unknown operation"))?;

        if fields.iter().any(|(_, name)| name == "broken") {
            anyhow::bail!("Field 'broken' cannot be compiled");
        }

        if fields.iter().any(|(_, name)| name == "unsupported") {
            return Ok(CompiledArtifact::Direct(ExecutionResult::from_errors(vec![
                GraphQLError::new("Operation not supported by the compiler"),
            ])));
        }

        Ok(CompiledArtifact::plan(FieldPlan {
            fields,
            defaults: schema.data.clone(),
        }))
    }
}

/// Root fields as (response key, field name)
fn root_fields(document: &Document, operation_name: Option<&str>) -> Option<Vec<(String, String)>> {
    let selection_set = document.definitions.iter().find_map(|def| match def {
        Definition::Operation(op) => select(op, operation_name),
        Definition::Fragment(_) => None,
    })?;

    Some(
        selection_set
            .items
            .iter()
            .filter_map(|item| match item {
                Selection::Field(field) => Some((
                    field.alias.clone().unwrap_or_else(|| field.name.clone()),
                    field.name.clone(),
                )),
                _ => None,
            })
            .collect(),
    )
}

fn select<'a>(
    op: &'a OperationDefinition<'static, String>,
    operation_name: Option<&str>,
) -> Option<&'a SelectionSet<'static, String>> {
    let (name, selection_set) = match op {
        OperationDefinition::SelectionSet(s) => (None, s),
        OperationDefinition::Query(q) => (q.name.as_deref(), &q.selection_set),
        OperationDefinition::Mutation(m) => (m.name.as_deref(), &m.selection_set),
        OperationDefinition::Subscription(s) => (s.name.as_deref(), &s.selection_set),
    };

    match operation_name {
        Some(wanted) if name != Some(wanted) => None,
        _ => Some(selection_set),
    }
}

/// Resolves root fields from the root value, falling back to schema data.
///
/// `echo` returns the variables, `viewer` the `String` stored in the context.
struct FieldPlan {
    fields: Vec<(String, String)>,
    defaults: Value,
}

#[async_trait]
impl CompiledQuery for FieldPlan {
    async fn query(
        &self,
        root_value: Option<&Value>,
        context: &Context,
        variables: &Variables,
    ) -> ExecutionResult {
        let root = root_value.unwrap_or(&self.defaults);
        let mut data = Map::new();
        let mut errors = Vec::new();

        for (key, name) in &self.fields {
            let value = match name.as_str() {
                "echo" => Some(Value::Object(variables.clone())),
                "viewer" => context.downcast_ref::<String>().map(|v| json!(v)),
                _ => root.get(name).cloned(),
            };

            match value {
                Some(value) => {
                    data.insert(key.clone(), value);
                }
                None => {
                    data.insert(key.clone(), Value::Null);
                    errors.push(
                        GraphQLError::new(format!("Cannot resolve field '{}'", name))
                            .with_path(vec![json!(key)]),
                    );
                }
            }
        }

        ExecutionResult {
            data: Some(Value::Object(data)),
            errors,
            extensions: None,
        }
    }
}

/// Emits `count` events per subscription; a `failing` root field fails setup
pub struct ScriptedSubscriptions {
    pub count: i64,
    calls: AtomicUsize,
}

impl ScriptedSubscriptions {
    pub fn new(count: i64) -> Arc<Self> {
        Arc::new(Self {
            count,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubscriptionExecutor<TestSchema> for ScriptedSubscriptions {
    async fn subscribe(
        &self,
        _schema: &TestSchema,
        request: &ExecutionRequest,
    ) -> anyhow::Result<ResponseStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let fields = root_fields(&request.document, request.operation_name.as_deref())
            .ok_or_else(|| anyhow::anyhow!("Unknown operation"))?;
        let (key, name) = fields
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Subscription selects no field"))?;

        if name == "failing" {
            anyhow::bail!("Event source unavailable");
        }

        Ok(stream::iter(0..self.count)
            .map(move |i| {
                let mut event = Map::new();
                event.insert(key.clone(), json!(i));
                ExecutionResult::from_data(Value::Object(event))
            })
            .boxed())
    }
}

/// Store wrapper counting every call made by the executor
pub struct RecordingStore {
    inner: LruCompilationCache,
    pub has_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub set_calls: AtomicUsize,
}

impl RecordingStore {
    pub fn new(max_entries: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: LruCompilationCache::new(CacheConfig::new(true, max_entries, true)).unwrap(),
            has_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
            set_calls: AtomicUsize::new(0),
        })
    }

    pub fn total_calls(&self) -> usize {
        self.has_calls.load(Ordering::SeqCst)
            + self.get_calls.load(Ordering::SeqCst)
            + self.set_calls.load(Ordering::SeqCst)
    }
}

impl CompilationStore for RecordingStore {
    fn has(&self, key: &CacheKey) -> bool {
        self.has_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.has(key)
    }

    fn get(&self, key: &CacheKey) -> gql_jit::Result<CompiledArtifact> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key)
    }

    fn set(&self, key: CacheKey, artifact: CompiledArtifact) {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, artifact)
    }

    fn invalidate(&self, key: &CacheKey) -> bool {
        self.inner.invalidate(key)
    }

    fn clear(&self) {
        self.inner.clear()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    fn stats(&self) -> CacheStats {
        self.inner.stats()
    }

    fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }
}

/// Executor over `{ "a": 1, "b": 2 }` with the given store and compiler
pub fn executor_with(
    prefix: &str,
    store: Arc<dyn CompilationStore>,
    compiler: Arc<CountingCompiler>,
) -> JitExecutor<TestSchema> {
    JitExecutor::new(
        TestSchema::new(json!({ "a": 1, "b": 2 })),
        prefix,
        store,
        compiler,
        ScriptedSubscriptions::new(3),
    )
}
