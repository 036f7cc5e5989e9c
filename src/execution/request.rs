//! Execution request descriptor

use crate::error::{JitError, Result};
use graphql_parser::query::{Definition, OperationDefinition};
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Parsed operation document shared between callers and the cache
pub type Document = graphql_parser::query::Document<'static, String>;

/// Opaque per-call state handed through to resolvers
pub type Context = Arc<dyn Any + Send + Sync>;

/// Variable values keyed by variable name
pub type Variables = Map<String, Value>;

/// Kind of operation a request carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Query => "query",
            OperationType::Mutation => "mutation",
            OperationType::Subscription => "subscription",
        }
    }

    /// Determine the type of the operation selected by `operation_name`.
    ///
    /// Without a name the document must hold exactly one operation.
    /// Returns `None` when no operation can be selected.
    pub fn from_document(document: &Document, operation_name: Option<&str>) -> Option<Self> {
        let mut operations = document.definitions.iter().filter_map(|def| match def {
            Definition::Operation(op) => Some(op),
            Definition::Fragment(_) => None,
        });

        match operation_name {
            Some(name) => operations
                .find(|op| operation_name_of(op) == Some(name))
                .map(Self::of),
            None => {
                let first = operations.next()?;
                if operations.next().is_some() {
                    return None;
                }
                Some(Self::of(first))
            }
        }
    }

    fn of(op: &OperationDefinition<'static, String>) -> Self {
        match op {
            OperationDefinition::SelectionSet(_) | OperationDefinition::Query(_) => {
                OperationType::Query
            }
            OperationDefinition::Mutation(_) => OperationType::Mutation,
            OperationDefinition::Subscription(_) => OperationType::Subscription,
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn operation_name_of<'a>(op: &'a OperationDefinition<'static, String>) -> Option<&'a str> {
    match op {
        OperationDefinition::SelectionSet(_) => None,
        OperationDefinition::Query(q) => q.name.as_deref(),
        OperationDefinition::Mutation(m) => m.name.as_deref(),
        OperationDefinition::Subscription(s) => s.name.as_deref(),
    }
}

/// Everything needed to execute one operation against a schema
#[derive(Clone)]
pub struct ExecutionRequest {
    pub document: Arc<Document>,
    pub variables: Variables,
    pub context: Context,
    pub operation_name: Option<String>,
    pub operation_type: OperationType,
    pub root_value: Option<Value>,
}

impl ExecutionRequest {
    /// Create a request for an already parsed document
    pub fn new(document: impl Into<Arc<Document>>, operation_type: OperationType) -> Self {
        Self {
            document: document.into(),
            variables: Variables::new(),
            context: Arc::new(()),
            operation_name: None,
            operation_type,
            root_value: None,
        }
    }

    /// Parse `source` and build a request for its only operation
    pub fn parse(source: &str) -> Result<Self> {
        Self::parse_operation(source, None)
    }

    /// Parse `source` and build a request for the named operation
    pub fn parse_operation(source: &str, operation_name: Option<&str>) -> Result<Self> {
        let document = parse_document(source)?;
        let operation_type =
            OperationType::from_document(&document, operation_name).ok_or_else(|| {
                JitError::InvalidRequest(match operation_name {
                    Some(name) => format!("Unknown operation named '{}'", name),
                    None => "Document must contain exactly one operation when no operation name is given".to_string(),
                })
            })?;

        let mut request = Self::new(document, operation_type);
        request.operation_name = operation_name.map(ToString::to_string);
        Ok(request)
    }

    /// Set variable values
    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    /// Set the per-call context
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Set the operation name
    pub fn with_operation_name(mut self, operation_name: impl Into<String>) -> Self {
        self.operation_name = Some(operation_name.into());
        self
    }

    /// Set the root value
    pub fn with_root_value(mut self, root_value: Value) -> Self {
        self.root_value = Some(root_value);
        self
    }
}

impl fmt::Debug for ExecutionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionRequest")
            .field("document", &self.document.to_string())
            .field("variables", &self.variables)
            .field("operation_name", &self.operation_name)
            .field("operation_type", &self.operation_type)
            .field("root_value", &self.root_value)
            .finish_non_exhaustive()
    }
}

/// Parse query text into an owned document
pub fn parse_document(source: &str) -> Result<Document> {
    graphql_parser::parse_query::<String>(source)
        .map(|doc| doc.into_static())
        .map_err(|e| JitError::Parse(e.to_string()))
}
