//! Compiled artifacts stored in the compilation cache

use super::response::ExecutionResult;
use super::CompiledQuery;
use std::fmt;
use std::sync::Arc;

/// Flags passed to the query compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Skip leaf value serialization inside the compiled plan
    pub disable_leaf_serialization: bool,

    /// Emit results through the compiler's own JSON serializer
    pub custom_json_serializer: bool,
}

impl CompileOptions {
    /// Options used for every compilation performed by the executor
    pub const JIT: CompileOptions = CompileOptions {
        disable_leaf_serialization: true,
        custom_json_serializer: true,
    };
}

/// Outcome of compiling an operation
#[derive(Clone)]
pub enum CompiledArtifact {
    /// Executable plan bound to one schema
    Plan(Arc<dyn CompiledQuery>),
    /// The compiler declined and produced a result directly
    Direct(ExecutionResult),
}

impl CompiledArtifact {
    pub fn plan(plan: impl CompiledQuery + 'static) -> Self {
        CompiledArtifact::Plan(Arc::new(plan))
    }

    pub fn is_plan(&self) -> bool {
        matches!(self, CompiledArtifact::Plan(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CompiledArtifact::Plan(_) => "plan",
            CompiledArtifact::Direct(_) => "direct",
        }
    }
}

impl fmt::Debug for CompiledArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompiledArtifact::Plan(_) => f.write_str("Plan(..)"),
            CompiledArtifact::Direct(result) => f.debug_tuple("Direct").field(result).finish(),
        }
    }
}

impl From<ExecutionResult> for CompiledArtifact {
    fn from(result: ExecutionResult) -> Self {
        CompiledArtifact::Direct(result)
    }
}
