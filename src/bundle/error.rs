/// Fatal build failures. Any of these aborts the build with a non-zero exit.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("agent index not found at {path}")]
    AgentIndexMissing { path: String },
    #[error("failed to read agent index {path}: {source}")]
    AgentIndex {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("failed to read source version from {path}: {reason}")]
    SourceVersion { path: String, reason: String },
    #[error("refusing to use store root {store_root}: it contains the source root")]
    UnsafeStoreRoot { store_root: String },
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode manifest {path}: {source}")]
    ManifestEncode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("bundle validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

pub(crate) fn io_error(path: &std::path::Path, source: std::io::Error) -> BuildError {
    BuildError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// File-level problems. They are collected and reported after the build
/// instead of aborting it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildWarning {
    #[error("agent `{agent}` source file not found: {path}")]
    MissingAgentSource { agent: String, path: String },
    #[error("agent index row {row} skipped: {reason}")]
    InvalidAgentRow { row: usize, reason: String },
    #[error("duplicate agent `{name}` skipped")]
    DuplicateAgent { name: String },
    #[error("agent `{agent}` skipped: `{embedded_path}` is already taken by another agent")]
    EmbeddedPathCollision {
        agent: String,
        embedded_path: String,
    },
    #[error("workflow directory not found: {path}")]
    MissingWorkflowRoot { path: String },
    #[error("failed to walk {path}: {reason}")]
    WalkFailed { path: String, reason: String },
    #[error("workflow descriptor {path} could not be read: {reason}")]
    UnreadableDescriptor { path: String, reason: String },
    #[error("workflow descriptor missing name field: {path}")]
    DescriptorWithoutName { path: String },
    #[error("workflow `{name}` in {path} is not a valid slug")]
    InvalidWorkflowSlug { name: String, path: String },
    #[error("cannot infer module for workflow descriptor {path}")]
    UnresolvedModule { path: String },
    #[error("duplicate workflow `{module}/{slug}` at {path} skipped")]
    DuplicateWorkflow {
        module: String,
        slug: String,
        path: String,
    },
}
