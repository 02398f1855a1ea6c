use crate::shared::sandbox::SandboxError;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("embedded manifest not found at `{path}`; run `agentpack build` before starting")]
    ManifestMissing { path: String },
    #[error("failed to parse manifest `{path}`: {source}")]
    ManifestParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid manifest `{path}`: missing or malformed `{field}`")]
    ManifestSchema { path: String, field: String },
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
