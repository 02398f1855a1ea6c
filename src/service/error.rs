use crate::catalog::CatalogError;
use crate::render::RenderError;
use crate::shared::sandbox::SandboxError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("workflow `{requested}` not found; available: {}", .available.join(", "))]
    WorkflowNotFound {
        requested: String,
        available: Vec<String>,
    },
    #[error("agent `{requested}` not found; available: {}", .available.join(", "))]
    AgentNotFound {
        requested: String,
        available: Vec<String>,
    },
    #[error("failed to read agent `{agent}` at {path}: {source}")]
    AgentRead {
        agent: String,
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}
