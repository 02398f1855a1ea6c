use crate::shared::sandbox::SandboxError;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("refusing to write outside the working directory: {0}")]
    Sandbox(#[from] SandboxError),
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode workflow inputs: {0}")]
    Inputs(#[source] serde_json::Error),
}

pub(crate) fn io_error(path: &std::path::Path, source: std::io::Error) -> RenderError {
    RenderError::Io {
        path: path.display().to_string(),
        source,
    }
}
