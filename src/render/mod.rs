//! Prompt-pack assembly and the registry of written outputs.

pub mod error;
pub mod metadata;
pub mod output_registry;
pub mod prompt_pack;

pub use error::RenderError;
pub use output_registry::{OutputId, OutputRegistry, OUTPUT_URI_PREFIX};
pub use prompt_pack::{PromptPackRenderer, RenderOutcome, RenderRequest, PROMPT_PACK_MARKER};
