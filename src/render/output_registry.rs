use super::error::{io_error, RenderError};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const OUTPUT_URI_PREFIX: &str = "agentpack://output/";

/// Lowercase hex sha256 of an output's absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputId(String);

impl OutputId {
    pub fn for_path(path: &Path) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(path.as_os_str().as_encoded_bytes());
        Self(to_hex(&hasher.finalize()))
    }

    /// Accepts only well-formed ids.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let valid = raw.len() == 64
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(raw.to_string()))
    }

    /// Parses either a bare id or an `agentpack://output/{id}` URI.
    pub fn from_reference(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::parse(raw.strip_prefix(OUTPUT_URI_PREFIX).unwrap_or(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn uri(&self) -> String {
        format!("{OUTPUT_URI_PREFIX}{}", self.0)
    }
}

impl std::fmt::Display for OutputId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    const HEX: &[u8; 16] = b"0123456789abcdef";
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

#[derive(Debug, Default)]
struct RegistryState {
    paths: HashMap<OutputId, PathBuf>,
    order: VecDeque<OutputId>,
}

/// Ids for documents written during this process. Unbounded unless built
/// with [`OutputRegistry::bounded`], which drops the oldest registration.
#[derive(Debug, Default)]
pub struct OutputRegistry {
    state: Mutex<RegistryState>,
    capacity: Option<usize>,
}

impl OutputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bounded(capacity: usize) -> Self {
        Self {
            state: Mutex::default(),
            capacity: Some(capacity.max(1)),
        }
    }

    pub fn register(&self, path: &Path) -> OutputId {
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let id = OutputId::for_path(&path);
        let mut state = self.state.lock().unwrap_or_else(|err| err.into_inner());
        if state.paths.contains_key(&id) {
            return id;
        }
        if let Some(capacity) = self.capacity {
            while state.order.len() >= capacity {
                let Some(evicted) = state.order.pop_front() else {
                    break;
                };
                state.paths.remove(&evicted);
                tracing::debug!(id = %evicted, "evicted output registration");
            }
        }
        state.paths.insert(id.clone(), path);
        state.order.push_back(id.clone());
        id
    }

    pub fn resolve(&self, id: &str) -> Option<PathBuf> {
        let id = OutputId::from_reference(id)?;
        let state = self.state.lock().unwrap_or_else(|err| err.into_inner());
        state.paths.get(&id).cloned()
    }

    /// `Ok(None)` for unknown ids. A registered file that has since vanished
    /// is an error.
    pub fn read(&self, id: &str) -> Result<Option<String>, RenderError> {
        let Some(path) = self.resolve(id) else {
            return Ok(None);
        };
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|err| io_error(&path, err))
    }

    pub fn len(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(|err| err.into_inner());
        state.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
