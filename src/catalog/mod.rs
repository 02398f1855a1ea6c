//! Runtime view of the embedded store.
//!
//! [`load`] turns `manifest.json` into a [`WorkflowIndex`]; [`Catalog`] holds
//! the current index for a long-lived host and swaps it wholesale on reload.

pub mod error;
pub mod index;
pub mod loader;

pub use error::CatalogError;
pub use index::{operation_descriptors, IndexedWorkflow, OperationDescriptor, WorkflowIndex};
pub use loader::load;

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

#[derive(Debug)]
pub struct Catalog {
    store_root: PathBuf,
    current: RwLock<Arc<WorkflowIndex>>,
}

impl Catalog {
    pub fn open(store_root: &Path) -> Result<Self, CatalogError> {
        let index = load(store_root)?;
        Ok(Self {
            store_root: index.store_root.clone(),
            current: RwLock::new(Arc::new(index)),
        })
    }

    pub fn store_root(&self) -> &Path {
        &self.store_root
    }

    /// Snapshot of the index at the time of the call.
    pub fn current(&self) -> Arc<WorkflowIndex> {
        let guard = self.current.read().unwrap_or_else(|err| err.into_inner());
        Arc::clone(&guard)
    }

    /// Rebuilds the index from disk and swaps it in. On failure the previous
    /// index stays in place.
    pub fn reload(&self) -> Result<usize, CatalogError> {
        let index = Arc::new(load(&self.store_root)?);
        let count = index.workflows.len();
        let mut guard = self.current.write().unwrap_or_else(|err| err.into_inner());
        *guard = index;
        tracing::info!(workflows = count, "reloaded workflow index");
        Ok(count)
    }
}
