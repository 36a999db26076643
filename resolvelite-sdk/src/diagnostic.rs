//! Diagnostic handle

use crate::error::{Error, Operation, Result};
use crate::result::{parse, DatastoreInfo};
use resolvelite::{Backend, DiagnosticBackend};

/// Datastore diagnostics, borrowed from a [`crate::ResolveLite`] factory
#[derive(Clone, Copy)]
pub struct Diagnostic<'a> {
    backend: &'a dyn Backend,
}

impl<'a> Diagnostic<'a> {
    pub(crate) fn new(backend: &'a dyn Backend) -> Self {
        Diagnostic { backend }
    }

    /// Record counts per data source and the number of resolved entities
    pub fn get_datastore_info(&self) -> Result<DatastoreInfo> {
        let response = self
            .backend
            .get_datastore_info()
            .map_err(|e| Error::from_engine(e, Operation::Admin))?;
        parse(&response)
    }
}
