//! Configuration handle: data source registration

use crate::error::{Error, Operation, Result};
use crate::result::{parse, DataSource, DataSourceId, DataSourceList};
use resolvelite::{Backend, ConfigBackend};

/// Engine configuration, borrowed from a [`crate::ResolveLite`] factory
#[derive(Clone, Copy)]
pub struct ConfigManager<'a> {
    backend: &'a dyn Backend,
}

impl<'a> ConfigManager<'a> {
    pub(crate) fn new(backend: &'a dyn Backend) -> Self {
        ConfigManager { backend }
    }

    /// Register a data source and return its ID
    ///
    /// Codes are upper-cased; registering an existing code fails.
    pub fn add_data_source(&self, code: &str) -> Result<u32> {
        let response = self
            .backend
            .add_data_source(code)
            .map_err(|e| Error::from_engine(e, Operation::Admin))?;
        let added: DataSourceId = parse(&response)?;
        Ok(added.id)
    }

    /// Register a data source unless it already exists
    pub fn ensure_data_source(&self, code: &str) -> Result<u32> {
        let wanted = code.trim().to_uppercase();
        match self.data_sources()?.into_iter().find(|ds| ds.code == wanted) {
            Some(existing) => Ok(existing.id),
            None => self.add_data_source(&wanted),
        }
    }

    /// Registered data sources, in registration order
    pub fn data_sources(&self) -> Result<Vec<DataSource>> {
        let response = self
            .backend
            .get_data_sources()
            .map_err(|e| Error::from_engine(e, Operation::Admin))?;
        let list: DataSourceList = parse(&response)?;
        Ok(list.data_sources)
    }
}
