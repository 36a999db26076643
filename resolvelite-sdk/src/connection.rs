//! Engine factory and lifetime management
//!
//! [`ResolveLite`] owns one engine instance for its whole lifetime. The
//! [`Engine`], [`Diagnostic`] and [`ConfigManager`] handles borrow the
//! factory, so the borrow checker rejects any use of a handle after the
//! factory has been closed or dropped.

use crate::config_manager::ConfigManager;
use crate::diagnostic::Diagnostic;
use crate::engine::Engine;
use crate::error::{Error, Operation, Result};
use resolvelite::{open_backend, Backend, EngineBackend, EngineConfig};
use std::sync::Arc;

/// Main entry point: an initialized engine instance
///
/// The engine is released exactly once, either explicitly through
/// [`ResolveLite::close`] or implicitly when the factory is dropped.
///
/// # Examples
///
/// ```no_run
/// use resolvelite_sdk::{EntityFlags, ResolveLite};
///
/// # fn main() -> Result<(), resolvelite_sdk::Error> {
/// let db = ResolveLite::from_env("resolvelite-example")?;
///
/// let engine = db.engine();
/// let entity = engine.get_entity_by_record_id("CUSTOMERS", "1070", EntityFlags::default())?;
/// println!("Entity {}: {}", entity.entity_id(), entity.resolved_entity.entity_name);
///
/// db.close()?;
/// # Ok(())
/// # }
/// ```
pub struct ResolveLite {
    instance_name: String,
    backend: Arc<dyn Backend>,
    released: bool,
}

impl ResolveLite {
    /// Validate `config` and initialize an engine instance on it
    ///
    /// # Arguments
    ///
    /// * `instance_name` - Name reported in engine statistics and logs
    /// * `config` - Resource paths and datastore connection
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when a path or the connection string is
    /// invalid or unreachable. This is fatal: callers should not retry.
    pub fn open(instance_name: &str, config: &EngineConfig) -> Result<Self> {
        let backend = open_backend(instance_name, config)
            .map_err(|e| Error::from_engine(e, Operation::Initialize))?;
        log::info!("Initialized engine instance '{}'", instance_name);
        Ok(Self::from_backend(instance_name, backend))
    }

    /// Initialize from `RESOLVELITE_ENGINE_CONFIGURATION_JSON` or
    /// `RESOLVELITE_PROJECT_DIR`
    ///
    /// ```no_run
    /// use resolvelite_sdk::ResolveLite;
    ///
    /// let db = ResolveLite::from_env("my-app")?;
    /// # Ok::<(), resolvelite_sdk::Error>(())
    /// ```
    pub fn from_env(instance_name: &str) -> Result<Self> {
        let config = EngineConfig::from_env()
            .map_err(|e| Error::from_engine(e, Operation::Initialize))?;
        Self::open(instance_name, &config)
    }

    /// Wrap an already initialized backend
    ///
    /// The factory takes over releasing it.
    pub fn from_backend(instance_name: &str, backend: Arc<dyn Backend>) -> Self {
        ResolveLite {
            instance_name: instance_name.to_string(),
            backend,
            released: false,
        }
    }

    /// Run `f` against a freshly opened factory and release it afterwards
    ///
    /// The engine is released even when `f` fails; an error from `f` takes
    /// precedence over a release error.
    ///
    /// ```no_run
    /// use resolvelite_sdk::{EngineConfig, ResolveLite};
    ///
    /// # fn main() -> Result<(), resolvelite_sdk::Error> {
    /// let config = EngineConfig::for_project_dir("/var/resolvelite/project");
    /// let info = ResolveLite::with_session("scoped", &config, |db| {
    ///     db.diagnostic().get_datastore_info()
    /// })?;
    /// println!("{} entities", info.entity_count);
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_session<T, F>(instance_name: &str, config: &EngineConfig, f: F) -> Result<T>
    where
        F: FnOnce(&ResolveLite) -> Result<T>,
    {
        let db = Self::open(instance_name, config)?;
        let result = f(&db);
        let closed = db.close();
        let value = result?;
        closed?;
        Ok(value)
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    /// Record, entity, search, path and why operations
    pub fn engine(&self) -> Engine<'_> {
        Engine::new(self.backend.as_ref())
    }

    /// Datastore diagnostics
    pub fn diagnostic(&self) -> Diagnostic<'_> {
        Diagnostic::new(self.backend.as_ref())
    }

    /// Data source registration
    pub fn config(&self) -> ConfigManager<'_> {
        ConfigManager::new(self.backend.as_ref())
    }

    /// Release the engine
    ///
    /// Consumes the factory; the drop that follows does nothing.
    pub fn close(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.backend
            .destroy()
            .map_err(|e| Error::from_engine(e, Operation::Admin))?;
        log::info!("Released engine instance '{}'", self.instance_name);
        Ok(())
    }
}

impl Drop for ResolveLite {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!(
                "Failed to release engine instance '{}' on drop: {}",
                self.instance_name,
                e
            );
        }
    }
}
