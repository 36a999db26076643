//! Engine handle: record, entity, search, path and why operations

use crate::error::{Error, Operation, Result};
use crate::record::{Record, SearchAttributes};
use crate::result::{
    parse, AddRecordInfo, EngineStats, EntityResponse, PathOutcome, PathResponse, SearchResponse,
    WhyResponse,
};
use resolvelite::{
    Backend, EngineBackend, EngineError, EntityFlags, InfoFlags, PathFlags, SearchFlags, WhyFlags,
};

/// Detail flags of the extended add / delete form
pub type AddRecordFlags = InfoFlags;

/// Engine operations, borrowed from a [`crate::ResolveLite`] factory
///
/// # Examples
///
/// ```no_run
/// use resolvelite_sdk::{Record, ResolveLite, SearchAttributes, SearchFlags};
///
/// # fn main() -> Result<(), resolvelite_sdk::Error> {
/// let db = ResolveLite::from_env("example")?;
/// let engine = db.engine();
///
/// let record = Record::builder()
///     .data_source("CUSTOMERS")
///     .record_id("NEW_001")
///     .attribute("NAME_FULL", "Jane Smith")
///     .build();
/// engine.add_record("CUSTOMERS", "NEW_001", &record)?;
///
/// let attributes = SearchAttributes::builder().name_full("Jane Smith").build();
/// for candidate in engine.search_by_attributes(&attributes, SearchFlags::default())?.entities {
///     println!("{} scored {}", candidate.entity_id, candidate.match_score);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Copy)]
pub struct Engine<'a> {
    backend: &'a dyn Backend,
}

impl<'a> Engine<'a> {
    pub(crate) fn new(backend: &'a dyn Backend) -> Self {
        Engine { backend }
    }

    /// Direct access to the backend for calls the SDK does not wrap
    pub fn backend(&self) -> &'a dyn Backend {
        self.backend
    }

    /// Submit a record for resolution
    ///
    /// # Errors
    ///
    /// [`Error::Record`] when the definition is malformed, its
    /// `DATA_SOURCE` / `RECORD_ID` disagree with the arguments, the record ID
    /// is empty or the data source is not registered.
    pub fn add_record(&self, data_source: &str, record_id: &str, record: &Record) -> Result<()> {
        self.submit(data_source, record_id, record, InfoFlags::default())?;
        Ok(())
    }

    /// Submit a record and report which entities it affected
    pub fn add_record_with_info(
        &self,
        data_source: &str,
        record_id: &str,
        record: &Record,
        flags: AddRecordFlags,
    ) -> Result<AddRecordInfo> {
        let flags = AddRecordFlags {
            with_info: true,
            ..flags
        };
        let response = self.submit(data_source, record_id, record, flags)?;
        parse(&response)
    }

    fn submit(
        &self,
        data_source: &str,
        record_id: &str,
        record: &Record,
        flags: InfoFlags,
    ) -> Result<String> {
        let definition = record.to_json()?;
        log::debug!(
            "add_record {}/{} ({} bytes)",
            data_source,
            record_id,
            definition.len()
        );
        self.backend
            .add_record(data_source, record_id, &definition, flags)
            .map_err(|e| Error::from_engine(e, Operation::Ingest))
    }

    /// Remove a record; removing an absent record is not an error
    pub fn delete_record(&self, data_source: &str, record_id: &str) -> Result<()> {
        self.backend
            .delete_record(data_source, record_id, InfoFlags::default())
            .map_err(|e| Error::from_engine(e, Operation::Ingest))?;
        Ok(())
    }

    /// Remove a record and report which entities it affected
    pub fn delete_record_with_info(
        &self,
        data_source: &str,
        record_id: &str,
        flags: AddRecordFlags,
    ) -> Result<AddRecordInfo> {
        let flags = AddRecordFlags {
            with_info: true,
            ..flags
        };
        let response = self
            .backend
            .delete_record(data_source, record_id, flags)
            .map_err(|e| Error::from_engine(e, Operation::Ingest))?;
        parse(&response)
    }

    /// Resolved entity containing a record
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when no such record has been added.
    pub fn get_entity_by_record_id(
        &self,
        data_source: &str,
        record_id: &str,
        flags: EntityFlags,
    ) -> Result<EntityResponse> {
        let response = self
            .backend
            .get_entity_by_record_id(data_source, record_id, flags)
            .map_err(|e| Error::from_engine(e, Operation::Lookup))?;
        log::debug!("get_entity {}/{}: {} bytes", data_source, record_id, response.len());
        parse(&response)
    }

    /// Resolved entity by ID
    pub fn get_entity_by_entity_id(
        &self,
        entity_id: i64,
        flags: EntityFlags,
    ) -> Result<EntityResponse> {
        let response = self
            .backend
            .get_entity_by_entity_id(entity_id, flags)
            .map_err(|e| Error::from_engine(e, Operation::Lookup))?;
        parse(&response)
    }

    /// Candidate entities for a set of attributes, best match first
    ///
    /// Zero matches is an empty response, not an error.
    ///
    /// # Errors
    ///
    /// [`Error::Search`] when the attributes are empty or unusable.
    pub fn search_by_attributes(
        &self,
        attributes: &SearchAttributes,
        flags: SearchFlags,
    ) -> Result<SearchResponse> {
        if attributes.is_empty() {
            return Err(Error::Search("Search attributes are empty".to_string()));
        }
        let request = attributes.to_json()?;
        let response = self
            .backend
            .search_by_attributes(&request, flags)
            .map_err(|e| Error::from_engine(e, Operation::Search))?;
        log::debug!("search {} bytes -> {} bytes", request.len(), response.len());

        let mut parsed: SearchResponse = parse(&response)?;
        parsed.sort();
        Ok(parsed)
    }

    /// Shortest relationship path of at most `max_degrees` hops
    pub fn find_path_by_entity_id(
        &self,
        start_entity_id: i64,
        end_entity_id: i64,
        max_degrees: u32,
        flags: PathFlags,
    ) -> Result<PathOutcome> {
        let response = match self.backend.find_path_by_entity_id(
            start_entity_id,
            end_entity_id,
            max_degrees,
            flags,
        ) {
            Ok(response) => response,
            Err(EngineError::NotFound(_)) => {
                return Ok(PathOutcome::EntityNotFound(
                    self.missing_entity(start_entity_id, end_entity_id),
                ))
            }
            Err(e) => return Err(Error::from_engine(e, Operation::Path)),
        };

        let path: PathResponse = parse(&response)?;
        if path.entities.is_empty() {
            Ok(PathOutcome::NoPath)
        } else {
            Ok(PathOutcome::Found(path))
        }
    }

    /// Which of the two path endpoints is absent
    fn missing_entity(&self, start_entity_id: i64, end_entity_id: i64) -> i64 {
        match self
            .backend
            .get_entity_by_entity_id(start_entity_id, EntityFlags::minimal())
        {
            Err(EngineError::NotFound(_)) => start_entity_id,
            _ => end_entity_id,
        }
    }

    /// Explain why two records did or did not resolve together
    ///
    /// # Errors
    ///
    /// [`Error::Record`] when either record does not exist.
    pub fn why_records(
        &self,
        data_source_1: &str,
        record_id_1: &str,
        data_source_2: &str,
        record_id_2: &str,
        flags: WhyFlags,
    ) -> Result<WhyResponse> {
        let response = self
            .backend
            .why_records(data_source_1, record_id_1, data_source_2, record_id_2, flags)
            .map_err(|e| Error::from_engine(e, Operation::Why))?;
        parse(&response)
    }

    /// Engine-internal counters
    pub fn get_stats(&self) -> Result<EngineStats> {
        let response = self
            .backend
            .get_stats()
            .map_err(|e| Error::from_engine(e, Operation::Admin))?;
        EngineStats::from_json(&response)
    }
}
