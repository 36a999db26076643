//! Request documents: records and search attributes
//!
//! Both are free-form JSON objects with upper-case attribute keys. The
//! builders here replace hand-written JSON strings with a fluent API.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A source record submitted for resolution
///
/// # Examples
///
/// ```no_run
/// use resolvelite_sdk::Record;
///
/// let record = Record::builder()
///     .data_source("CUSTOMERS")
///     .record_id("NEW_001")
///     .record_type("PERSON")
///     .attribute("PRIMARY_NAME_FIRST", "Jane")
///     .attribute("PRIMARY_NAME_LAST", "Smith")
///     .attribute("DATE_OF_BIRTH", "1985-03-15")
///     .build();
/// assert_eq!(record.record_id(), Some("NEW_001"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Start building a record
    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }

    /// Parse a serialized record definition; it must be a JSON object
    pub fn from_json(json: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(json) {
            Ok(value) => Self::from_value(value),
            Err(e) => Err(Error::Record(format!("Record is not valid JSON: {}", e))),
        }
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Record { fields }),
            other => Err(Error::Record(format!(
                "Record must be a JSON object, got {}",
                other
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn data_source(&self) -> Option<&str> {
        self.get("DATA_SOURCE").and_then(Value::as_str)
    }

    pub fn record_id(&self) -> Option<&str> {
        self.get("RECORD_ID").and_then(Value::as_str)
    }

    pub fn record_type(&self) -> Option<&str> {
        self.get("RECORD_TYPE").and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Serialized record definition
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.fields)?)
    }
}

/// Fluent builder for [`Record`]
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    fields: Map<String, Value>,
}

impl RecordBuilder {
    pub fn data_source(self, code: &str) -> Self {
        self.attribute("DATA_SOURCE", code)
    }

    pub fn record_id(self, id: &str) -> Self {
        self.attribute("RECORD_ID", id)
    }

    pub fn record_type(self, record_type: &str) -> Self {
        self.attribute("RECORD_TYPE", record_type)
    }

    /// Set any attribute field; later calls overwrite earlier ones
    pub fn attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn build(self) -> Record {
        Record {
            fields: self.fields,
        }
    }
}

/// Identifying attributes for a search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchAttributes {
    fields: Map<String, Value>,
}

impl SearchAttributes {
    /// Start building search attributes
    ///
    /// ```no_run
    /// use resolvelite_sdk::SearchAttributes;
    ///
    /// let attributes = SearchAttributes::builder()
    ///     .name_full("Robert Smith")
    ///     .date_of_birth("1978-12-11")
    ///     .build();
    /// assert!(!attributes.is_empty());
    /// ```
    pub fn builder() -> SearchBuilder {
        SearchBuilder::default()
    }

    /// Parse serialized attributes; they must be a JSON object
    pub fn from_json(json: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(json) {
            Ok(Value::Object(fields)) => Ok(SearchAttributes { fields }),
            Ok(other) => Err(Error::Search(format!(
                "Search attributes must be a JSON object, got {}",
                other
            ))),
            Err(e) => Err(Error::Search(format!(
                "Search attributes are not valid JSON: {}",
                e
            ))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.fields)?)
    }
}

/// Fluent builder for [`SearchAttributes`]
#[derive(Debug, Clone, Default)]
pub struct SearchBuilder {
    fields: Map<String, Value>,
}

impl SearchBuilder {
    pub fn name_full(self, name: &str) -> Self {
        self.attribute("NAME_FULL", name)
    }

    pub fn name_first(self, name: &str) -> Self {
        self.attribute("NAME_FIRST", name)
    }

    pub fn name_last(self, name: &str) -> Self {
        self.attribute("NAME_LAST", name)
    }

    pub fn date_of_birth(self, dob: &str) -> Self {
        self.attribute("DATE_OF_BIRTH", dob)
    }

    pub fn address(self, address: &str) -> Self {
        self.attribute("ADDR_FULL", address)
    }

    pub fn phone(self, phone: &str) -> Self {
        self.attribute("PHONE_NUMBER", phone)
    }

    pub fn email(self, email: &str) -> Self {
        self.attribute("EMAIL_ADDRESS", email)
    }

    pub fn ssn(self, ssn: &str) -> Self {
        self.attribute("SSN_NUMBER", ssn)
    }

    pub fn attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn build(self) -> SearchAttributes {
        SearchAttributes {
            fields: self.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder_fields() {
        let record = Record::builder()
            .data_source("CUSTOMERS")
            .record_id("NEW_001")
            .record_type("PERSON")
            .attribute("PRIMARY_NAME_FIRST", "Jane")
            .build();
        assert_eq!(record.data_source(), Some("CUSTOMERS"));
        assert_eq!(record.record_type(), Some("PERSON"));

        let json: Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(json["PRIMARY_NAME_FIRST"], "Jane");
    }

    #[test]
    fn test_record_must_be_object() {
        assert!(matches!(Record::from_json("[1, 2]"), Err(Error::Record(_))));
        assert!(matches!(Record::from_json("{oops"), Err(Error::Record(_))));
        assert!(Record::from_json(r#"{"NAME_FULL": "A"}"#).is_ok());
    }

    #[test]
    fn test_search_attributes_must_be_object() {
        assert!(matches!(
            SearchAttributes::from_json("\"Robert\""),
            Err(Error::Search(_))
        ));
        let attributes = SearchAttributes::builder().phone("555-0100").build();
        assert_eq!(attributes.get("PHONE_NUMBER").unwrap(), "555-0100");
    }
}
