//! Tagged document tree used for path selection.
//!
//! Datasets (and anything else callers want to select into) are converted
//! once into a [`Document`], a closed set of container shapes. The path
//! resolver then walks that tree by variant, never by runtime type
//! inspection.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

mod path;

pub use path::{resolve, select, PathError};

/// Leaf values of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// A nested, heterogeneous document.
///
/// `Record` and `Mapping` are both ordered lists of named children. They
/// differ in origin: records come from typed structs (field names in
/// declaration order), mappings from free-form key/value data (keys in
/// insertion order; JSON objects keep their source order).
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Record(Vec<(String, Document)>),
    Sequence(Vec<Document>),
    Mapping(Vec<(String, Document)>),
    Scalar(Scalar),
    /// An unset optional value
    Absent,
}

impl Document {
    pub fn is_absent(&self) -> bool {
        matches!(self, Document::Absent)
    }

    /// Start building a record, skipping nothing; absent fields stay in the
    ///  record so that they resolve to `Absent` rather than "no such field".
    pub fn record() -> RecordBuilder {
        RecordBuilder(Vec::new())
    }

    /// Convert into a JSON value, dropping the record/mapping distinction.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            Document::Record(fields) | Document::Mapping(fields) => Value::Object(
                fields
                    .iter()
                    .filter(|(_, v)| !v.is_absent())
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Document::Sequence(items) => Value::Array(items.iter().map(|v| v.to_json()).collect()),
            Document::Scalar(scalar) => match scalar {
                Scalar::Null => Value::Null,
                Scalar::Bool(b) => Value::Bool(*b),
                Scalar::Int(i) => Value::from(*i),
                Scalar::Float(f) => serde_json::Number::from_f64(*f)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                Scalar::String(s) => Value::String(s.clone()),
            },
            Document::Absent => Value::Null,
        }
    }
}

pub struct RecordBuilder(Vec<(String, Document)>);

impl RecordBuilder {
    pub fn field(mut self, name: &str, value: &impl ToDocument) -> Self {
        self.0.push((name.to_string(), value.to_document()));
        self
    }

    pub fn build(self) -> Document {
        Document::Record(self.0)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Document::Record(fields) | Document::Mapping(fields) => {
                let present = fields.iter().filter(|(_, v)| !v.is_absent());
                let mut map = serializer.serialize_map(None)?;
                for (k, v) in present {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Document::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Document::Scalar(Scalar::Null) | Document::Absent => serializer.serialize_unit(),
            Document::Scalar(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            Document::Scalar(Scalar::Int(i)) => serializer.serialize_i64(*i),
            Document::Scalar(Scalar::Float(f)) => serializer.serialize_f64(*f),
            Document::Scalar(Scalar::String(s)) => serializer.serialize_str(s),
        }
    }
}

impl From<serde_json::Value> for Document {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Document::Scalar(Scalar::Null),
            Value::Bool(b) => Document::Scalar(Scalar::Bool(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Document::Scalar(Scalar::Int(i)),
                None => Document::Scalar(Scalar::Float(n.as_f64().unwrap_or_default())),
            },
            Value::String(s) => Document::Scalar(Scalar::String(s)),
            Value::Array(items) => Document::Sequence(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                Document::Mapping(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// Conversion into the document tree.
pub trait ToDocument {
    fn to_document(&self) -> Document;
}

impl ToDocument for Document {
    fn to_document(&self) -> Document {
        self.clone()
    }
}

impl ToDocument for String {
    fn to_document(&self) -> Document {
        Document::Scalar(Scalar::String(self.clone()))
    }
}

impl ToDocument for str {
    fn to_document(&self) -> Document {
        Document::Scalar(Scalar::String(self.to_string()))
    }
}

impl ToDocument for bool {
    fn to_document(&self) -> Document {
        Document::Scalar(Scalar::Bool(*self))
    }
}

impl ToDocument for i64 {
    fn to_document(&self) -> Document {
        Document::Scalar(Scalar::Int(*self))
    }
}

impl ToDocument for u64 {
    fn to_document(&self) -> Document {
        match i64::try_from(*self) {
            Ok(i) => Document::Scalar(Scalar::Int(i)),
            Err(_) => Document::Scalar(Scalar::Float(*self as f64)),
        }
    }
}

impl ToDocument for f64 {
    fn to_document(&self) -> Document {
        Document::Scalar(Scalar::Float(*self))
    }
}

impl ToDocument for DateTime<Utc> {
    fn to_document(&self) -> Document {
        // same form as the serde encoding
        Document::Scalar(Scalar::String(self.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
    }
}

impl ToDocument for serde_json::Value {
    fn to_document(&self) -> Document {
        self.clone().into()
    }
}

// One layer of optional indirection: either the inner value or `Absent`.
impl<T: ToDocument> ToDocument for Option<T> {
    fn to_document(&self) -> Document {
        match self {
            Some(value) => value.to_document(),
            None => Document::Absent,
        }
    }
}

impl<T: ToDocument> ToDocument for Box<T> {
    fn to_document(&self) -> Document {
        self.as_ref().to_document()
    }
}

impl<T: ToDocument> ToDocument for Vec<T> {
    fn to_document(&self) -> Document {
        Document::Sequence(self.iter().map(ToDocument::to_document).collect())
    }
}

impl<T: ToDocument> ToDocument for BTreeMap<String, T> {
    fn to_document(&self) -> Document {
        Document::Mapping(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_document()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_objects_become_mappings() {
        let doc: Document = json!({"a": 1, "b": [true, "x"]}).into();
        match doc {
            Document::Mapping(entries) => {
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].0, "a");
                assert_eq!(entries[0].1, Document::Scalar(Scalar::Int(1)));
                assert!(matches!(entries[1].1, Document::Sequence(_)));
            }
            other => panic!("expected mapping, got {:?}", other),
        }
    }

    #[test]
    fn test_absent_fields_are_not_serialized() {
        let doc = Document::record()
            .field("title", &"init".to_string())
            .field("message", &None::<String>)
            .build();

        assert_eq!(doc.to_json(), json!({"title": "init"}));
        assert_eq!(serde_json::to_value(&doc).unwrap(), json!({"title": "init"}));
    }
}
