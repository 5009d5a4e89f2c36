use super::Document;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("invalid selection path: {0}")]
    InvalidPath(String),
    #[error("invalid index value: {0}")]
    InvalidIndex(String),
}

/// Resolve a case-insensitive, dot-separated path against a document.
///
/// Each segment selects a record field by name, a sequence element by
///  non-negative index, or a mapping entry by key. Names and keys match
///  case-insensitively and the first match in declaration or insertion
///  order wins. An empty path selects the whole document.
pub fn resolve<'a>(document: &'a Document, path: &str) -> Result<&'a Document, PathError> {
    if path.is_empty() {
        return Ok(document);
    }

    let invalid_path = || PathError::InvalidPath(path.to_string());
    let mut current = document;

    for segment in path.split('.') {
        current = match current {
            Document::Record(fields) | Document::Mapping(fields) => fields
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(segment))
                .map(|(_, value)| value)
                .ok_or_else(invalid_path)?,
            Document::Sequence(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index))
                .ok_or_else(|| PathError::InvalidIndex(segment.to_string()))?,
            Document::Scalar(_) | Document::Absent => return Err(invalid_path()),
        };

        if current.is_absent() {
            return Err(invalid_path());
        }
    }

    Ok(current)
}

/// Resolve a path and render the located value as JSON.
pub fn select(document: &Document, path: &str) -> Result<serde_json::Value, PathError> {
    resolve(document, path).map(Document::to_json)
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::document::{Scalar, ToDocument};

    fn scenario() -> Document {
        json!({
            "commit": {"title": "init", "timestamp": "2020-01-01"},
            "tags": ["a", "b"],
        })
        .into()
    }

    fn string(s: &str) -> Document {
        Document::Scalar(Scalar::String(s.to_string()))
    }

    #[test]
    fn test_empty_path_returns_whole_document() {
        let doc = scenario();
        assert_eq!(resolve(&doc, "").unwrap(), &doc);
    }

    #[test]
    fn test_nested_field_selection() {
        let doc = scenario();
        assert_eq!(resolve(&doc, "commit.title").unwrap(), &string("init"));
        assert_eq!(
            resolve(&doc, "commit.timestamp").unwrap(),
            &string("2020-01-01")
        );
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let doc = scenario();
        assert_eq!(
            resolve(&doc, "Commit.Title").unwrap(),
            resolve(&doc, "commit.title").unwrap()
        );
        assert_eq!(resolve(&doc, "COMMIT.TITLE").unwrap(), &string("init"));
    }

    #[test]
    fn test_missing_key_is_invalid_path_with_full_path() {
        let doc = scenario();
        assert_eq!(
            resolve(&doc, "commit.missing"),
            Err(PathError::InvalidPath("commit.missing".to_string()))
        );
    }

    #[test]
    fn test_sequence_indexing() {
        let doc = scenario();
        assert_eq!(resolve(&doc, "tags.0").unwrap(), &string("a"));
        assert_eq!(resolve(&doc, "tags.1").unwrap(), &string("b"));
    }

    #[test]
    fn test_bad_indices_are_invalid_index() {
        let doc = scenario();
        assert_eq!(
            resolve(&doc, "tags.5"),
            Err(PathError::InvalidIndex("5".to_string()))
        );
        assert_eq!(
            resolve(&doc, "tags.first"),
            Err(PathError::InvalidIndex("first".to_string()))
        );
        assert_eq!(
            resolve(&doc, "tags.-1"),
            Err(PathError::InvalidIndex("-1".to_string()))
        );
    }

    #[test]
    fn test_descending_into_scalar_fails() {
        let doc = scenario();
        assert_eq!(
            resolve(&doc, "commit.title.length"),
            Err(PathError::InvalidPath("commit.title.length".to_string()))
        );
    }

    #[test]
    fn test_absent_values_are_invalid_path() {
        let doc = Document::record()
            .field("title", &"init".to_string())
            .field("message", &None::<String>)
            .build();

        assert_eq!(
            resolve(&doc, "message"),
            Err(PathError::InvalidPath("message".to_string()))
        );
        assert_eq!(
            resolve(&Document::Absent, "anything"),
            Err(PathError::InvalidPath("anything".to_string()))
        );
    }

    #[test]
    fn test_record_fields_match_by_name() {
        let doc = Document::record()
            .field("Title", &"first".to_string())
            .field("tags", &vec!["x".to_string()])
            .build();

        assert_eq!(resolve(&doc, "title").unwrap(), &string("first"));
        assert_eq!(resolve(&doc, "TAGS.0").unwrap(), &string("x"));
        assert_eq!(
            resolve(&doc, "nope"),
            Err(PathError::InvalidPath("nope".to_string()))
        );
    }

    // Names that collide after case folding resolve to the first one
    //  in declaration order.
    #[test]
    fn test_case_fold_collisions_pick_first_match() {
        let record = Document::Record(vec![
            ("Name".to_string(), string("upper")),
            ("name".to_string(), string("lower")),
        ]);
        assert_eq!(resolve(&record, "NAME").unwrap(), &string("upper"));

        let mapping = Document::Mapping(vec![
            ("KEY".to_string(), string("first")),
            ("key".to_string(), string("second")),
        ]);
        assert_eq!(resolve(&mapping, "key").unwrap(), &string("first"));
    }

    #[test]
    fn test_json_collisions_follow_source_order() {
        // sorted key order would put "Zeta" first
        let doc = Document::from(json!({"zeta": 1, "Zeta": 2}));
        assert_eq!(select(&doc, "ZETA").unwrap(), json!(1));
    }

    #[test]
    fn test_empty_segments_do_not_match() {
        let doc = scenario();
        assert!(resolve(&doc, "commit..title").is_err());
        assert!(resolve(&doc, ".").is_err());
    }

    #[test]
    fn test_select_renders_json() {
        let doc = scenario();
        assert_eq!(
            select(&doc, "commit").unwrap(),
            json!({"title": "init", "timestamp": "2020-01-01"})
        );
        assert_eq!(select(&doc, "tags").unwrap(), json!(["a", "b"]));

        let record = vec![1_i64, 2].to_document();
        assert_eq!(select(&record, "1").unwrap(), json!(2));
    }
}
