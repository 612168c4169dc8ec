//! Loading an assignment's own metadata file.
//!
//! Each `assignment` record in `assignments.txt` names a second tagged-record
//! file holding the assignment's descriptive properties and its tests.

use progsnap_core::{Assignment, ProgsnapResult, Test};
use progsnap_log::{TagHandler, scan};
use progsnap_storage::Storage;
use serde_json::Value;

/// Tags in an assignment file that set assignment properties
pub const ASSIGNMENT_PROPERTY_TAGS: [&str; 5] = ["name", "language", "url", "assigned", "due"];

/// Tag in an assignment file that defines one test
pub const TEST_TAG: &str = "test";

/// Build an assignment from its catalog record and read its metadata file
///
/// # Errors
///
/// Returns error if the record is malformed, the metadata file is missing,
/// or any line of it is invalid
pub fn load_assignment(storage: &dyn Storage, value: Value) -> ProgsnapResult<Assignment> {
    let mut assignment = Assignment::from_value(value)?;

    let mut props = Vec::new();
    let mut tests = Vec::new();
    {
        let mut handler = TagHandler::new();
        handler.register_many(&ASSIGNMENT_PROPERTY_TAGS, |tag, value| {
            props.push((tag.to_string(), value));
            Ok(())
        });
        handler.register(TEST_TAG, |_, value| {
            tests.push(Test::from_value(value)?);
            Ok(())
        });
        scan(storage.open(assignment.path())?, &mut handler)
            .map_err(|e| e.in_file(assignment.path()))?;
    }

    for (name, value) in props {
        assignment.set_prop(name, value);
    }
    for test in tests {
        assignment.push_test(test);
    }
    assignment.sort_tests();

    tracing::debug!(
        assignment = assignment.number(),
        path = assignment.path(),
        tests = assignment.tests().len(),
        "loaded assignment"
    );
    Ok(assignment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use progsnap_core::ProgsnapError;
    use progsnap_storage::DirectoryStorage;
    use serde_json::json;

    fn storage_with(files: &[(&str, &str)]) -> (tempfile::TempDir, DirectoryStorage) {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in files {
            std::fs::write(dir.path().join(name), body).unwrap();
        }
        let storage = DirectoryStorage::new(dir.path());
        (dir, storage)
    }

    #[test]
    fn test_load_assignment_reads_metadata() {
        let body = [
            r#"{"tag":"name","value":"Fizzbuzz"}"#,
            r#"{"tag":"language","value":"Python"}"#,
            r#"{"tag":"test","value":{"number":3,"name":"c"}}"#,
            r#"{"tag":"test","value":{"number":1,"name":"a","opaque":true}}"#,
            r#"{"tag":"comment","value":"ignored"}"#,
            r#"{"tag":"test","value":{"number":2,"name":"b"}}"#,
        ]
        .join("\n");
        let (_dir, storage) = storage_with(&[("assign7.txt", &body)]);

        let a = load_assignment(&storage, json!({"number": 7, "path": "assign7.txt"})).unwrap();
        assert_eq!(a.number(), 7);
        assert_eq!(a.name().unwrap(), "Fizzbuzz");
        assert_eq!(a.language().unwrap(), "Python");
        assert!(a.url().is_err());
        let numbers: Vec<i64> = a.tests().iter().map(Test::number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(a.tests()[0].opaque());
        assert!(!a.tests()[1].opaque());
    }

    #[test]
    fn test_load_assignment_missing_file() {
        let (_dir, storage) = storage_with(&[]);
        let err = load_assignment(&storage, json!({"number": 1, "path": "gone.txt"})).unwrap_err();
        assert!(matches!(err, ProgsnapError::NotFound { .. }));
    }

    #[test]
    fn test_load_assignment_bad_test_record() {
        let (_dir, storage) =
            storage_with(&[("a.txt", r#"{"tag":"test","value":{"name":"no number"}}"#)]);
        let err = load_assignment(&storage, json!({"number": 1, "path": "a.txt"})).unwrap_err();
        assert_eq!(
            err,
            ProgsnapError::MissingProperty {
                name: "number".to_string()
            }
            .in_record(1)
            .in_file("a.txt")
        );
        assert_eq!(err.to_string(), "a.txt: Record at line 1: No such property: number");
    }
}
