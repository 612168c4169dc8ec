//! Work history: one student's event log for one assignment.

use crate::order::sort_events;
use once_cell::sync::OnceCell;
use progsnap_core::{
    Compilation, Edit, Event, ProgsnapError, ProgsnapResult, SnapshotId, Submission, TestResults,
};
use progsnap_log::{TagHandler, scan};
use progsnap_storage::Storage;
use std::sync::Arc;

/// Events of one (student, assignment) pair, read from a single history
/// file the first time they are needed
pub struct WorkHistory {
    storage: Arc<dyn Storage>,
    assign_num: i64,
    student_num: i64,
    path: String,
    sort: bool,
    events: OnceCell<Vec<Event>>,
}

impl WorkHistory {
    /// Create an unloaded work history backed by `path`
    pub fn new(
        storage: Arc<dyn Storage>,
        assign_num: i64,
        student_num: i64,
        path: impl Into<String>,
        sort: bool,
    ) -> Self {
        Self {
            storage,
            assign_num,
            student_num,
            path: path.into(),
            sort,
            events: OnceCell::new(),
        }
    }

    /// Assignment number
    #[must_use]
    pub fn assign_num(&self) -> i64 {
        self.assign_num
    }

    /// Student number
    #[must_use]
    pub fn student_num(&self) -> i64 {
        self.student_num
    }

    /// Backing file path inside the dataset
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the events have been read yet
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.events.get().is_some()
    }

    /// All events, loading them on first call
    ///
    /// # Errors
    ///
    /// Returns error if the history file cannot be read or holds a
    /// malformed record. A failed load is retried on the next call.
    pub fn events(&self) -> ProgsnapResult<&[Event]> {
        self.events.get_or_try_init(|| self.load()).map(Vec::as_slice)
    }

    fn load(&self) -> ProgsnapResult<Vec<Event>> {
        let mut events = Vec::new();
        {
            let mut handler = TagHandler::new();
            handler.register_many(&Event::TAGS, |tag, value| {
                if let Some(event) = Event::from_record(tag, value)? {
                    events.push(event);
                }
                Ok(())
            });
            scan(self.storage.open(&self.path)?, &mut handler)
                .map_err(|e| e.in_file(self.path.as_str()))?;
        }
        if self.sort {
            sort_events(&mut events);
        }
        tracing::debug!(
            assignment = self.assign_num,
            student = self.student_num,
            events = events.len(),
            sorted = self.sort,
            "loaded work history"
        );
        Ok(events)
    }

    /// Every edit listing `snapid`, in sequence order
    ///
    /// # Errors
    ///
    /// Returns error if the events cannot be loaded
    pub fn find_edit_events_with_snapid(&self, snapid: &SnapshotId) -> ProgsnapResult<Vec<&Edit>> {
        Ok(self
            .events()?
            .iter()
            .filter_map(Event::as_edit)
            .filter(|edit| edit.has_snapid(snapid))
            .collect())
    }

    /// The one edit listing `snapid`, or `None` if there is none
    ///
    /// # Errors
    ///
    /// Returns `AmbiguousLookup` if several edits list it, which happens
    /// when an assignment has more than one source file
    pub fn find_single_edit_event_with_snapid(
        &self,
        snapid: &SnapshotId,
    ) -> ProgsnapResult<Option<&Edit>> {
        let mut matches = self.find_edit_events_with_snapid(snapid)?;
        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            count => Err(ProgsnapError::AmbiguousLookup {
                snapid: snapid.to_string(),
                count,
            }),
        }
    }

    /// First submission for `snapid`
    ///
    /// # Errors
    ///
    /// Returns error if the events cannot be loaded or a submission has a
    /// malformed `snapid`
    pub fn find_submission_event(&self, snapid: &SnapshotId) -> ProgsnapResult<Option<&Submission>> {
        self.find_first(snapid, |event| match event {
            Event::Submission(e) => Some((e, e.snapid())),
            _ => None,
        })
    }

    /// First compilation for `snapid`
    ///
    /// # Errors
    ///
    /// Returns error if the events cannot be loaded or a compilation has a
    /// malformed `snapid`
    pub fn find_compilation_event(
        &self,
        snapid: &SnapshotId,
    ) -> ProgsnapResult<Option<&Compilation>> {
        self.find_first(snapid, |event| match event {
            Event::Compilation(e) => Some((e, e.snapid())),
            _ => None,
        })
    }

    /// First test results for `snapid`
    ///
    /// # Errors
    ///
    /// Returns error if the events cannot be loaded or a test result has a
    /// malformed `snapid`
    pub fn find_testresults_event(
        &self,
        snapid: &SnapshotId,
    ) -> ProgsnapResult<Option<&TestResults>> {
        self.find_first(snapid, |event| match event {
            Event::TestResults(e) => Some((e, e.snapid())),
            _ => None,
        })
    }

    fn find_first<'a, T, F>(&'a self, snapid: &SnapshotId, select: F) -> ProgsnapResult<Option<&'a T>>
    where
        F: Fn(&'a Event) -> Option<(&'a T, ProgsnapResult<SnapshotId>)>,
    {
        for event in self.events()? {
            if let Some((found, id)) = select(event) {
                if &id? == snapid {
                    return Ok(Some(found));
                }
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for WorkHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkHistory")
            .field("assign_num", &self.assign_num)
            .field("student_num", &self.student_num)
            .field("path", &self.path)
            .field("sort", &self.sort)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use progsnap_storage::DirectoryStorage;

    fn history(lines: &[&str], sort: bool) -> (tempfile::TempDir, WorkHistory) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("h.txt"), lines.join("\n")).unwrap();
        let storage: Arc<dyn Storage> = Arc::new(DirectoryStorage::new(dir.path()));
        (dir, WorkHistory::new(storage, 1, 2, "h.txt", sort))
    }

    const SAMPLE: [&str; 7] = [
        r#"{"tag":"edit","value":{"ts":100,"editid":5,"type":"fulltext","text":"b","snapids":["s1"]}}"#,
        r#"{"tag":"edit","value":{"ts":200,"editid":2,"type":"fulltext","text":"a","snapids":["s1","s2"]}}"#,
        r#"{"tag":"submission","value":{"ts":300,"snapid":"s2"}}"#,
        r#"{"tag":"compilation","value":{"ts":310,"snapid":"s2","success":true}}"#,
        r#"{"tag":"testresults","value":{"ts":320,"snapid":"s2","statuses":["passed"]}}"#,
        r#"{"tag":"chat","value":{"ts":330}}"#,
        r#"{"tag":"compilation","value":{"ts":340,"snapid":"s3","success":false}}"#,
    ];

    #[test]
    fn test_lazy_load() {
        let (_dir, wh) = history(&SAMPLE, false);
        assert!(!wh.is_loaded());
        assert_eq!(wh.events().unwrap().len(), 6);
        assert!(wh.is_loaded());
        assert_eq!(wh.assign_num(), 1);
        assert_eq!(wh.student_num(), 2);
    }

    #[test]
    fn test_file_order_kept_without_sort() {
        let (_dir, wh) = history(&SAMPLE, false);
        let ids: Vec<Option<i64>> = wh.events().unwrap().iter().map(Event::editid).collect();
        assert_eq!(ids[..2], [Some(5), Some(2)]);
    }

    #[test]
    fn test_sorted_by_editid() {
        let (_dir, wh) = history(&SAMPLE, true);
        let ids: Vec<Option<i64>> = wh.events().unwrap().iter().map(Event::editid).collect();
        assert_eq!(ids[..2], [Some(2), Some(5)]);
    }

    #[test]
    fn test_find_edits_with_snapid() {
        let (_dir, wh) = history(&SAMPLE, false);
        let s1 = wh.find_edit_events_with_snapid(&SnapshotId::from("s1")).unwrap();
        assert_eq!(s1.len(), 2);
        assert_eq!(s1[0].editid(), Some(5));
    }

    #[test]
    fn test_find_single_edit() {
        let (_dir, wh) = history(&SAMPLE, false);
        let err = wh
            .find_single_edit_event_with_snapid(&SnapshotId::from("s1"))
            .unwrap_err();
        assert_eq!(
            err,
            ProgsnapError::AmbiguousLookup {
                snapid: "s1".to_string(),
                count: 2
            }
        );
        let one = wh
            .find_single_edit_event_with_snapid(&SnapshotId::from("s2"))
            .unwrap()
            .unwrap();
        assert_eq!(one.editid(), Some(2));
        assert!(
            wh.find_single_edit_event_with_snapid(&SnapshotId::from("zz"))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_find_snapshot_events() {
        let (_dir, wh) = history(&SAMPLE, false);
        let s2 = SnapshotId::from("s2");
        assert_eq!(wh.find_submission_event(&s2).unwrap().unwrap().ts().as_i64(), 300);
        assert_eq!(wh.find_compilation_event(&s2).unwrap().unwrap().ts().as_i64(), 310);
        assert_eq!(wh.find_testresults_event(&s2).unwrap().unwrap().ts().as_i64(), 320);

        let s3 = SnapshotId::from("s3");
        assert!(wh.find_submission_event(&s3).unwrap().is_none());
        assert_eq!(wh.find_compilation_event(&s3).unwrap().unwrap().ts().as_i64(), 340);
    }

    #[test]
    fn test_malformed_history_reports_line() {
        let (_dir, wh) = history(&[SAMPLE[0], "{not json"], false);
        let err = wh.events().unwrap_err();
        assert!(matches!(err.root(), ProgsnapError::MalformedRecord { line: 2, .. }));
        assert!(err.to_string().starts_with("h.txt: Invalid data at line 2"));
        assert!(!wh.is_loaded());
    }

    #[test]
    fn test_bad_timestamp_names_file_and_line() {
        let bad = r#"{"tag":"submission","value":{"ts":"yesterday","snapid":"s9"}}"#;
        let (_dir, wh) = history(&[SAMPLE[0], SAMPLE[1], bad], false);
        let err = wh.events().unwrap_err();
        match &err {
            ProgsnapError::InFile { path, error } => {
                assert_eq!(path, "h.txt");
                assert!(matches!(
                    &**error,
                    ProgsnapError::InRecord { line: 3, error }
                        if matches!(&**error, ProgsnapError::InvalidTimestamp { .. })
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(DirectoryStorage::new(dir.path()));
        let wh = WorkHistory::new(storage, 1, 1, "history/1/1.txt", false);
        assert!(matches!(wh.events(), Err(ProgsnapError::NotFound { .. })));
    }
}
