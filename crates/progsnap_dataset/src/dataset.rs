//! Dataset aggregate.
//!
//! Loading reads `dataset.txt`, `assignments.txt` (and each assignment's own
//! file), the optional `students.txt`, then discovers work histories under
//! `history/<assignment>/<student>.txt`. Every step fails fast. Work
//! histories are registered but not read.

use crate::assignment::load_assignment;
use crate::config::DatasetConfig;
use crate::history::WorkHistory;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use progsnap_core::{Assignment, Props, ProgsnapError, ProgsnapResult, Student};
use progsnap_log::{TagHandler, scan};
use progsnap_storage::{Storage, join, open_storage};
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Dataset metadata file
pub const DATASET_FILE: &str = "dataset.txt";
/// Assignment catalog
pub const ASSIGNMENTS_FILE: &str = "assignments.txt";
/// Optional student roster
pub const STUDENTS_FILE: &str = "students.txt";
/// Root of the work-history tree
pub const HISTORY_DIR: &str = "history";

/// Tags accepted in `dataset.txt`
pub const DATASET_TAGS: [&str; 5] = ["psversion", "name", "contact", "email", "courseurl"];

static ASSIGNMENT_DIR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)$").expect("valid regex"));
static HISTORY_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\.txt$").expect("valid regex"));

/// Dataset-level properties from `dataset.txt`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetInfo {
    props: Props,
}

impl DatasetInfo {
    /// Progsnap format version
    ///
    /// # Errors
    ///
    /// Returns `MissingProperty` if the dataset did not declare one
    pub fn psversion(&self) -> ProgsnapResult<&Value> {
        self.props.get("psversion")
    }

    /// Dataset name
    ///
    /// # Errors
    ///
    /// Returns error if absent or not a string
    pub fn name(&self) -> ProgsnapResult<&str> {
        self.props.get_str("name")
    }

    /// Contact person
    ///
    /// # Errors
    ///
    /// Returns error if absent or not a string
    pub fn contact(&self) -> ProgsnapResult<&str> {
        self.props.get_str("contact")
    }

    /// Contact email
    ///
    /// # Errors
    ///
    /// Returns error if absent or not a string
    pub fn email(&self) -> ProgsnapResult<&str> {
        self.props.get_str("email")
    }

    /// Course web page
    ///
    /// # Errors
    ///
    /// Returns error if absent or not a string
    pub fn courseurl(&self) -> ProgsnapResult<&str> {
        self.props.get_str("courseurl")
    }

    /// All dataset properties
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }
}

/// A loaded progsnap dataset
pub struct Dataset {
    storage: Arc<dyn Storage>,
    config: DatasetConfig,
    info: DatasetInfo,
    assignments: IndexMap<i64, Assignment>,
    students: IndexMap<i64, Student>,
    histories: Vec<WorkHistory>,
    by_assignment: IndexMap<i64, Vec<usize>>,
    by_student: IndexMap<i64, Vec<usize>>,
}

impl Dataset {
    /// Open a dataset directory or zip archive
    ///
    /// # Errors
    ///
    /// Returns error if the path does not exist or any dataset file is
    /// missing or malformed
    pub fn open(path: &Path, config: DatasetConfig) -> ProgsnapResult<Self> {
        let storage = open_storage(path)?;
        Self::from_storage(storage, config)
    }

    /// Load a dataset from an already opened container
    ///
    /// # Errors
    ///
    /// Returns error if any dataset file is missing or malformed
    pub fn from_storage(storage: Arc<dyn Storage>, config: DatasetConfig) -> ProgsnapResult<Self> {
        let mut dataset = Self {
            storage,
            config,
            info: DatasetInfo::default(),
            assignments: IndexMap::new(),
            students: IndexMap::new(),
            histories: Vec::new(),
            by_assignment: IndexMap::new(),
            by_student: IndexMap::new(),
        };
        dataset.read_info()?;
        dataset.read_assignments()?;
        dataset.read_students()?;
        dataset.discover_histories()?;

        tracing::info!(
            dataset = %dataset.storage.describe(),
            assignments = dataset.assignments.len(),
            students = dataset.students.len(),
            work_histories = dataset.histories.len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    fn read_info(&mut self) -> ProgsnapResult<()> {
        let props = &mut self.info.props;
        let mut handler = TagHandler::new();
        handler.register_many(&DATASET_TAGS, |tag, value| {
            props.set(tag, value);
            Ok(())
        });
        scan(self.storage.open(DATASET_FILE)?, &mut handler).map_err(|e| e.in_file(DATASET_FILE))?;
        Ok(())
    }

    fn read_assignments(&mut self) -> ProgsnapResult<()> {
        let storage = self.storage.as_ref();
        let assignments = &mut self.assignments;
        let mut handler = TagHandler::new();
        handler.register("assignment", |_, value| {
            let assignment = load_assignment(storage, value)?;
            assignments.insert(assignment.number(), assignment);
            Ok(())
        });
        scan(storage.open(ASSIGNMENTS_FILE)?, &mut handler).map_err(|e| e.in_file(ASSIGNMENTS_FILE))?;
        Ok(())
    }

    fn read_students(&mut self) -> ProgsnapResult<()> {
        if !self.storage.is_file(STUDENTS_FILE) {
            tracing::debug!("no student roster");
            return Ok(());
        }
        let students = &mut self.students;
        let mut handler = TagHandler::new();
        handler.register("student", |_, value| {
            let student = Student::from_value(value)?;
            students.insert(student.number(), student);
            Ok(())
        });
        scan(self.storage.open(STUDENTS_FILE)?, &mut handler).map_err(|e| e.in_file(STUDENTS_FILE))?;
        Ok(())
    }

    fn discover_histories(&mut self) -> ProgsnapResult<()> {
        if !self.storage.is_dir(HISTORY_DIR) {
            tracing::debug!("no history directory");
            return Ok(());
        }

        let mut assign_dirs = Vec::new();
        for name in self.storage.list(HISTORY_DIR)? {
            let path = join(HISTORY_DIR, &name);
            match parse_number(&ASSIGNMENT_DIR, &name) {
                Some(number) if self.storage.is_dir(&path) => assign_dirs.push((number, path)),
                _ => tracing::warn!(entry = %path, "ignoring history entry"),
            }
        }
        assign_dirs.sort_by_key(|(number, _)| *number);

        for (assign_num, dir) in assign_dirs {
            let mut files = Vec::new();
            for name in self.storage.list(&dir)? {
                let path = join(&dir, &name);
                match parse_number(&HISTORY_FILE, &name) {
                    Some(number) if self.storage.is_file(&path) => files.push((number, path)),
                    _ => tracing::warn!(entry = %path, "ignoring history entry"),
                }
            }
            files.sort_by_key(|(number, _)| *number);

            for (student_num, path) in files {
                self.register_history(assign_num, student_num, path);
            }
        }
        Ok(())
    }

    fn register_history(&mut self, assign_num: i64, student_num: i64, path: String) {
        if !self.students.contains_key(&student_num) {
            tracing::debug!(student = student_num, "synthesizing student without roster entry");
            self.students
                .insert(student_num, Student::synthesized(student_num));
        }
        tracing::debug!(
            assignment = assign_num,
            student = student_num,
            path = %path,
            "found work history"
        );

        let index = self.histories.len();
        self.histories.push(WorkHistory::new(
            Arc::clone(&self.storage),
            assign_num,
            student_num,
            path,
            self.config.sort_work_history,
        ));
        self.by_assignment.entry(assign_num).or_default().push(index);
        self.by_student.entry(student_num).or_default().push(index);
    }

    /// Options the dataset was opened with
    #[must_use]
    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Dataset-level properties
    #[must_use]
    pub fn info(&self) -> &DatasetInfo {
        &self.info
    }

    /// Underlying container
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Assignments in catalog order
    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.values()
    }

    /// Look up an assignment by number
    ///
    /// # Errors
    ///
    /// Returns `UnknownAssignment` if no assignment has that number
    pub fn assignment(&self, number: i64) -> ProgsnapResult<&Assignment> {
        self.assignments
            .get(&number)
            .ok_or(ProgsnapError::UnknownAssignment { number })
    }

    /// Students in roster order, followed by those synthesized from
    /// history file names
    pub fn students(&self) -> impl Iterator<Item = &Student> {
        self.students.values()
    }

    /// Look up a student by number
    ///
    /// # Errors
    ///
    /// Returns `UnknownStudent` if no student has that number
    pub fn student(&self, number: i64) -> ProgsnapResult<&Student> {
        self.students
            .get(&number)
            .ok_or(ProgsnapError::UnknownStudent { number })
    }

    /// All work histories, by assignment then student number
    #[must_use]
    pub fn work_histories(&self) -> &[WorkHistory] {
        &self.histories
    }

    /// Work histories for an assignment number; empty if there are none
    #[must_use]
    pub fn work_histories_for_assignment(&self, assign_num: i64) -> Vec<&WorkHistory> {
        self.collect(self.by_assignment.get(&assign_num))
    }

    /// Work histories for a student number; empty if there are none
    #[must_use]
    pub fn work_histories_for_student(&self, student_num: i64) -> Vec<&WorkHistory> {
        self.collect(self.by_student.get(&student_num))
    }

    /// The work history of one student on one assignment
    ///
    /// # Errors
    ///
    /// Returns `NoSuchWorkHistory` if the student has no history file for
    /// the assignment
    pub fn work_history(&self, student_num: i64, assign_num: i64) -> ProgsnapResult<&WorkHistory> {
        self.work_histories_for_student(student_num)
            .into_iter()
            .find(|wh| wh.assign_num() == assign_num)
            .ok_or(ProgsnapError::NoSuchWorkHistory {
                student: student_num,
                assignment: assign_num,
            })
    }

    fn collect(&self, indices: Option<&Vec<usize>>) -> Vec<&WorkHistory> {
        indices
            .map(|indices| indices.iter().map(|&i| &self.histories[i]).collect())
            .unwrap_or_default()
    }
}

fn parse_number(pattern: &Regex, name: &str) -> Option<i64> {
    let digits = pattern.captures(name)?.get(1)?;
    match digits.as_str().parse() {
        Ok(number) => Some(number),
        Err(_) => {
            tracing::warn!(entry = name, "number out of range");
            None
        }
    }
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("storage", &self.storage.describe())
            .field("config", &self.config)
            .field("assignments", &self.assignments.len())
            .field("students", &self.students.len())
            .field("work_histories", &self.histories.len())
            .finish()
    }
}
