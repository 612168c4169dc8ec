//! Catalog entities: assignments, their tests, students, and positions.

use crate::error::{ProgsnapError, ProgsnapResult};
use crate::props::Props;
use serde_json::Value;

/// One test case defined in an assignment's metadata file
#[derive(Debug, Clone, PartialEq)]
pub struct Test {
    number: i64,
    props: Props,
}

impl Test {
    /// Build a test from its record value, filling the optional flags
    ///
    /// # Errors
    ///
    /// Returns error if the value is not an object or lacks a numeric `number`
    pub fn from_value(value: Value) -> ProgsnapResult<Self> {
        let mut props = Props::from_value(value)?;
        let number = props.get_i64("number")?;
        props.bool_or_insert("opaque", false)?;
        props.bool_or_insert("invisible", false)?;
        Ok(Self { number, props })
    }

    /// Test number, used to order an assignment's tests
    #[must_use]
    pub fn number(&self) -> i64 {
        self.number
    }

    /// Whether the test's details are hidden from students (default false)
    #[must_use]
    pub fn opaque(&self) -> bool {
        self.props.get_bool("opaque").unwrap_or(false)
    }

    /// Whether the test is hidden entirely (default false)
    #[must_use]
    pub fn invisible(&self) -> bool {
        self.props.get_bool("invisible").unwrap_or(false)
    }

    /// All raw properties
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }
}

/// An assignment from `assignments.txt`, merged with its own metadata file
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    number: i64,
    path: String,
    props: Props,
    tests: Vec<Test>,
}

impl Assignment {
    /// Build an assignment from its catalog record; tests start empty
    ///
    /// # Errors
    ///
    /// Returns error if the value is not an object or lacks `number` or `path`
    pub fn from_value(value: Value) -> ProgsnapResult<Self> {
        let props = Props::from_value(value)?;
        let number = props.get_i64("number")?;
        let path = props.get_str("path")?.to_string();
        Ok(Self {
            number,
            path,
            props,
            tests: Vec::new(),
        })
    }

    /// Assignment number
    #[must_use]
    pub fn number(&self) -> i64 {
        self.number
    }

    /// Path of the metadata file inside the dataset
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Assignment name
    ///
    /// # Errors
    ///
    /// Returns error if the metadata file did not provide it
    pub fn name(&self) -> ProgsnapResult<&str> {
        self.props.get_str("name")
    }

    /// Programming language
    ///
    /// # Errors
    ///
    /// Returns error if the metadata file did not provide it
    pub fn language(&self) -> ProgsnapResult<&str> {
        self.props.get_str("language")
    }

    /// Assignment URL
    ///
    /// # Errors
    ///
    /// Returns error if the metadata file did not provide it
    pub fn url(&self) -> ProgsnapResult<&str> {
        self.props.get_str("url")
    }

    /// When the assignment was handed out, as logged
    ///
    /// # Errors
    ///
    /// Returns error if the metadata file did not provide it
    pub fn assigned(&self) -> ProgsnapResult<&Value> {
        self.props.get("assigned")
    }

    /// When the assignment was due, as logged
    ///
    /// # Errors
    ///
    /// Returns error if the metadata file did not provide it
    pub fn due(&self) -> ProgsnapResult<&Value> {
        self.props.get("due")
    }

    /// Tests, ordered by test number once loading finishes
    #[must_use]
    pub fn tests(&self) -> &[Test] {
        &self.tests
    }

    /// All raw properties
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Record a metadata property read from the assignment file
    pub fn set_prop(&mut self, name: impl Into<String>, value: Value) {
        self.props.set(name, value);
    }

    /// Append a test read from the assignment file
    pub fn push_test(&mut self, test: Test) {
        self.tests.push(test);
    }

    /// Order tests by test number; ties keep file order
    pub fn sort_tests(&mut self) {
        self.tests.sort_by_key(Test::number);
    }
}

/// A student from the roster, or synthesized from a history file name
#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    number: i64,
    props: Props,
}

impl Student {
    /// Build a student from a roster record
    ///
    /// # Errors
    ///
    /// Returns error if the value is not an object or lacks a numeric `number`
    pub fn from_value(value: Value) -> ProgsnapResult<Self> {
        let props = Props::from_value(value)?;
        let number = props.get_i64("number")?;
        Ok(Self { number, props })
    }

    /// Placeholder for a student known only from a history file name
    #[must_use]
    pub fn synthesized(number: i64) -> Self {
        let mut props = Props::new();
        props.set("number", Value::from(number));
        props.set("instructor", Value::Bool(false));
        Self { number, props }
    }

    /// Student number
    #[must_use]
    pub fn number(&self) -> i64 {
        self.number
    }

    /// Whether this account belongs to an instructor
    ///
    /// # Errors
    ///
    /// Returns error if the roster record lacks a boolean `instructor`
    pub fn instructor(&self) -> ProgsnapResult<bool> {
        self.props.get_bool("instructor")
    }

    /// All raw properties
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }
}

/// Zero-based row/column of an insert or delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    /// Line index
    pub row: usize,
    /// Character offset within the line
    pub col: usize,
}

impl Position {
    /// Create a position
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Promote a `{row, col}` property bag
    ///
    /// # Errors
    ///
    /// Returns error if either coordinate is missing or negative
    pub fn from_props(props: &Props) -> ProgsnapResult<Self> {
        Ok(Self {
            row: coordinate(props, "row")?,
            col: coordinate(props, "col")?,
        })
    }
}

fn coordinate(props: &Props, name: &str) -> ProgsnapResult<usize> {
    usize::try_from(props.get_i64(name)?).map_err(|_| ProgsnapError::WrongType {
        name: name.to_string(),
        expected: "a non-negative integer",
    })
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.row, self.col)
    }
}
