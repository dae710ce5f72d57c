// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use chrono::NaiveDate;

/// The ordered list of course names that defines the columns of the matrix.
///
/// Duplicate names collapse to a single entry (first occurrence wins) and
/// surrounding whitespace is trimmed. The catalog is built once per run and
/// never mutated afterwards.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CourseCatalog {
    entries: Vec<String>,
}

impl CourseCatalog {
    /// Builds a catalog from raw text lines. Blank lines are skipped.
    pub fn from_lines<I, S>(lines: I) -> CourseCatalog
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries: Vec<String> = Vec::new();
        for line in lines {
            let name = line.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if entries.iter().any(|e| e == name) {
                continue;
            }
            entries.push(name.to_string());
        }
        CourseCatalog { entries }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact string equality, no case folding.
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub(crate) fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e == name)
    }
}

/// One validated row of the input roster.
///
/// Records with an empty location or course are rejected upstream and never
/// reach the builder.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RosterRecord {
    pub location: String,
    pub course: String,
    /// Free-form status text, e.g. "Active" or "Completed".
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

// ******** Output data structures *********

/// The aggregated state for one (location, course) pair.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct MatrixCell {
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// How many roster rows contributed to this cell, including the ones
    /// that lost the conflict resolution.
    pub record_count: u64,
}

impl MatrixCell {
    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}

/// The assignment matrix: one row per location (first-seen order from the
/// roster), one column per catalog course (catalog order).
///
/// Every row holds exactly one cell per catalog column; cells that no record
/// touched stay empty rather than being omitted.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Matrix {
    pub(crate) locations: Vec<String>,
    pub(crate) courses: Vec<String>,
    // cells[location_index][course_index]
    pub(crate) cells: Vec<Vec<MatrixCell>>,
}

impl Matrix {
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    pub fn courses(&self) -> &[String] {
        &self.courses
    }

    pub fn num_rows(&self) -> usize {
        self.locations.len()
    }

    pub fn num_columns(&self) -> usize {
        self.courses.len()
    }

    pub fn cell(&self, location_idx: usize, course_idx: usize) -> &MatrixCell {
        &self.cells[location_idx][course_idx]
    }

    /// Iterates the rows in matrix order: the location label and its cells
    /// in catalog column order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[MatrixCell])> {
        self.locations
            .iter()
            .zip(self.cells.iter())
            .map(|(loc, row)| (loc.as_str(), row.as_slice()))
    }
}

/// Errors that prevent the builder from completing successfully.
///
/// `CourseNotInCatalog` signals a broken upstream invariant (the reader is
/// expected to drop unmatched courses before they reach the builder), not a
/// user-fixable input problem.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum MatrixErrors {
    CourseNotInCatalog(String),
}

impl Error for MatrixErrors {}

impl Display for MatrixErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatrixErrors::CourseNotInCatalog(course) => {
                write!(f, "course {:?} is not part of the catalog", course)
            }
        }
    }
}
