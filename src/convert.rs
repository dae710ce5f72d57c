use log::{debug, info};

use course_matrix::{build_matrix, CourseCatalog, MatrixErrors};
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

pub mod matrix_writer;
pub mod roster_reader;

pub use roster_reader::RosterSheet;

#[derive(Debug, Snafu)]
pub enum ConvertError {
    #[snafu(display("Course list not found at {path}: {source}. Provide a courses.txt file"))]
    CatalogNotFound {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("No course names found inside {path}"))]
    EmptyCatalog { path: String },
    #[snafu(display(
        "Could not open {path} as an .xlsx workbook: {source}. \
         If the file is a legacy .xls or a renamed export, re-save it as .xlsx and retry"
    ))]
    UnreadableWorkbook {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Workbook {path} has no worksheet"))]
    EmptyWorkbook { path: String },
    #[snafu(display("Input sheet missing required columns: {}", names.join(", ")))]
    MissingColumns { names: Vec<String> },
    #[snafu(display("Could not write the output workbook {path}: {source}"))]
    WriteFailure {
        source: rust_xlsxwriter::XlsxError,
        path: String,
    },
    #[snafu(display("Internal inconsistency while building the matrix: {source}"))]
    InternalInconsistency { source: MatrixErrors },
}

pub type ConvertResult<T> = Result<T, ConvertError>;

/// Loads the course catalog from a newline-delimited UTF-8 text file.
pub fn load_catalog(path: &Path) -> ConvertResult<CourseCatalog> {
    let contents = fs::read_to_string(path).context(CatalogNotFoundSnafu {
        path: path.display().to_string(),
    })?;
    let catalog = CourseCatalog::from_lines(contents.lines());
    ensure!(
        !catalog.is_empty(),
        EmptyCatalogSnafu {
            path: path.display().to_string(),
        }
    );
    debug!(
        "load_catalog: {} courses from {}",
        catalog.len(),
        path.display()
    );
    Ok(catalog)
}

/// Runs one full conversion: catalog, roster, matrix, output workbook.
///
/// The roster structure is validated before any data row is consumed, and
/// nothing is written to disk unless every earlier stage succeeded. Failures
/// from the stages propagate unwrapped so the caller can tell them apart.
pub fn convert(roster_path: &Path, courses_path: &Path) -> ConvertResult<PathBuf> {
    let catalog = load_catalog(courses_path)?;
    let sheet = RosterSheet::open(roster_path)?;

    // Rows naming a course outside the catalog never reach the builder.
    let records = sheet.records().filter(|r| {
        let keep = catalog.contains(&r.course);
        if !keep {
            debug!("convert: dropping row for unknown course {:?}", r.course);
        }
        keep
    });

    let matrix = build_matrix(records, &catalog).context(InternalInconsistencySnafu)?;
    info!(
        "convert: matrix has {} locations x {} courses",
        matrix.num_rows(),
        matrix.num_columns()
    );

    matrix_writer::write_matrix(&matrix, roster_path)
}
