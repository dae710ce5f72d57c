use chrono::{Local, NaiveDate};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_xlsxwriter::Workbook;
use snafu::prelude::*;

use std::path::{Path, PathBuf};

use course_matrix::{Matrix, MatrixCell};

use crate::convert::{ConvertResult, WriteFailureSnafu};

const SHEET_NAME: &str = "CourseAssignment";
const LOCATION_HEADER: &str = "Location";

const MIN_COLUMN_WIDTH: usize = 8;
const MAX_COLUMN_WIDTH: usize = 60;
const COLUMN_PADDING: usize = 2;

// A stem left behind by a previous conversion run, e.g. "251103-2342-".
static STAMP_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{6}-\d{4}-").unwrap());

/// Renders the matrix as a new workbook next to the input file and returns
/// the path written.
///
/// The workbook is assembled fully in memory and saved in one step, so a
/// failing run never leaves a partial file behind. The input workbook is
/// never touched.
pub fn write_matrix(matrix: &Matrix, roster_path: &Path) -> ConvertResult<PathBuf> {
    let stamp = Local::now().format("%y%m%d-%H%M").to_string();
    let destination = output_path(roster_path, &stamp);
    let path_s = destination.display().to_string();

    let mut workbook = build_workbook(matrix).context(WriteFailureSnafu {
        path: path_s.clone(),
    })?;
    workbook
        .save(&destination)
        .context(WriteFailureSnafu { path: path_s })?;

    info!(
        "write_matrix: wrote {} rows to {}",
        matrix.num_rows(),
        destination.display()
    );
    Ok(destination)
}

/// `<stamp>-<base>.xlsx` in the input's directory, where `<base>` is the
/// input stem with any previous conversion stamp stripped.
fn output_path(roster_path: &Path, stamp: &str) -> PathBuf {
    let stem = roster_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("roster");
    let mut base = stem;
    while let Some(m) = STAMP_PREFIX.find(base) {
        base = &base[m.end()..];
    }
    let dir = roster_path.parent().map(Path::to_path_buf).unwrap_or_default();
    let candidate = dir.join(format!("{}-{}.xlsx", stamp, base));
    // An input stamped in the current minute would map onto itself; keep its
    // old stamp in the base so the input file is never overwritten.
    if candidate == roster_path {
        return dir.join(format!("{}-{}.xlsx", stamp, stem));
    }
    candidate
}

fn build_workbook(matrix: &Matrix) -> Result<Workbook, rust_xlsxwriter::XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let mut widths: Vec<usize> = vec![0; matrix.num_columns() + 1];

    worksheet.write_string(0, 0, LOCATION_HEADER)?;
    widths[0] = LOCATION_HEADER.chars().count();
    for (idx, course) in matrix.courses().iter().enumerate() {
        worksheet.write_string(0, (idx + 1) as u16, course)?;
        widths[idx + 1] = course.chars().count();
    }

    for (row_idx, (location, cells)) in matrix.rows().enumerate() {
        let row = (row_idx + 1) as u32;
        worksheet.write_string(row, 0, location)?;
        widths[0] = widths[0].max(location.chars().count());
        for (col_idx, cell) in cells.iter().enumerate() {
            let rendered = render_cell(cell);
            widths[col_idx + 1] = widths[col_idx + 1].max(rendered.chars().count());
            worksheet.write_string(row, (col_idx + 1) as u16, rendered.as_str())?;
        }
    }

    // Grow each column to fit its longest text, within bounds.
    for (idx, width) in widths.iter().enumerate() {
        if *width == 0 {
            continue;
        }
        let target = (*width + COLUMN_PADDING).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
        worksheet.set_column_width(idx as u16, target as f64)?;
    }

    Ok(workbook)
}

/// One display string per cell: the date span first, then the status,
/// space-joined. Empty cells render as the empty string.
fn render_cell(cell: &MatrixCell) -> String {
    let span = match (cell.start_date, cell.end_date) {
        (Some(start), Some(end)) => format!("{} - {}", short_date(start), short_date(end)),
        (Some(start), None) => short_date(start),
        (None, Some(end)) => short_date(end),
        (None, None) => String::new(),
    };
    let pieces: Vec<&str> = [span.as_str(), cell.status.as_str()]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    pieces.join(" ")
}

fn short_date(date: NaiveDate) -> String {
    date.format("%y/%m/%d").to_string()
}
