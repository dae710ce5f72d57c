use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use chrono::{Duration, NaiveDate};
use log::debug;
use snafu::prelude::*;

use std::collections::HashMap;
use std::path::Path;

use course_matrix::RosterRecord;

use crate::convert::{
    ConvertResult, EmptyWorkbookSnafu, MissingColumnsSnafu, UnreadableWorkbookSnafu,
};

/// The headers a roster sheet must carry, in reporting order. Lookup is by
/// name (case- and whitespace-insensitive), so the column order in the file
/// does not matter.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "LocName",
    "Course Name",
    "JobStatus",
    "Start Date",
    "End Date",
];

#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    location: usize,
    course: usize,
    status: usize,
    start: usize,
    end: usize,
}

/// The first worksheet of a roster workbook, with its required columns
/// already located.
///
/// The sheet range is held in memory, so [`RosterSheet::records`] can be
/// invoked any number of times and always restarts from the top.
#[derive(Debug)]
pub struct RosterSheet {
    range: Range<DataType>,
    columns: ColumnMap,
}

impl RosterSheet {
    /// Opens the workbook and validates its structure before any data row
    /// is consumed.
    pub fn open(path: &Path) -> ConvertResult<RosterSheet> {
        let path_s = path.display().to_string();
        let mut workbook: Xlsx<_> = open_workbook(path).context(UnreadableWorkbookSnafu {
            path: path_s.clone(),
        })?;
        let range = workbook
            .worksheet_range_at(0)
            .context(EmptyWorkbookSnafu {
                path: path_s.clone(),
            })?
            .context(UnreadableWorkbookSnafu { path: path_s })?;

        let header: Vec<Option<String>> = match range.rows().next() {
            Some(row) => row
                .iter()
                .map(|cell| match cell {
                    DataType::String(s) => Some(s.clone()),
                    _ => None,
                })
                .collect(),
            None => Vec::new(),
        };
        let columns = map_columns(&header)?;
        debug!("RosterSheet::open: columns: {:?}", columns);

        Ok(RosterSheet { range, columns })
    }

    /// Iterates the data rows as normalized records.
    ///
    /// Rows whose location or course is blank after trimming are skipped;
    /// blank or unparsable dates become `None`.
    pub fn records(&self) -> impl Iterator<Item = RosterRecord> + '_ {
        let cols = self.columns;
        self.range.rows().skip(1).filter_map(move |row| {
            let location = cell_text(row.get(cols.location));
            let course = cell_text(row.get(cols.course));
            if location.is_empty() || course.is_empty() {
                debug!("records: skipping row with blank location or course");
                return None;
            }
            Some(RosterRecord {
                location,
                course,
                status: cell_text(row.get(cols.status)),
                start_date: cell_date(row.get(cols.start)),
                end_date: cell_date(row.get(cols.end)),
            })
        })
    }
}

/// Finds the position of every required column in the header row, reporting
/// all the absent ones at once.
fn map_columns(header: &[Option<String>]) -> ConvertResult<ColumnMap> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    for (idx, name) in header.iter().enumerate() {
        if let Some(name) = name {
            positions.entry(normalize_header(name)).or_insert(idx);
        }
    }

    let mut found: Vec<usize> = Vec::new();
    let mut missing: Vec<String> = Vec::new();
    for required in REQUIRED_COLUMNS {
        match positions.get(&normalize_header(required)) {
            Some(idx) => found.push(*idx),
            None => missing.push(required.to_string()),
        }
    }
    ensure!(missing.is_empty(), MissingColumnsSnafu { names: missing });

    Ok(ColumnMap {
        location: found[0],
        course: found[1],
        status: found[2],
        start: found[3],
        end: found[4],
    })
}

fn normalize_header(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn cell_text(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(s)) => s.trim().to_string(),
        Some(DataType::Int(i)) => i.to_string(),
        Some(DataType::Float(f)) => f.to_string(),
        Some(DataType::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn cell_date(cell: Option<&DataType>) -> Option<NaiveDate> {
    match cell {
        Some(DataType::DateTime(serial)) => excel_serial_date(*serial),
        Some(DataType::Float(serial)) => excel_serial_date(*serial),
        Some(DataType::Int(serial)) => excel_serial_date(*serial as f64),
        Some(DataType::String(s)) => parse_date_text(s.trim()),
        _ => None,
    }
}

// Excel serial day numbers count from the 1900 epoch; the 1899-12-30 origin
// absorbs the off-by-two of the historical leap-year bug.
fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(serial.trunc() as i64))
}

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%y/%m/%d"];

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if text.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<Option<String>> {
        names.iter().map(|n| Some(n.to_string())).collect()
    }

    #[test]
    fn header_lookup_ignores_case_and_spacing() {
        let cols = map_columns(&header(&[
            "  locname ",
            "COURSE  NAME",
            "jobstatus",
            "start date",
            "End Date",
        ]))
        .unwrap();
        assert_eq!(cols.location, 0);
        assert_eq!(cols.course, 1);
        assert_eq!(cols.end, 4);
    }

    #[test]
    fn header_lookup_is_order_independent() {
        let cols = map_columns(&header(&[
            "End Date",
            "JobStatus",
            "LocName",
            "Start Date",
            "Extra",
            "Course Name",
        ]))
        .unwrap();
        assert_eq!(cols.end, 0);
        assert_eq!(cols.status, 1);
        assert_eq!(cols.location, 2);
        assert_eq!(cols.start, 3);
        assert_eq!(cols.course, 5);
    }

    #[test]
    fn all_absent_headers_are_reported() {
        let err = map_columns(&header(&["LocName", "Course Name"])).unwrap_err();
        match err {
            crate::convert::ConvertError::MissingColumns { names } => {
                assert_eq!(names, vec!["JobStatus", "Start Date", "End Date"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn empty_header_row_reports_every_column() {
        let err = map_columns(&[]).unwrap_err();
        match err {
            crate::convert::ConvertError::MissingColumns { names } => {
                assert_eq!(names.len(), REQUIRED_COLUMNS.len());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn excel_serials_map_to_dates() {
        // 2024-01-01 and the first representable day.
        assert_eq!(
            excel_serial_date(45292.0),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(
            excel_serial_date(1.0),
            NaiveDate::from_ymd_opt(1899, 12, 31)
        );
        assert_eq!(excel_serial_date(0.0), None);
        assert_eq!(excel_serial_date(f64::NAN), None);
    }

    #[test]
    fn date_text_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert_eq!(parse_date_text("2024-03-01"), expected);
        assert_eq!(parse_date_text("3/1/2024"), expected);
        assert_eq!(parse_date_text(""), None);
        assert_eq!(parse_date_text("not a date"), None);
        assert_eq!(cell_date(Some(&DataType::String("garbage".to_string()))), None);
    }
}
