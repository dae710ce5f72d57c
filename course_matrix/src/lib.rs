mod model;
use log::{debug, info};

use std::collections::HashMap;

pub use crate::model::*;

/// Folds roster records into a location-by-course matrix.
///
/// Rows are created for each distinct location in first-seen order, columns
/// follow the catalog order, and every row materializes one cell per catalog
/// column. When several records land on the same cell, the record with the
/// latest non-empty start date supplies the displayed status and dates
/// (most-recent-assignment-wins); see [`MatrixCell`] for the tie rules.
///
/// The caller is expected to have dropped records whose course is absent
/// from the catalog. A surviving unmatched course is reported as
/// [`MatrixErrors::CourseNotInCatalog`].
pub fn build_matrix<I>(records: I, catalog: &CourseCatalog) -> Result<Matrix, MatrixErrors>
where
    I: IntoIterator<Item = RosterRecord>,
{
    let mut locations: Vec<String> = Vec::new();
    let mut location_index: HashMap<String, usize> = HashMap::new();
    let mut cells: Vec<Vec<MatrixCell>> = Vec::new();
    let mut num_records: u64 = 0;

    for record in records {
        let course_idx = match catalog.index_of(&record.course) {
            Some(idx) => idx,
            None => return Err(MatrixErrors::CourseNotInCatalog(record.course)),
        };
        let location_idx = match location_index.get(&record.location) {
            Some(idx) => *idx,
            None => {
                let idx = locations.len();
                location_index.insert(record.location.clone(), idx);
                locations.push(record.location.clone());
                cells.push(vec![MatrixCell::default(); catalog.len()]);
                idx
            }
        };

        let cell = &mut cells[location_idx][course_idx];
        if record_wins(cell, &record) {
            debug!(
                "build_matrix: ({:?}, {:?}) takes status {:?} start {:?}",
                record.location, record.course, record.status, record.start_date
            );
            cell.status = record.status;
            cell.start_date = record.start_date;
            cell.end_date = record.end_date;
        }
        cell.record_count += 1;
        num_records += 1;
    }

    info!(
        "build_matrix: folded {} records into {} locations x {} courses",
        num_records,
        locations.len(),
        catalog.len()
    );

    Ok(Matrix {
        locations,
        courses: catalog.entries().to_vec(),
        cells,
    })
}

// Most-recent-assignment-wins. A dated record outranks any dateless one;
// equal start dates (or two dateless records) resolve to the later record
// in input order.
fn record_wins(cell: &MatrixCell, record: &RosterRecord) -> bool {
    if cell.is_empty() {
        return true;
    }
    match (record.start_date, cell.start_date) {
        (Some(new), Some(old)) => new >= old,
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (None, None) => true,
    }
}
