use clap::Parser;

/// Converts a roster workbook into a location-by-course assignment matrix.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The roster workbook (.xlsx): one row per person/assignment,
    /// with LocName, Course Name, JobStatus, Start Date and End Date columns.
    #[clap(value_parser)]
    pub roster: String,

    /// (file path) The course list: plain UTF-8 text, one course name per line.
    /// It defines the output columns and their order.
    #[clap(short, long, value_parser)]
    pub courses: String,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
