use clap::Parser;
use log::info;
use snafu::ErrorCompat;

use std::path::Path;

mod args;
mod convert;

use crate::args::Args;
use crate::convert::convert;

fn main() {
    let args = Args::parse();
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::init();
    }

    info!("roster: {:?} courses: {:?}", args.roster, args.courses);

    match convert(Path::new(&args.roster), Path::new(&args.courses)) {
        Ok(output) => {
            println!("Wrote: {}", output.display());
        }
        Err(e) => {
            eprintln!("An error occured: {}", e);
            if let Some(bt) = ErrorCompat::backtrace(&e) {
                eprintln!("trace: {}", bt);
            }
            std::process::exit(1);
        }
    }
}
