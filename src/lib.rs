pub mod config;
pub mod error;
pub mod exporter;
pub mod filter;
pub mod lookup;
pub mod prompt;
pub mod request;
pub mod source;
mod traits;
pub mod utils;

pub use config::{Credentials, Settings};
pub use error::{ExportError, ExportResult};
pub use exporter::{BatchReport, ExportSummary, TableData, TableExporter};
pub use filter::Filter;
pub use lookup::{QualifiedName, TableLookup};
pub use request::ExportRequest;
pub use source::{MySqlSource, TableSource};

use crossterm::{style::Print, ExecutableCommand};
use tracing::info;

/// Reads the credentials and lookup files, connects, and prepares the output directory.
pub fn open(settings: &Settings) -> ExportResult<TableExporter<MySqlSource>> {
    let mut credentials = Credentials::load(&settings.credentials_path)?;
    let lookup = TableLookup::load(&settings.lookup_path)?;
    info!(
        "Loaded {} lookup entries from {}",
        lookup.len(),
        settings.lookup_path.display()
    );

    if credentials.password.is_none() {
        credentials.password = Some(prompt::prompt_password(&credentials.user)?);
    }
    let source = MySqlSource::connect(settings, &credentials)?;
    TableExporter::new(source, lookup, settings)
}

/// Interactive mode: tick tables from the lookup, optionally give a course, export each.
pub fn pick<S: TableSource>(exporter: &mut TableExporter<S>) -> ExportResult<BatchReport> {
    let names = exporter.lookup().names();
    let (tables, course) = prompt::with_raw_mode(|stdout| {
        let tables = prompt::select_tables(stdout, &names)?;
        stdout.execute(Print("Course (blank for whole tables): "))?;
        Ok((tables, prompt::read_line(stdout, false)?))
    })?;

    let course = course.trim();
    let requests = tables
        .into_iter()
        .map(|table| {
            if course.is_empty() {
                ExportRequest::whole_table(&table)
            } else {
                ExportRequest {
                    course: course.to_string(),
                    table,
                }
            }
        })
        .collect::<Vec<_>>();
    Ok(exporter.run_batch(&requests))
}
