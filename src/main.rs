use clap::{Args, Parser, Subcommand};
use std::{io::stdout, path::PathBuf, process};
use table_export::{
    config::{home_path, Settings, CREDENTIALS_FILE, DEFAULT_COURSE_COLUMN, DEFAULT_HOST, DEFAULT_PORT, LOOKUP_FILE},
    exporter::print_table,
    utils::{exit_on_error, init_logging},
    BatchReport, ExportRequest, Filter, TableExporter, TableLookup, TableSource,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Export MySQL tables to CSV files")]
struct Cli {
    /// MySQL credentials file: user on line 1, password on line 2
    #[arg(long, env = "TABLE_EXPORT_CREDENTIALS")]
    credentials: Option<PathBuf>,
    /// Table lookup file, one `database.table` per line
    #[arg(long, env = "TABLE_EXPORT_LOOKUP")]
    lookup: Option<PathBuf>,
    #[arg(long, env = "TABLE_EXPORT_HOST", default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, env = "TABLE_EXPORT_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
    #[arg(long, env = "TABLE_EXPORT_OUT_DIR", default_value = "tables")]
    out_dir: PathBuf,
    #[arg(long, env = "TABLE_EXPORT_LOG_DIR", default_value = "logs")]
    log_dir: PathBuf,
    /// Column matched against the course in course exports
    #[arg(long, default_value = DEFAULT_COURSE_COLUMN)]
    course_column: String,
    /// Text written for NULL values
    #[arg(long, default_value = "")]
    null_text: String,
    /// Replace existing CSV files instead of refusing
    #[arg(long)]
    overwrite: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export one table to <out-dir>/<table>.csv
    Export {
        table: String,
        #[command(flatten)]
        selection: Selection,
    },
    /// Print one table as CSV on stdout
    Show {
        table: String,
        #[command(flatten)]
        selection: Selection,
    },
    /// Export every `course:table` line of a request file
    Batch { requests: PathBuf },
    /// List the table lookup
    List,
    /// Choose tables interactively
    Pick,
}

#[derive(Args, Debug)]
struct Selection {
    /// Only rows of this course
    #[arg(long, conflicts_with = "filters")]
    course: Option<String>,
    /// Only rows where COLUMN equals VALUE, may be repeated
    #[arg(long = "where", value_name = "COLUMN=VALUE", value_parser = where_pair)]
    filters: Vec<(String, String)>,
}

impl Selection {
    fn filter<S: TableSource>(&self, exporter: &TableExporter<S>) -> Filter {
        match &self.course {
            Some(course) => exporter.course_filter(course),
            None => Filter::from_pairs(self.filters.clone()),
        }
    }
}

fn where_pair(s: &str) -> Result<(String, String), String> {
    Filter::parse_pair(s).map_err(|e| e.to_string())
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            credentials_path: self.credentials.clone().unwrap_or_else(|| home_path(CREDENTIALS_FILE)),
            lookup_path: self.lookup.clone().unwrap_or_else(|| home_path(LOOKUP_FILE)),
            host: self.host.clone(),
            port: self.port,
            out_dir: self.out_dir.clone(),
            log_dir: self.log_dir.clone(),
            course_column: self.course_column.clone(),
            null_text: self.null_text.clone(),
            overwrite: self.overwrite,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let settings = cli.settings();
    let log_path = exit_on_error(init_logging(&settings.log_dir));
    info!("Logging to {}", log_path.display());

    match cli.command {
        Command::List => {
            let lookup = exit_on_error(TableLookup::load(&settings.lookup_path));
            for (short, name) in lookup.iter() {
                println!("{short} -> {name}");
            }
        }
        Command::Export { table, selection } => {
            let mut exporter = exit_on_error(table_export::open(&settings));
            let filter = selection.filter(&exporter);
            let summary = exit_on_error(exporter.export_table(&table, &filter));
            println!("{} is saved on {} ({} rows)", summary.table, summary.path.display(), summary.rows);
        }
        Command::Show { table, selection } => {
            let mut exporter = exit_on_error(table_export::open(&settings));
            let filter = selection.filter(&exporter);
            let data = exit_on_error(exporter.fetch_table(&table, &filter));
            exit_on_error(print_table(&data, stdout().lock()));
        }
        Command::Batch { requests } => {
            let requests = exit_on_error(ExportRequest::load(&requests));
            let mut exporter = exit_on_error(table_export::open(&settings));
            exit_with(report(&exporter.run_batch(&requests)));
        }
        Command::Pick => {
            let mut exporter = exit_on_error(table_export::open(&settings));
            exit_with(report(&exit_on_error(table_export::pick(&mut exporter))));
        }
    }
}

/// Prints the outcome of a batch, returns the process exit code.
fn report(report: &BatchReport) -> i32 {
    for summary in &report.exported {
        println!("{} is saved on {} ({} rows)", summary.table, summary.path.display(), summary.rows);
    }
    for (request, e) in &report.failed {
        eprintln!("{request} failed: {e}");
    }
    if report.is_success() {
        0
    } else {
        1
    }
}

fn exit_with(code: i32) {
    if code != 0 {
        process::exit(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use table_export::ExportError;

    #[test]
    fn course_conflicts_with_where() {
        let err = Cli::try_parse_from([
            "table-export", "export", "Account", "--course", "CS101", "--where", "user_id=1",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn where_pairs_accumulate() {
        let cli = Cli::try_parse_from([
            "table-export", "show", "Account", "--where", "user_id=1", "--where", "name=a=b",
        ])
        .unwrap();
        let Command::Show { table, selection } = cli.command else {
            panic!("expected show");
        };
        assert_eq!(table, "Account");
        assert_eq!(selection.course, None);
        assert_eq!(
            selection.filters,
            vec![
                ("user_id".to_string(), "1".to_string()),
                ("name".to_string(), "a=b".to_string()),
            ]
        );
    }

    #[test]
    fn malformed_where_is_rejected() {
        let err = Cli::try_parse_from(["table-export", "export", "Account", "--where", "=1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert!(where_pair("novalue").is_err());
    }

    #[test]
    fn global_flags_reach_settings() {
        let cli = Cli::try_parse_from([
            "table-export", "--port", "3307", "--overwrite", "--lookup", "/tmp/lookup.cfg", "list",
        ])
        .unwrap();
        let settings = cli.settings();
        assert_eq!(settings.port, 3307);
        assert!(settings.overwrite);
        assert_eq!(settings.lookup_path, PathBuf::from("/tmp/lookup.cfg"));
        assert!(settings.credentials_path.ends_with(CREDENTIALS_FILE));
    }

    #[test]
    fn batch_with_failures_exits_non_zero() {
        let mut batch = BatchReport::default();
        assert_eq!(report(&batch), 0);

        batch.record(
            &ExportRequest::parse_line("CS101:Nope", 1).unwrap(),
            Err(ExportError::UnknownTable("Nope".into())),
        );
        assert_eq!(report(&batch), 1);
    }
}
