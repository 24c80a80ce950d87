use crate::{
    config::Settings,
    error::{ExportError, ExportResult},
    filter::Filter,
    lookup::{QualifiedName, TableLookup},
    request::{sanitize, ExportRequest},
    source::TableSource,
    utils::ensure_dir,
};
use std::{
    io,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::{error, info};

/// Header row followed by the data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableData {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub table: QualifiedName,
    pub path: PathBuf,
    pub rows: u64,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub exported: Vec<ExportSummary>,
    pub failed: Vec<(ExportRequest, ExportError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Files the outcome of one export, logging failures.
    pub fn record(&mut self, request: &ExportRequest, result: ExportResult<ExportSummary>) {
        match result {
            Ok(summary) => self.exported.push(summary),
            Err(e) => {
                error!("{request} failed: {e}");
                self.failed.push((request.clone(), e));
            }
        }
    }
}

/// CSV file that only appears under its final name once `finish` succeeds.
struct CsvSink {
    writer: csv::Writer<NamedTempFile>,
    path: PathBuf,
    overwrite: bool,
}

impl CsvSink {
    fn create(path: &Path, overwrite: bool) -> ExportResult<Self> {
        if !overwrite && path.exists() {
            return Err(ExportError::OutputExists(path.to_path_buf()));
        }
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        Ok(Self {
            writer: csv::Writer::from_writer(NamedTempFile::new_in(dir)?),
            path: path.to_path_buf(),
            overwrite,
        })
    }

    fn write<I, T>(&mut self, record: I) -> ExportResult<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        Ok(self.writer.write_record(record)?)
    }

    fn finish(self) -> ExportResult<PathBuf> {
        let tmp = self
            .writer
            .into_inner()
            .map_err(|e| ExportError::Io(e.into_error()))?;
        let persisted = if self.overwrite {
            tmp.persist(&self.path)
        } else {
            tmp.persist_noclobber(&self.path)
        };
        persisted.map_err(|e| match e.error.kind() {
            io::ErrorKind::AlreadyExists => ExportError::OutputExists(self.path.clone()),
            _ => ExportError::Io(e.error),
        })?;
        Ok(self.path)
    }
}

pub struct TableExporter<S> {
    source: S,
    lookup: TableLookup,
    out_dir: PathBuf,
    course_column: String,
    overwrite: bool,
}

impl<S: TableSource> TableExporter<S> {
    pub fn new(source: S, lookup: TableLookup, settings: &Settings) -> ExportResult<Self> {
        ensure_dir(&settings.out_dir)?;
        Ok(Self {
            source,
            lookup,
            out_dir: settings.out_dir.clone(),
            course_column: settings.course_column.clone(),
            overwrite: settings.overwrite,
        })
    }

    pub fn lookup(&self) -> &TableLookup {
        &self.lookup
    }

    pub fn resolve(&self, short: &str) -> ExportResult<&QualifiedName> {
        self.lookup.resolve(short)
    }

    pub fn course_filter(&self, course: &str) -> Filter {
        Filter::course(&self.course_column, course)
    }

    pub fn out_path(&self, file_stem: &str) -> PathBuf {
        self.out_dir.join(format!("{file_stem}.csv"))
    }

    /// Resolves `short` and reads its header, checking the filter against it.
    fn prepare(&mut self, short: &str, filter: &Filter) -> ExportResult<(QualifiedName, Vec<String>)> {
        let table = self.resolve(short)?.clone();
        let header = self.source.describe(&table)?;
        // mysql column names are case-insensitive
        if let Some(column) = filter.columns().find(|c| !header.iter().any(|h| h.eq_ignore_ascii_case(c))) {
            return Err(ExportError::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
        Ok((table, header))
    }

    pub fn fetch_table(&mut self, short: &str, filter: &Filter) -> ExportResult<TableData> {
        let (table, header) = self.prepare(short, filter)?;
        let mut rows = Vec::new();
        self.source.scan(&table, filter, &mut |row: Vec<String>| {
            rows.push(row);
            Ok(())
        })?;
        Ok(TableData { header, rows })
    }

    /// Streams `short` into `<out_dir>/<file_stem>.csv`.
    pub fn export(&mut self, short: &str, filter: &Filter, file_stem: &str) -> ExportResult<ExportSummary> {
        let (table, header) = self.prepare(short, filter)?;
        let mut sink = CsvSink::create(&self.out_path(file_stem), self.overwrite)?;
        sink.write(&header)?;
        let rows = self.source.scan(&table, filter, &mut |row: Vec<String>| sink.write(&row))?;
        let path = sink.finish()?;

        info!("Exported {rows} rows of {table} to {}", path.display());
        Ok(ExportSummary { table, path, rows })
    }

    pub fn export_table(&mut self, short: &str, filter: &Filter) -> ExportResult<ExportSummary> {
        self.export(short, filter, &sanitize(short))
    }

    pub fn export_request(&mut self, request: &ExportRequest) -> ExportResult<ExportSummary> {
        let filter = self.course_filter(&request.course);
        self.export(&request.table, &filter, &request.file_stem())
    }

    /// Exports each request in order; a request without a course exports the whole table.
    pub fn run_batch(&mut self, requests: &[ExportRequest]) -> BatchReport {
        let mut report = BatchReport::default();
        for request in requests {
            let result = if request.course.is_empty() {
                self.export_table(&request.table, &Filter::none())
            } else {
                self.export_request(request)
            };
            report.record(request, result);
        }
        info!(
            "Batch finished: {} exported, {} failed",
            report.exported.len(),
            report.failed.len()
        );
        report
    }
}

/// Serializes `data` to a new CSV file at `path`.
pub fn write_table(data: &TableData, path: &Path, overwrite: bool) -> ExportResult<PathBuf> {
    let mut sink = CsvSink::create(path, overwrite)?;
    sink.write(&data.header)?;
    for row in &data.rows {
        sink.write(row)?;
    }
    sink.finish()
}

/// Writes `data` as CSV to any writer, e.g. stdout.
pub fn print_table<W: io::Write>(data: &TableData, out: W) -> ExportResult<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(&data.header)?;
    for row in &data.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
