use crate::{
    config::{Credentials, Settings},
    error::{ExportError, ExportResult},
    filter::Filter,
    lookup::QualifiedName,
    traits::*,
};
use mysql::{consts::ColumnType, prelude::*, Conn, OptsBuilder, Params, Row, Value};
use tracing::{debug, info};

/// Where table rows come from. The exporter only talks to this.
pub trait TableSource {
    /// Column names of `table`, in table order.
    fn describe(&mut self, table: &QualifiedName) -> ExportResult<Vec<String>>;

    /// Streams every row of `table` matching `filter` into `visit`, returns the row count.
    fn scan(
        &mut self,
        table: &QualifiedName,
        filter: &Filter,
        visit: &mut dyn FnMut(Vec<String>) -> ExportResult<()>,
    ) -> ExportResult<u64>;
}

pub struct MySqlSource {
    conn: Conn,
    null_text: String,
}

impl MySqlSource {
    pub fn connect(settings: &Settings, credentials: &Credentials) -> ExportResult<Self> {
        let conn = Conn::new(
            OptsBuilder::new()
                .ip_or_hostname(Some(settings.host.as_str()))
                .tcp_port(settings.port)
                .user(Some(credentials.user.as_str()))
                .pass(credentials.password.as_deref()),
        )?;
        info!(
            "Connected to database at {}:{} as {}",
            settings.host, settings.port, credentials.user
        );
        Ok(Self {
            conn,
            null_text: settings.null_text.clone(),
        })
    }
}

impl TableSource for MySqlSource {
    fn describe(&mut self, table: &QualifiedName) -> ExportResult<Vec<String>> {
        let rows = self.conn.query::<Row, _>(describe_statement(table))?;
        field_names(table, rows.iter().map(|row| row.get_secure::<String>(0)))
    }

    fn scan(
        &mut self,
        table: &QualifiedName,
        filter: &Filter,
        visit: &mut dyn FnMut(Vec<String>) -> ExportResult<()>,
    ) -> ExportResult<u64> {
        let (stmt, params) = select_statement(table, filter);
        debug!("{stmt}");

        let null_text = &self.null_text;
        let mut count = 0;
        for row in self.conn.exec_iter(stmt, params)? {
            let row = row?;
            let columns = row.columns_ref();
            let record = (0..row.len())
                .map(|i| {
                    render_value(
                        row.as_ref(i).unwrap_or(&Value::NULL),
                        columns[i].column_type(),
                        null_text,
                    )
                })
                .collect();
            visit(record)?;
            count += 1;
        }
        Ok(count)
    }
}

pub fn describe_statement(table: &QualifiedName) -> String {
    format!("DESC {}", table.quoted())
}

pub fn select_statement(table: &QualifiedName, filter: &Filter) -> (String, Params) {
    let (clause, params) = filter.to_sql();
    (format!("SELECT * FROM {}{clause}", table.quoted()), params)
}

/// Column names from the `Field` cell of each `DESC` row; an undecodable one is an error.
fn field_names<I>(table: &QualifiedName, fields: I) -> ExportResult<Vec<String>>
where
    I: IntoIterator<Item = Option<String>>,
{
    fields
        .into_iter()
        .enumerate()
        .map(|(idx, field)| {
            field.ok_or_else(|| ExportError::Describe {
                table: table.to_string(),
                row: idx + 1,
            })
        })
        .collect()
}

/// Text form of a single cell, as the mysql client would print it.
pub fn render_value(value: &Value, column_type: ColumnType, null_text: &str) -> String {
    match *value {
        Value::NULL => null_text.to_string(),
        Value::Bytes(ref bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::Int(v) => v.to_string(),
        Value::UInt(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Date(year, month, day, hour, min, sec, micros) => {
            let date = format!("{year:04}-{month:02}-{day:02}");
            let midnight = hour == 0 && min == 0 && sec == 0 && micros == 0;
            if column_type.is_date_type() || (!column_type.is_date_time_type() && midnight) {
                date
            } else {
                format!("{date} {}", clock(hour.into(), min, sec, micros))
            }
        }
        Value::Time(negative, days, hours, min, sec, micros) => {
            let sign = if negative { "-" } else { "" };
            format!("{sign}{}", clock(days * 24 + u32::from(hours), min, sec, micros))
        }
    }
}

fn clock(hours: u32, min: u8, sec: u8, micros: u32) -> String {
    if micros > 0 {
        format!("{hours:02}:{min:02}:{sec:02}.{micros:06}")
    } else {
        format!("{hours:02}:{min:02}:{sec:02}")
    }
}
