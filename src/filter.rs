use crate::{
    error::{ExportError, ExportResult},
    lookup::quote_ident,
};
use mysql::{Params, Value};
use tracing::warn;

/// Conjunction of `column = value` conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<(String, String)>,
}

impl Filter {
    pub fn none() -> Self {
        Self::default()
    }

    /// Pairs `columns` and `values` by index; the longer side is truncated.
    pub fn assemble<C, V>(columns: &[C], values: &[V]) -> Self
    where
        C: AsRef<str>,
        V: AsRef<str>,
    {
        if columns.len() != values.len() {
            warn!(
                "{} filter columns but {} values, using the first {}",
                columns.len(),
                values.len(),
                columns.len().min(values.len())
            );
        }
        let conditions = columns
            .iter()
            .zip(values)
            .map(|(c, v)| (c.as_ref().to_string(), v.as_ref().to_string()))
            .collect();
        Self { conditions }
    }

    pub fn course(column: &str, course: &str) -> Self {
        Self {
            conditions: vec![(column.to_string(), course.to_string())],
        }
    }

    /// Parses `column=value`.
    pub fn parse_pair(pair: &str) -> ExportResult<(String, String)> {
        match pair.split_once('=') {
            Some((col, val)) if !col.trim().is_empty() => {
                Ok((col.trim().to_string(), val.to_string()))
            }
            _ => Err(ExportError::Filter(format!("expected column=value, got {pair:?}"))),
        }
    }

    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { conditions: pairs }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().map(|(c, _)| c.as_str())
    }

    /// ` WHERE `a` = ? AND ...` plus the positional parameters for it.
    pub fn to_sql(&self) -> (String, Params) {
        if self.conditions.is_empty() {
            return (String::new(), Params::Empty);
        }
        let clause = self
            .conditions
            .iter()
            .map(|(col, _)| format!("{} = ?", quote_ident(col)))
            .collect::<Vec<_>>()
            .join(" AND ");
        let params = self
            .conditions
            .iter()
            .map(|(_, val)| Value::from(val.as_str()))
            .collect::<Vec<_>>();
        (format!(" WHERE {clause}"), Params::Positional(params))
    }
}
