use crate::{
    config::read_required,
    error::{ExportError, ExportResult},
};
use std::{collections::BTreeMap, fmt, path::Path};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub database: String,
    pub table: String,
}

impl QualifiedName {
    /// `` `db`.`table` ``, safe to splice into SQL text.
    pub fn quoted(&self) -> String {
        format!("{}.{}", quote_ident(&self.database), quote_ident(&self.table))
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.table)
    }
}

pub fn quote_ident(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Short table name to its database-qualified name.
#[derive(Debug, Clone, Default)]
pub struct TableLookup {
    entries: BTreeMap<String, QualifiedName>,
}

impl TableLookup {
    pub fn parse(text: &str) -> ExportResult<Self> {
        let mut entries = BTreeMap::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let malformed = || ExportError::Lookup {
                line: idx + 1,
                text: raw.to_string(),
            };
            let (database, table) = line.split_once('.').ok_or_else(malformed)?;
            let (database, table) = (database.trim(), table.trim());
            if database.is_empty() || table.is_empty() {
                return Err(malformed());
            }

            let name = QualifiedName {
                database: database.to_string(),
                table: table.to_string(),
            };
            if let Some(prev) = entries.insert(table.to_string(), name) {
                warn!("lookup line {}: `{table}` redefined, replacing {prev}", idx + 1);
            }
        }
        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> ExportResult<Self> {
        Self::parse(&read_required(path, "Table lookup file")?)
    }

    pub fn resolve(&self, short: &str) -> ExportResult<&QualifiedName> {
        self.entries
            .get(short)
            .ok_or_else(|| ExportError::UnknownTable(short.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &QualifiedName)> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOOKUP: &str = "\
# course data
EdxPrivate.Account
Edx.EventXtract
  Edx.ActivityGrade

";

    #[test]
    fn splits_database_and_table() {
        let lookup = TableLookup::parse(LOOKUP).unwrap();
        assert_eq!(lookup.len(), 3);
        let name = lookup.resolve("ActivityGrade").unwrap();
        assert_eq!(name.database, "Edx");
        assert_eq!(name.table, "ActivityGrade");
        assert_eq!(name.to_string(), "Edx.ActivityGrade");
    }

    #[test]
    fn resolving_does_not_consume() {
        let lookup = TableLookup::parse(LOOKUP).unwrap();
        assert!(lookup.resolve("Account").is_ok());
        assert!(lookup.resolve("Account").is_ok());
    }

    #[test]
    fn unknown_table_is_reported() {
        let lookup = TableLookup::parse(LOOKUP).unwrap();
        match lookup.resolve("Nope") {
            Err(ExportError::UnknownTable(name)) => assert_eq!(name, "Nope"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn malformed_line_carries_line_number() {
        match TableLookup::parse("Edx.A\nnodot\n") {
            Err(ExportError::Lookup { line, text }) => {
                assert_eq!(line, 2);
                assert_eq!(text, "nodot");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(TableLookup::parse(".table").is_err());
        assert!(TableLookup::parse("db.").is_err());
    }

    #[test]
    fn later_entry_wins() {
        let lookup = TableLookup::parse("Old.T\nNew.T\n").unwrap();
        assert_eq!(lookup.resolve("T").unwrap().database, "New");
    }

    #[test]
    fn table_part_keeps_extra_dots() {
        let lookup = TableLookup::parse("db.weird.name").unwrap();
        assert_eq!(lookup.resolve("weird.name").unwrap().database, "db");
    }

    #[test]
    fn quotes_identifiers() {
        let name = QualifiedName {
            database: "Edx".into(),
            table: "bad`name".into(),
        };
        assert_eq!(name.quoted(), "`Edx`.`bad``name`");
    }

    #[test]
    fn names_are_sorted() {
        let lookup = TableLookup::parse(LOOKUP).unwrap();
        assert_eq!(lookup.names(), vec!["Account", "ActivityGrade", "EventXtract"]);
    }
}
