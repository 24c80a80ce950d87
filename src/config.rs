use crate::error::{ExportError, ExportResult};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const CREDENTIALS_FILE: &str = ".ssh/mysql_user";
pub const LOOKUP_FILE: &str = ".ssh/ds_table_lookup.cfg";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_COURSE_COLUMN: &str = "course_display_name";

/// MySQL login read from the credentials file: user on the first line,
/// password on the second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: Option<String>,
}

impl Credentials {
    pub fn parse(text: &str) -> ExportResult<Self> {
        let mut lines = text.lines().map(str::trim_end);
        let user = match lines.next() {
            Some(user) if !user.is_empty() => user.to_string(),
            _ => return Err(ExportError::Credentials("first line must hold the user name".into())),
        };
        let password = lines.next().map(String::from);
        Ok(Self { user, password })
    }

    pub fn load(path: &Path) -> ExportResult<Self> {
        Self::parse(&read_required(path, "MySQL user credentials")?)
    }
}

/// Everything needed to connect and export, resolved from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials_path: PathBuf,
    pub lookup_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub out_dir: PathBuf,
    pub log_dir: PathBuf,
    pub course_column: String,
    pub null_text: String,
    pub overwrite: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            credentials_path: home_path(CREDENTIALS_FILE),
            lookup_path: home_path(LOOKUP_FILE),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            out_dir: PathBuf::from("tables"),
            log_dir: PathBuf::from("logs"),
            course_column: DEFAULT_COURSE_COLUMN.to_string(),
            null_text: String::new(),
            overwrite: false,
        }
    }
}

/// `rel` under the user's home directory, or under the cwd if there is none.
pub fn home_path(rel: &str) -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(rel)
}

pub(crate) fn read_required(path: &Path, what: &'static str) -> ExportResult<String> {
    if !path.is_file() {
        return Err(ExportError::MissingFile {
            what,
            path: path.to_path_buf(),
        });
    }
    Ok(fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_user_and_password() {
        let creds = Credentials::parse("analyst  \nhunter2\n").unwrap();
        assert_eq!(creds.user, "analyst");
        assert_eq!(creds.password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn password_line_is_optional() {
        let creds = Credentials::parse("analyst\n").unwrap();
        assert_eq!(creds.password, None);
    }

    #[test]
    fn empty_user_is_rejected() {
        assert!(matches!(
            Credentials::parse("\nsecret\n"),
            Err(ExportError::Credentials(_))
        ));
        assert!(Credentials::parse("").is_err());
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mysql_user");
        match Credentials::load(&path) {
            Err(ExportError::MissingFile { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn loads_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mysql_user");
        fs::write(&path, "root\npw\n").unwrap();
        let creds = Credentials::load(&path).unwrap();
        assert_eq!(creds.user, "root");
    }

    #[test]
    fn defaults_point_at_home_ssh() {
        let settings = Settings::default();
        assert!(settings.credentials_path.ends_with(".ssh/mysql_user"));
        assert!(settings.lookup_path.ends_with(".ssh/ds_table_lookup.cfg"));
        assert_eq!(settings.port, 3306);
        assert!(!settings.overwrite);
    }
}
