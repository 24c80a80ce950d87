use crate::{
    config::read_required,
    error::{ExportError, ExportResult},
};
use std::{fmt, path::Path};

/// One `course:table` line of a request file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub course: String,
    pub table: String,
}

impl ExportRequest {
    /// Request for a whole table, no course filter.
    pub fn whole_table(table: &str) -> Self {
        Self {
            course: String::new(),
            table: table.to_string(),
        }
    }

    pub fn parse_line(line: &str, line_no: usize) -> ExportResult<Self> {
        let malformed = || ExportError::Request {
            line: line_no,
            text: line.to_string(),
        };
        // course ids may contain ':' themselves, table names never do
        let (course, table) = line.rsplit_once(':').ok_or_else(malformed)?;
        let (course, table) = (course.trim(), table.trim());
        if course.is_empty() || table.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            course: course.to_string(),
            table: table.to_string(),
        })
    }

    pub fn parse_all(text: &str) -> ExportResult<Vec<Self>> {
        text.lines()
            .enumerate()
            .filter(|(_, line)| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with('#')
            })
            .map(|(idx, line)| Self::parse_line(line, idx + 1))
            .collect()
    }

    pub fn load(path: &Path) -> ExportResult<Vec<Self>> {
        Self::parse_all(&read_required(path, "Request file")?)
    }

    pub fn file_stem(&self) -> String {
        format!("{}_{}", sanitize(&self.course), sanitize(&self.table))
    }
}

impl fmt::Display for ExportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.course.is_empty() {
            write!(f, "{}", self.table)
        } else {
            write!(f, "{}:{}", self.course, self.table)
        }
    }
}

/// Replaces anything outside `[A-Za-z0-9._-]` so the result is a plain file name.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_last_colon() {
        let req = ExportRequest::parse_line("course-v1:Stanford+CS101+2024:EventXtract", 1).unwrap();
        assert_eq!(req.course, "course-v1:Stanford+CS101+2024");
        assert_eq!(req.table, "EventXtract");
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let text = "# requests\n\nEngineering/CS101/Fall2014 : Account\n  \nMed/Stats/2015:ActivityGrade\n";
        let reqs = ExportRequest::parse_all(text).unwrap();
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].course, "Engineering/CS101/Fall2014");
        assert_eq!(reqs[0].table, "Account");
    }

    #[test]
    fn malformed_line_reports_position() {
        match ExportRequest::parse_all("a:b\n\nno-separator\n") {
            Err(ExportError::Request { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(ExportRequest::parse_line(":Account", 1).is_err());
        assert!(ExportRequest::parse_line("course:", 1).is_err());
    }

    #[test]
    fn displays_as_request_line() {
        let req = ExportRequest::parse_line("CS101:Account", 1).unwrap();
        assert_eq!(req.to_string(), "CS101:Account");
        assert_eq!(ExportRequest::whole_table("Account").to_string(), "Account");
    }

    #[test]
    fn file_stem_is_filesystem_safe() {
        let req = ExportRequest::parse_line("Engineering/CS101/Fall 2014:Account", 1).unwrap();
        assert_eq!(req.file_stem(), "Engineering_CS101_Fall_2014_Account");
    }
}
