use std::{
    fmt,
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::{Local, NaiveDateTime};
use thiserror::Error;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const SEPARATOR: &str = " - ";

#[derive(Error, Debug)]
pub enum SessionLogError {
    #[error("failed to append to {}: {source}", path.display())]
    Append {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed login line: {0:?}")]
    Malformed(String),
    #[error("display name {0:?} must be non-empty and fit on one line")]
    InvalidName(String),
}

/// Checks that a name can be journaled as a single parseable line.
pub fn parse_display_name(name: &str) -> Result<String, SessionLogError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.contains(['\n', '\r']) {
        return Err(SessionLogError::InvalidName(name.to_string()));
    }
    Ok(trimmed.to_string())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginEvent {
    pub timestamp: NaiveDateTime,
    pub display_name: String,
}

impl fmt::Display for LoginEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.display_name
        )
    }
}

impl FromStr for LoginEvent {
    type Err = SessionLogError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let malformed = || SessionLogError::Malformed(line.to_string());
        let (stamp, name) = line.split_once(SEPARATOR).ok_or_else(malformed)?;
        let timestamp =
            NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).map_err(|_| malformed())?;
        if name.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            timestamp,
            display_name: name.to_string(),
        })
    }
}

/// Append-only login journal. Grows without bound.
#[derive(Clone, Debug)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_login(&self, display_name: &str) -> Result<LoginEvent, SessionLogError> {
        let event = LoginEvent {
            timestamp: Local::now().naive_local(),
            display_name: parse_display_name(display_name)?,
        };
        self.append_line(&event.to_string())
            .map_err(|source| SessionLogError::Append {
                path: self.path.clone(),
                source,
            })?;
        Ok(event)
    }

    fn append_line(&self, line: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn two_logins_append_two_parseable_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = SessionLog::new(dir.path().join("log.txt"));

        let first = log.record_login("Rustan C. Lacanilo").unwrap();
        log.record_login("Rustan C. Lacanilo").unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in &lines {
            let event: LoginEvent = line.parse().unwrap();
            assert_eq!(event.display_name, "Rustan C. Lacanilo");
        }
        let parsed: LoginEvent = lines[0].parse().unwrap();
        assert_eq!(
            parsed.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            first.timestamp.format(TIMESTAMP_FORMAT).to_string()
        );
    }

    #[test]
    fn existing_log_is_appended_to() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, "2024-01-02 03:04:05 - Someone\n").unwrap();

        SessionLog::new(&path).record_login("Operator").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("2024-01-02 03:04:05 - Someone\n"));
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn line_format_round_trips_through_display() {
        let event: LoginEvent = "2024-05-06 07:08:09 - Jane Q. Public".parse().unwrap();
        assert_eq!(event.display_name, "Jane Q. Public");
        assert_eq!(event.to_string(), "2024-05-06 07:08:09 - Jane Q. Public");
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!("not a login".parse::<LoginEvent>().is_err());
        assert!("2024-13-40 99:00:00 - X".parse::<LoginEvent>().is_err());
        assert!("2024-05-06 07:08:09 - ".parse::<LoginEvent>().is_err());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("Front\nDesk")]
    #[case("Front\r\nDesk")]
    fn names_that_would_break_the_line_format_are_refused(#[case] name: &str) {
        let dir = tempfile::tempdir().unwrap();
        let log = SessionLog::new(dir.path().join("log.txt"));

        assert!(matches!(
            log.record_login(name),
            Err(SessionLogError::InvalidName(_))
        ));
        log.record_login("Front Desk").unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        assert_eq!(contents.lines().count(), 1);
        for line in contents.lines() {
            assert!(line.parse::<LoginEvent>().is_ok());
        }
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(parse_display_name("  Front Desk ").unwrap(), "Front Desk");
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let log = SessionLog::new(dir.path());
        assert!(matches!(
            log.record_login("x"),
            Err(SessionLogError::Append { .. })
        ));
    }
}
