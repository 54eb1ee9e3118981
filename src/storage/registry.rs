use std::{
    fs::{self, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::types::UserRecord;

pub const REGISTRY_HEADER: [&str; 4] = ["user_id", "first_name", "last_name", "photo_dir"];

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("User ID is required.")]
    MissingUserId,
    #[error("First and Last Name are required.")]
    MissingName,
    #[error("Photo directory is required.")]
    MissingPhotoDir,
}

/// Raw registration form contents, as typed by the user.
#[derive(Clone, Debug, Default)]
pub struct RegistrationForm {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub photo_dir: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<UserRecord, ValidationError> {
        let user_id = self.user_id.trim();
        let first_name = self.first_name.trim();
        let last_name = self.last_name.trim();
        let photo_dir = self.photo_dir.trim();

        if user_id.is_empty() {
            return Err(ValidationError::MissingUserId);
        }
        if first_name.is_empty() || last_name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        if photo_dir.is_empty() {
            return Err(ValidationError::MissingPhotoDir);
        }

        Ok(UserRecord {
            user_id: user_id.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            photo_dir: photo_dir.to_string(),
        })
    }
}

/// Result of a registration attempt, shown verbatim in the profile panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterOutcome {
    pub success: bool,
    pub message: String,
}

impl RegisterOutcome {
    fn ok(message: String) -> Self {
        Self {
            success: true,
            message,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            message,
        }
    }
}

/// Append-only CSV file of registered users.
#[derive(Clone, Debug)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    /// Opens the registry, writing the header row if the file is missing or empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let store = Self { path: path.into() };
        let needs_header = match fs::metadata(&store.path) {
            Ok(meta) => meta.len() == 0,
            Err(err) if err.kind() == io::ErrorKind::NotFound => true,
            Err(source) => return Err(store.io_error(source)),
        };

        if needs_header {
            if let Some(parent) = store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| store.io_error(e))?;
            }
            let mut writer = csv::Writer::from_path(&store.path).map_err(|e| store.csv_error(e))?;
            writer
                .write_record(REGISTRY_HEADER)
                .map_err(|e| store.csv_error(e))?;
            writer.flush().map_err(|e| store.io_error(e))?;
            log::info!("created user registry at {}", store.path.display());
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn register(&self, form: &RegistrationForm) -> RegisterOutcome {
        let record = match form.validate() {
            Ok(record) => record,
            Err(err) => return RegisterOutcome::failed(err.to_string()),
        };

        match self.append(&record) {
            Ok(()) => {
                log::info!("registered user {}", record.user_id);
                RegisterOutcome::ok(format!(
                    "Registered: {} - {} {}",
                    record.user_id, record.first_name, record.last_name
                ))
            }
            Err(err) => {
                log::error!("failed to register {}: {err}", record.user_id);
                RegisterOutcome::failed(format!("Failed to register: {err}"))
            }
        }
    }

    /// Reads every data row back, skipping the header.
    pub fn records(&self) -> Result<Vec<UserRecord>, RegistryError> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| self.csv_error(e))?;
        reader
            .deserialize()
            .collect::<Result<Vec<UserRecord>, _>>()
            .map_err(|e| self.csv_error(e))
    }

    fn append(&self, record: &UserRecord) -> Result<(), RegistryError> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.serialize(record).map_err(|e| self.csv_error(e))?;
        writer.flush().map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: io::Error) -> RegistryError {
        RegistryError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn csv_error(&self, source: csv::Error) -> RegistryError {
        RegistryError::Csv {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn form(user_id: &str, first: &str, last: &str, photo: &str) -> RegistrationForm {
        RegistrationForm {
            user_id: user_id.into(),
            first_name: first.into(),
            last_name: last.into(),
            photo_dir: photo.into(),
        }
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn fresh_registry_holds_only_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::open(dir.path().join("users.txt")).unwrap();

        assert_eq!(read(store.path()), "user_id,first_name,last_name,photo_dir\n");
        assert!(store.records().unwrap().is_empty());
    }

    #[test]
    fn empty_file_gets_a_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.txt");
        fs::write(&path, "").unwrap();

        RegistryStore::open(&path).unwrap();

        assert_eq!(read(&path), "user_id,first_name,last_name,photo_dir\n");
    }

    #[test]
    fn reopening_does_not_duplicate_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.txt");

        let store = RegistryStore::open(&path).unwrap();
        store.register(&form("u1", "Ada", "Lovelace", "photos/u1"));
        let reopened = RegistryStore::open(&path).unwrap();

        assert_eq!(read(&path).matches("user_id,").count(), 1);
        assert_eq!(reopened.records().unwrap().len(), 1);
    }

    #[test]
    fn valid_record_appends_one_row_in_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::open(dir.path().join("users.txt")).unwrap();

        let outcome = store.register(&form(" u7 ", "Grace ", " Hopper", "photos/user_0007"));

        assert!(outcome.success);
        assert_eq!(outcome.message, "Registered: u7 - Grace Hopper");
        let contents = read(store.path());
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(
            lines,
            [
                "user_id,first_name,last_name,photo_dir",
                "u7,Grace,Hopper,photos/user_0007"
            ]
        );
    }

    #[test]
    fn embedded_commas_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::open(dir.path().join("users.txt")).unwrap();

        store.register(&form("u2", "Jo, Jr", "Doe", "photos/u2"));

        assert!(read(store.path()).contains("u2,\"Jo, Jr\",Doe,photos/u2"));
        assert_eq!(store.records().unwrap()[0].first_name, "Jo, Jr");
    }

    #[rstest]
    #[case(form("", "Ada", "Lovelace", "p"), "User ID is required.")]
    #[case(form("   ", "", "", ""), "User ID is required.")]
    #[case(form("u1", "", "Lovelace", "p"), "First and Last Name are required.")]
    #[case(form("u1", "Ada", "  ", ""), "First and Last Name are required.")]
    #[case(form("u1", "Ada", "Lovelace", " "), "Photo directory is required.")]
    fn incomplete_forms_write_nothing(#[case] input: RegistrationForm, #[case] message: &str) {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::open(dir.path().join("users.txt")).unwrap();
        let before = read(store.path());

        let outcome = store.register(&input);

        assert!(!outcome.success);
        assert_eq!(outcome.message, message);
        assert_eq!(read(store.path()), before);
    }

    #[test]
    fn write_failure_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.txt");
        let store = RegistryStore::open(&path).unwrap();
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        let outcome = store.register(&form("u1", "Ada", "Lovelace", "p"));

        assert!(!outcome.success);
        assert!(outcome.message.starts_with("Failed to register: "));
    }
}
