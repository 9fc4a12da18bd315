//! The user a dashboard is built for

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("an account needs both a name and a login name")]
    Missing,

    #[error("failed to read account file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} must have the user name and login name on 2 lines, found {lines}", path.display())]
    Malformed { path: PathBuf, lines: usize },
}

/// Identifies the requesting user; substituted into component data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    pub login_name: String,
}

impl Account {
    pub fn new(name: impl Into<String>, login_name: impl Into<String>) -> Result<Self, AccountError> {
        let name = name.into();
        let login_name = login_name.into();
        if name.trim().is_empty() || login_name.trim().is_empty() {
            return Err(AccountError::Missing);
        }
        Ok(Self { name, login_name })
    }

    /// Read an account file: the user name on the first line, the login name on the second.
    /// Blank lines are ignored.
    pub fn from_file(path: &Path) -> Result<Self, AccountError> {
        let text = std::fs::read_to_string(path).map_err(|source| AccountError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        match lines.as_slice() {
            [name, login_name] => Self::new(*name, *login_name),
            _ => Err(AccountError::Malformed {
                path: path.to_path_buf(),
                lines: lines.len(),
            }),
        }
    }

    /// Prefer an explicit name and login pair, otherwise fall back to an account file
    pub fn resolve(
        name: Option<&str>,
        login_name: Option<&str>,
        file: Option<&Path>,
    ) -> Result<Self, AccountError> {
        match (name, login_name, file) {
            (Some(name), Some(login_name), _) => Self::new(name, login_name),
            (_, _, Some(path)) => Self::from_file(path),
            _ => Err(AccountError::Missing),
        }
    }

    /// Replace `{name}` and `{login}` in `text` with this account's values
    pub fn substitute(&self, text: &str) -> String {
        if !text.contains('{') {
            return text.to_string();
        }
        text.replace("{name}", &self.name)
            .replace("{login}", &self.login_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_requires_both_names() {
        assert!(Account::new("Alice", "alice").is_ok());
        assert!(matches!(Account::new("", "alice"), Err(AccountError::Missing)));
        assert!(matches!(Account::new("Alice", "  "), Err(AccountError::Missing)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("account.txt");

        std::fs::write(&path, "Alice Smith\r\nasmith\r\n\r\n").unwrap();
        assert_eq!(
            Account::from_file(&path).unwrap(),
            Account::new("Alice Smith", "asmith").unwrap()
        );

        std::fs::write(&path, "Alice Smith\n").unwrap();
        assert!(matches!(
            Account::from_file(&path),
            Err(AccountError::Malformed { lines: 1, .. })
        ));
    }

    #[test]
    fn test_resolve_prefers_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("account.txt");
        std::fs::write(&path, "From File\nfile\n").unwrap();

        let flags = Account::resolve(Some("Flag"), Some("flag"), Some(&path)).unwrap();
        assert_eq!(flags.login_name, "flag");

        let file = Account::resolve(Some("Flag"), None, Some(&path)).unwrap();
        assert_eq!(file.login_name, "file");

        assert!(matches!(Account::resolve(None, None, None), Err(AccountError::Missing)));
    }

    #[test]
    fn test_substitute() {
        let account = Account::new("Alice", "alice").unwrap();
        assert_eq!(
            account.substitute("ssh {login}@host # {name}"),
            "ssh alice@host # Alice"
        );
        assert_eq!(account.substitute("{other}"), "{other}");
    }
}
