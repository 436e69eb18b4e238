//! Script sets and script loading.
//!
//! A script set is an ordered collection of named SQL bodies. Order is the
//! byte-wise ascending order of the names and nothing else: no version
//! number is parsed out of a name.
//!
//! ```text
//! schema/
//! ├── 01_create_tables.sql
//! ├── 02_create_indexes.sql
//! ├── 03_create_functions.sql
//! └── README.md              # ignored, wrong extension
//! ```

use std::borrow::Cow;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::LoadError;

/// Default extension of script files.
pub const DEFAULT_EXTENSION: &str = "sql";

/// A single named SQL script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// Unique name, used as the sort key.
    pub name: String,
    /// Zero-based position in the sorted set.
    pub ordinal: usize,
    /// Opaque script body.
    pub body: String,
    /// File the script was read from, if any.
    pub path: Option<PathBuf>,
}

impl Script {
    /// Create a script that was not read from disk.
    ///
    /// The ordinal is assigned when the script joins a [`ScriptSet`].
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ordinal: 0,
            body: body.into(),
            path: None,
        }
    }

    /// Hex-encoded SHA-256 of the body.
    pub fn checksum(&self) -> String {
        hex::encode(Sha256::digest(self.body.as_bytes()))
    }

    /// The first `limit` characters of the body, with `...` appended when cut.
    pub fn preview(&self, limit: usize) -> Cow<'_, str> {
        match self.body.char_indices().nth(limit) {
            Some((idx, _)) => Cow::Owned(format!("{}...", &self.body[..idx])),
            None => Cow::Borrowed(&self.body),
        }
    }

    /// Body size in bytes.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Whether the body is empty.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Where a script set comes from.
#[derive(Debug, Clone)]
pub enum ScriptSource {
    /// Every file in a directory whose name ends with `.{extension}`.
    Directory {
        /// Directory to enumerate.
        path: PathBuf,
        /// Extension without the leading dot.
        extension: String,
    },
    /// A static in-memory table of name/body pairs.
    Table(Vec<(String, String)>),
}

impl ScriptSource {
    /// A directory source using the default `.sql` extension.
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::Directory {
            path: path.into(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// A static table source.
    pub fn table<N, B>(entries: impl IntoIterator<Item = (N, B)>) -> Self
    where
        N: Into<String>,
        B: Into<String>,
    {
        Self::Table(
            entries
                .into_iter()
                .map(|(n, b)| (n.into(), b.into()))
                .collect(),
        )
    }

    /// Override the extension of a directory source. No effect on tables.
    pub fn with_extension(self, ext: impl Into<String>) -> Self {
        match self {
            Self::Directory { path, .. } => Self::Directory {
                path,
                extension: ext.into().trim_start_matches('.').to_string(),
            },
            table => table,
        }
    }
}

/// An ordered, immutable set of uniquely named scripts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptSet {
    scripts: Vec<Script>,
}

impl ScriptSet {
    /// Load a script set from a source.
    ///
    /// A missing directory is an error; a directory with no matching files
    /// yields an empty set.
    pub async fn load(source: &ScriptSource) -> Result<Self, LoadError> {
        match source {
            ScriptSource::Directory { path, extension } => {
                Self::load_dir(path, extension).await
            }
            ScriptSource::Table(entries) => Self::from_scripts(
                entries
                    .iter()
                    .map(|(name, body)| Script::new(name.clone(), body.clone())),
            ),
        }
    }

    /// Build a set from scripts, sorting by name and assigning ordinals.
    pub fn from_scripts(scripts: impl IntoIterator<Item = Script>) -> Result<Self, LoadError> {
        let mut scripts: Vec<Script> = scripts.into_iter().collect();
        scripts.sort_by(|a, b| a.name.cmp(&b.name));

        let mut seen = HashSet::with_capacity(scripts.len());
        for script in &scripts {
            if !seen.insert(script.name.as_str()) {
                return Err(LoadError::DuplicateName(script.name.clone()));
            }
        }

        for (ordinal, script) in scripts.iter_mut().enumerate() {
            script.ordinal = ordinal;
        }

        Ok(Self { scripts })
    }

    async fn load_dir(dir: &Path, extension: &str) -> Result<Self, LoadError> {
        let io_err = |source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let meta = match tokio::fs::metadata(dir).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoadError::NotFound(dir.to_path_buf()));
            }
            Err(e) => return Err(io_err(e)),
        };
        if !meta.is_dir() {
            return Err(LoadError::NotADirectory(dir.to_path_buf()));
        }

        let suffix = format!(".{}", extension);
        let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
        let mut scripts = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                debug!(path = %path.display(), "Skipping non UTF-8 file name");
                continue;
            };
            if !name.ends_with(&suffix) {
                continue;
            }

            let file_type = entry.file_type().await.map_err(io_err)?;
            if !file_type.is_file() && !path.is_file() {
                continue;
            }

            let body = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })?;

            scripts.push(Script {
                name: name.to_string(),
                ordinal: 0,
                body,
                path: Some(path),
            });
        }

        let set = Self::from_scripts(scripts)?;
        debug!(dir = %dir.display(), count = set.len(), "Loaded script set");
        Ok(set)
    }

    /// Number of scripts.
    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    /// Whether the set is empty. Callers should warn rather than fail.
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Iterate in ordinal order.
    pub fn iter(&self) -> std::slice::Iter<'_, Script> {
        self.scripts.iter()
    }

    /// Look up a script by name.
    pub fn get(&self, name: &str) -> Option<&Script> {
        self.scripts
            .binary_search_by(|s| s.name.as_str().cmp(name))
            .ok()
            .map(|idx| &self.scripts[idx])
    }

    /// Script names in ordinal order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scripts.iter().map(|s| s.name.as_str())
    }
}

impl<'a> IntoIterator for &'a ScriptSet {
    type Item = &'a Script;
    type IntoIter = std::slice::Iter<'a, Script>;

    fn into_iter(self) -> Self::IntoIter {
        self.scripts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_dir_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("03_functions.sql"), "SELECT 3;").unwrap();
        std::fs::write(dir.path().join("01_tables.sql"), "SELECT 1;").unwrap();
        std::fs::write(dir.path().join("02_indexes.sql"), "SELECT 2;").unwrap();
        std::fs::write(dir.path().join("README.md"), "# docs").unwrap();
        std::fs::write(dir.path().join("notes.sql.bak"), "nope").unwrap();
        std::fs::create_dir(dir.path().join("nested.sql")).unwrap();

        let set = ScriptSet::load(&ScriptSource::directory(dir.path()))
            .await
            .unwrap();

        let names: Vec<_> = set.names().collect();
        assert_eq!(
            names,
            vec!["01_tables.sql", "02_indexes.sql", "03_functions.sql"]
        );
        for (i, script) in set.iter().enumerate() {
            assert_eq!(script.ordinal, i);
            assert!(script.path.is_some());
        }
        assert_eq!(set.get("02_indexes.sql").unwrap().body, "SELECT 2;");
    }

    #[tokio::test]
    async fn test_load_missing_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");

        let err = ScriptSet::load(&ScriptSource::directory(&missing))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::NotFound(p) if p == missing));
    }

    #[tokio::test]
    async fn test_load_empty_dir_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("readme.txt"), "hi").unwrap();

        let set = ScriptSet::load(&ScriptSource::directory(dir.path()))
            .await
            .unwrap();
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn test_load_file_is_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("one.sql");
        std::fs::write(&file, "SELECT 1;").unwrap();

        let err = ScriptSet::load(&ScriptSource::directory(&file))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_custom_extension() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.pgsql"), "SELECT 1;").unwrap();
        std::fs::write(dir.path().join("b.sql"), "SELECT 2;").unwrap();

        let source = ScriptSource::directory(dir.path()).with_extension(".pgsql");
        let set = ScriptSet::load(&source).await.unwrap();
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["a.pgsql"]);
    }

    #[tokio::test]
    async fn test_table_source_sorted() {
        let source = ScriptSource::table([("b", "SELECT 2"), ("a", "SELECT 1"), ("B", "x")]);
        let set = ScriptSet::load(&source).await.unwrap();

        // Byte order: uppercase sorts before lowercase.
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["B", "a", "b"]);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = ScriptSet::from_scripts([
            Script::new("01.sql", "a"),
            Script::new("01.sql", "b"),
        ])
        .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateName(n) if n == "01.sql"));
    }

    #[test]
    fn test_preview() {
        let script = Script::new("x.sql", "abcdef");
        assert_eq!(script.preview(3), "abc...");
        assert_eq!(script.preview(6), "abcdef");
        assert_eq!(script.preview(100), "abcdef");

        let script = Script::new("y.sql", "ééé");
        assert_eq!(script.preview(2), "éé...");
    }

    #[test]
    fn test_checksum_stable() {
        let a = Script::new("a.sql", "CREATE TABLE t();");
        let b = Script::new("b.sql", "CREATE TABLE t();");
        let c = Script::new("c.sql", "DROP TABLE t;");

        assert_eq!(a.checksum(), b.checksum());
        assert_ne!(a.checksum(), c.checksum());
        assert_eq!(a.checksum().len(), 64);
    }
}
