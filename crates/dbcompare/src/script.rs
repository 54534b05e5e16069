//! Persisting compiled scripts.

use crate::{Error, Result, Script};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;

/// Somewhere to put compiled scripts.
pub trait ScriptSink {
    /// Store `script` under its file name, replacing any previous script of
    /// the same name. Returns where it was stored.
    fn write(&mut self, script: &Script) -> Result<Utf8PathBuf>;

    /// Where scripts end up, for display.
    fn location(&self) -> &Utf8Path;
}

/// Writes each script to `<dir>/<filename>`, overwriting without asking.
///
/// File names containing a path separator are refused, so a table name can
/// never place a script outside `dir`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: Utf8PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// A sink for the process working directory.
    pub fn current_dir() -> Result<Self> {
        let cwd = std::env::current_dir().map_err(|source| Error::WriteScript {
            path: Utf8PathBuf::from("."),
            source,
        })?;
        let dir = Utf8PathBuf::from_path_buf(cwd).map_err(|path| Error::WriteScript {
            path: Utf8PathBuf::from(path.to_string_lossy().into_owned()),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "working directory is not valid UTF-8",
            ),
        })?;
        Ok(Self { dir })
    }
}

impl ScriptSink for DirectorySink {
    fn write(&mut self, script: &Script) -> Result<Utf8PathBuf> {
        let path = self.dir.join(&script.filename);
        if script.filename.contains(['/', '\\']) {
            return Err(Error::WriteScript {
                path,
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "file name contains a path separator",
                ),
            });
        }
        std::fs::write(&path, &script.sql).map_err(|source| Error::WriteScript {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(%path, bytes = script.sql.len(), "wrote script");
        Ok(path)
    }

    fn location(&self) -> &Utf8Path {
        &self.dir
    }
}

/// Keeps scripts in memory, in the order they were first written.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    root: Utf8PathBuf,
    scripts: IndexMap<String, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, filename: &str) -> Option<&str> {
        self.scripts.get(filename).map(String::as_str)
    }

    pub fn filenames(&self) -> Vec<&str> {
        self.scripts.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

impl ScriptSink for MemorySink {
    fn write(&mut self, script: &Script) -> Result<Utf8PathBuf> {
        self.scripts
            .insert(script.filename.clone(), script.sql.clone());
        Ok(self.root.join(&script.filename))
    }

    fn location(&self) -> &Utf8Path {
        &self.root
    }
}
