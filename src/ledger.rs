use catalog_types::non_blank;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_LEDGER_PATH: &str = "uploaded.already";

/// Codes of products already uploaded, backed by an append-only text file.
///
/// One code per line. Lookups are exact matches on the trimmed code.
pub struct UploadLedger {
    path: PathBuf,
    codes: HashSet<String>,
    file: File,
}

impl UploadLedger {
    /// Opens the ledger at `path`, creating an empty one if absent.
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        // a hand-edited ledger may lack the final newline
        if !content.is_empty() && !content.ends_with('\n') {
            file.write_all(b"\n")?;
        }
        let codes: HashSet<String> = content
            .lines()
            .filter_map(non_blank)
            .map(ToString::to_string)
            .collect();
        log::debug!("Ledger {path:?} holds {} codes", codes.len());
        Ok(Self { path, codes, file })
    }

    pub fn is_uploaded(&self, code: &str) -> bool {
        self.codes.contains(code.trim())
    }

    /// Records `code`. Returns `false` without touching the file when it is already present.
    ///
    /// The code counts as uploaded for the rest of the session even when the
    /// file write fails.
    pub fn mark_uploaded(&mut self, code: &str) -> std::io::Result<bool> {
        let code = code.trim();
        if code.is_empty() || !self.codes.insert(code.to_string()) {
            return Ok(false);
        }
        writeln!(self.file, "{code}")?;
        self.file.flush()?;
        Ok(true)
    }

    /// Ledger whose file rejects every write.
    #[cfg(test)]
    pub(crate) fn open_unwritable<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        std::fs::write(&path, "")?;
        Ok(Self {
            file: File::open(&path)?,
            path,
            codes: HashSet::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
