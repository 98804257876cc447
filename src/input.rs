//! Input file validation.

use crate::error::{AnalyzerError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Required extension of the input file, compared case-insensitively.
pub const EXPECTED_EXTENSION: &str = "csv";

/// A purchase file that passed boundary validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    path: PathBuf,
}

impl InputFile {
    /// Checks that `path` names an existing file with a `.csv` extension.
    ///
    /// Existence is checked first, so a missing `.txt` file is reported as
    /// missing.
    pub fn validate(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.is_file() {
            return Err(AnalyzerError::FileNotFound { path });
        }

        let has_csv_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case(EXPECTED_EXTENSION));
        if !has_csv_extension {
            return Err(AnalyzerError::InvalidExtension { path });
        }

        Ok(InputFile { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The customer name used in output prefixes: the file name without its
    /// extension.
    pub fn customer_name(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Opens the file for buffered reading.
    pub fn open(&self) -> Result<BufReader<File>> {
        Ok(BufReader::new(File::open(&self.path)?))
    }
}
