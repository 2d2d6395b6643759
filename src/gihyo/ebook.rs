use std::path::{Path, PathBuf};

use regex::Regex;

use crate::gihyo::common::Format;

/// One purchased title as shown on the "my page" listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ebook {
    /// Ordinal among all listing items of the page, in document order.
    pub position: usize,
    /// Rendered title text. Lines broken by `<br>` are kept as `\n`.
    pub title: String,
    /// Formats flagged on the listing, in `Format` order.
    pub formats: Vec<Format>,
}

impl std::fmt::Display for Ebook {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} {:?}", self.title.replace('\n', " "), self.formats)
    }
}

impl Ebook {
    pub fn matches(&self, filter: &Regex) -> bool {
        filter.is_match(&self.title.replace('\n', " "))
    }

    /// File name without extension. Deterministic for a given title, so
    /// an existing file marks the format as already downloaded.
    pub fn file_stem(&self) -> String {
        self.title
            .chars()
            .map(|c| match c {
                ' ' | '\n' | '\r' | '\t' | '/' | '\\' => '_',
                c => c,
            })
            .collect()
    }

    pub fn filename(&self, format: Format) -> String {
        format!("{}.{}", self.file_stem(), format.extension())
    }

    pub fn path(&self, download_dir: &Path, format: Format) -> PathBuf {
        download_dir.join(self.filename(format))
    }

    /// Formats flagged on the listing whose file is not in `download_dir`.
    pub fn missing_formats(&self, download_dir: &Path) -> Vec<Format> {
        self.formats
            .iter()
            .copied()
            .filter(|format| !self.path(download_dir, *format).exists())
            .collect()
    }
}
