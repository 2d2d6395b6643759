use std::path::PathBuf;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{error, info, warn};

use crate::gihyo::common::PAGE_SIZE;
use crate::gihyo::ebook::Ebook;
use crate::gihyo::Storefront;

pub struct CrawlOptions {
    pub download_dir: PathBuf,
    pub title_filter: Regex,
    /// Extra attempts per ebook after a timeout.
    pub retries: u32,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub pages: u32,
    pub downloaded: u32,
    pub skipped: u32,
    pub failed: u32,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} pages, {} downloaded, {} already present, {} failed",
            self.pages, self.downloaded, self.skipped, self.failed
        )
    }
}

/// Walks every listing page and fetches the missing files of each
/// matching ebook.
pub struct Crawler<S> {
    store: S,
    options: CrawlOptions,
    summary: RunSummary,
}

impl<S: Storefront> Crawler<S> {
    pub fn new(store: S, options: CrawlOptions) -> Self {
        Self {
            store,
            options,
            summary: RunSummary::default(),
        }
    }

    pub fn run(mut self) -> Result<RunSummary> {
        let mut first_item = 1;
        loop {
            self.summary.pages += 1;
            let listing = self.store.listing().context("Failed to read the listing")?;

            for ebook in &listing.ebooks {
                if ebook.matches(&self.options.title_filter) {
                    self.process_ebook(ebook)?;
                }
            }

            if !listing.has_next {
                break;
            }
            first_item += PAGE_SIZE;
            self.store
                .next_page(first_item)
                .with_context(|| format!("Failed to move to the page starting at {first_item}"))?;
        }
        Ok(self.summary)
    }

    fn process_ebook(&mut self, ebook: &Ebook) -> Result<()> {
        let dir = &self.options.download_dir;
        let max_attempts = self.options.retries + 1;

        let mut missing = ebook.missing_formats(dir);
        self.summary.skipped += (ebook.formats.len() - missing.len()) as u32;

        let mut attempt = 1;
        while !missing.is_empty() {
            self.store
                .open_ebook(ebook)
                .with_context(|| format!("Failed to open {}", ebook))?;

            let mut timed_out = Vec::new();
            for format in &missing {
                let filename = ebook.filename(*format);
                match self.store.download(ebook, *format, &ebook.path(dir, *format)) {
                    Ok(()) => {
                        info!("{}", filename);
                        self.summary.downloaded += 1;
                    }
                    Err(err) if err.is_timeout() => {
                        warn!("timeout: {} ({})", filename, err);
                        timed_out.push(*format);
                    }
                    Err(err) => {
                        return Err(err).with_context(|| format!("Failed to download {filename}"))
                    }
                }
            }

            self.store
                .close_ebook()
                .with_context(|| format!("Failed to close the modal of {}", ebook))?;

            if timed_out.is_empty() {
                break;
            }
            if attempt >= max_attempts {
                for format in &timed_out {
                    error!("giving up on {}", ebook.filename(*format));
                }
                self.summary.failed += timed_out.len() as u32;
                break;
            }
            info!("retrying...");
            attempt += 1;
            missing = ebook.missing_formats(dir);
        }
        Ok(())
    }
}
