use std::io;

use fantoccini::error::CmdError;
use thiserror::Error;

use crate::gihyo::common::Format;

/// Failure of a single storefront interaction.
///
/// Only [`StoreError::Timeout`] is recoverable; the crawler retries the
/// ebook once and keeps going. Everything else ends the run.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("webdriver command failed: {0}")]
    WebDriver(String),
    #[error("http request failed")]
    Http(#[source] reqwest::Error),
    #[error(transparent)]
    Io(io::Error),
    #[error("no {0} download link in the ebook modal")]
    MissingLink(Format),
    #[error("unexpected page: {0}")]
    Page(String),
}

impl StoreError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Timeout(_))
    }
}

impl From<CmdError> for StoreError {
    fn from(err: CmdError) -> Self {
        match err {
            CmdError::WaitTimeout => StoreError::Timeout("webdriver wait".to_owned()),
            other => StoreError::WebDriver(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout(err.to_string())
        } else {
            StoreError::Http(err)
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        if is_timed_out(&err) {
            StoreError::Timeout(err.to_string())
        } else {
            StoreError::Io(err)
        }
    }
}

/// A blocking response body reports a stall as an `Other` io error that
/// wraps the reqwest timeout, so the whole source chain is checked.
fn is_timed_out(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::TimedOut {
        return true;
    }
    let mut source = err
        .get_ref()
        .map(|inner| inner as &(dyn std::error::Error + 'static));
    while let Some(current) = source {
        if let Some(http) = current.downcast_ref::<reqwest::Error>() {
            if http.is_timeout() {
                return true;
            }
        }
        if let Some(io) = current.downcast_ref::<io::Error>() {
            if io.kind() == io::ErrorKind::TimedOut {
                return true;
            }
        }
        source = current.source();
    }
    false
}
