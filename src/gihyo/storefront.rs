use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use fantoccini::Locator;
use reqwest::Url;
use tracing::{debug, info};

use crate::browser::Browser;
use crate::config::{Credentials, DownloadSettings};
use crate::error::StoreError;
use crate::gihyo::common::{
    paging_marker_xpath, title_xpath, Format, ACTION_TIMEOUT, DEFAULT_TIMEOUT, MODAL_CLOSE_XPATH,
    NEXT_PAGE_CSS, STORE_URL,
};
use crate::gihyo::download::Transfer;
use crate::gihyo::ebook::Ebook;
use crate::gihyo::listing::{parse_listing, Listing};
use crate::gihyo::{user, Storefront};

/// The live storefront, driven through a logged-in browser session.
pub struct BrowserStorefront {
    browser: Browser,
    transfer_timeout: Duration,
}

impl BrowserStorefront {
    pub fn login(
        browser: Browser,
        credentials: &Credentials,
        download: &DownloadSettings,
    ) -> Result<Self> {
        user::login(&browser, credentials)?;
        Ok(Self {
            browser,
            transfer_timeout: download.transfer_timeout(),
        })
    }

    /// Absolute URL behind the modal's download link for `format`.
    fn download_url(&self, format: Format) -> Result<Url, StoreError> {
        let link = self
            .browser
            .wait_for(Locator::XPath(&format.link_xpath()), ACTION_TIMEOUT)?;
        let href = self
            .browser
            .attr(&link, "href")?
            .filter(|href| !href.is_empty() && !href.starts_with('#') && !href.starts_with("javascript:"))
            .ok_or(StoreError::MissingLink(format))?;

        let base = Url::parse(&self.browser.current_url()?)
            .map_err(|err| StoreError::Page(format!("current url: {err}")))?;
        base.join(&href)
            .map_err(|err| StoreError::Page(format!("download link `{href}`: {err}")))
    }
}

impl Storefront for BrowserStorefront {
    fn listing(&mut self) -> Result<Listing, StoreError> {
        let listing = parse_listing(&self.browser.source()?);
        debug!(
            "Listing has {} items (next page: {})",
            listing.ebooks.len(),
            listing.has_next
        );
        Ok(listing)
    }

    fn open_ebook(&mut self, ebook: &Ebook) -> Result<(), StoreError> {
        debug!("Opening {}", ebook);
        self.browser
            .click(Locator::XPath(&title_xpath(ebook.position)), DEFAULT_TIMEOUT)
    }

    fn download(&mut self, _ebook: &Ebook, format: Format, dest: &Path) -> Result<(), StoreError> {
        let url = self.download_url(format)?;
        let site = Url::parse(STORE_URL).map_err(|err| StoreError::Page(err.to_string()))?;
        let transfer = Transfer::new(
            &self.browser.cookies()?,
            &site,
            ACTION_TIMEOUT,
            self.transfer_timeout,
        )?;
        let bytes = transfer.fetch(&url, dest)?;
        debug!("Wrote {} bytes to {}", bytes, dest.display());
        Ok(())
    }

    fn close_ebook(&mut self) -> Result<(), StoreError> {
        self.browser
            .click(Locator::XPath(MODAL_CLOSE_XPATH), DEFAULT_TIMEOUT)
    }

    fn next_page(&mut self, first_item: u32) -> Result<(), StoreError> {
        self.browser
            .click(Locator::Css(NEXT_PAGE_CSS), DEFAULT_TIMEOUT)?;
        info!("next page...");
        self.browser
            .wait_for(Locator::XPath(&paging_marker_xpath(first_item)), DEFAULT_TIMEOUT)?;
        Ok(())
    }
}

