pub mod common;
pub mod download;
pub mod ebook;
pub mod listing;
pub mod storefront;
pub mod user;

use std::path::Path;

use crate::error::StoreError;
use common::Format;
use ebook::Ebook;
use listing::Listing;

/// The pages the crawler drives, one blocking call per UI step.
pub trait Storefront {
    /// Parses the listing page currently shown.
    fn listing(&mut self) -> Result<Listing, StoreError>;

    /// Opens the download modal of `ebook`.
    fn open_ebook(&mut self, ebook: &Ebook) -> Result<(), StoreError>;

    /// Downloads `format` of the open ebook to `dest`.
    fn download(&mut self, ebook: &Ebook, format: Format, dest: &Path) -> Result<(), StoreError>;

    fn close_ebook(&mut self) -> Result<(), StoreError>;

    /// Moves to the next listing page, which starts at item `first_item`.
    fn next_page(&mut self, first_item: u32) -> Result<(), StoreError>;
}
