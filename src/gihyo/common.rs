use std::time::Duration;

use enum_iterator::Sequence;
use strum_macros::{Display, EnumString};

pub const STORE_URL: &str = "https://gihyo.jp/dp";
pub const MY_PAGE_URL: &str = "https://gihyo.jp/dp/my-page";

/// Items shown per "my page" listing page.
pub const PAGE_SIZE: u32 = 30;

/// Wait applied to download actions (modal link, connection).
pub const ACTION_TIMEOUT: Duration = Duration::from_secs(3);
/// Wait applied to every other UI action.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const CONF_FILE_NAME: &str = "get_ebook_files_from_gihyo.conf";

// Login modal
pub const LOGIN_OPEN_XPATH: &str =
    "//*[self::a or self::button or self::span][normalize-space(.)='ログイン']";
pub const EMAIL_INPUT_CSS: &str = r#"input[placeholder="メールアドレス"]"#;
pub const PASSWORD_INPUT_CSS: &str = r#"input[placeholder="パスワード"]"#;
pub const LOGIN_SUBMIT_XPATH: &str = "//input[@value='ログイン'] | //button[@type='submit' and normalize-space(.)='ログイン']";
pub const MY_PAGE_XPATH: &str = "//*[self::a or self::span][normalize-space(.)='マイページ']";

// Listing and modal
pub const MODAL_CLOSE_XPATH: &str = "//*[normalize-space(text())='閉じる']";
pub const NEXT_PAGE_CSS: &str = "a.next";

#[derive(Debug, EnumString, PartialEq, Eq, Hash, Display, Sequence, Clone, Copy)]
#[strum(serialize_all = "lowercase")]
pub enum Format {
    Epub,
    Pdf,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Epub => "epub",
            Format::Pdf => "pdf",
        }
    }

    /// Text of the download link inside the ebook modal.
    pub fn link_text(self) -> &'static str {
        match self {
            Format::Epub => "EPUBダウンロード",
            Format::Pdf => "PDFダウンロード",
        }
    }

    pub fn link_xpath(self) -> String {
        format!("//a[contains(normalize-space(.), '{}')]", self.link_text())
    }
}

/// Title paragraph of a listing item: a `p` classed `title` under the
/// item's first `a`. Must agree with `listing::parse_listing`.
const ITEM_TITLE_XPATH: &str =
    "a[1]/p[contains(concat(' ', normalize-space(@class), ' '), ' title ')]";

/// XPath of the clickable title of the `position`-th listing item (0-based).
pub fn title_xpath(position: usize) -> String {
    format!(
        "(//li[{ITEM_TITLE_XPATH}])[{}]/{ITEM_TITLE_XPATH}[1]",
        position + 1
    )
}

/// XPath of the paging marker whose text is the first item number of a page.
pub fn paging_marker_xpath(first_item: u32) -> String {
    format!("//li[@class='paging-number' and normalize-space(text())='{first_item}']")
}
