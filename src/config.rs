use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use ini::{Ini, ParseOption};
use serde::Deserialize;
use strum_macros::{Display, EnumString};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub login: Credentials,
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub download: DownloadSettings,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"********")
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BrowserKind {
    Chrome,
    Firefox,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub kind: BrowserKind,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_owned(),
            kind: BrowserKind::Chrome,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DownloadSettings {
    /// Ceiling for a whole file transfer, body included.
    pub transfer_timeout_secs: u64,
    /// Extra attempts per ebook after a timeout.
    pub retries: u32,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            transfer_timeout_secs: 600,
            retries: 1,
        }
    }
}

impl DownloadSettings {
    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_secs)
    }
}

impl Config {
    /// Reads the config file. `*.toml` files are TOML, anything else is
    /// INI with the same sections.
    pub fn load(path: &Path) -> Result<Config> {
        if !path.is_file() {
            return Err(anyhow!("conf file is not readable: {}", path.display()));
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read conf file {}", path.display()))?;

        let is_toml = path.extension().is_some_and(|ext| ext == "toml");
        let config = if is_toml {
            Config::from_toml_str(&contents)
        } else {
            Config::from_ini_str(&contents)
        };
        config.with_context(|| format!("Invalid conf file {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Config> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_ini_str(contents: &str) -> Result<Config> {
        // Passwords are taken literally: no quote or escape processing.
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..Default::default()
        };
        let ini = Ini::load_from_str_opt(contents, options)?;
        let required = |key: &str| {
            ini.get_from(Some("login"), key)
                .map(str::to_owned)
                .ok_or_else(|| anyhow!("missing `{key}` in the [login] section"))
        };
        let login = Credentials {
            email: required("email")?,
            password: required("password")?,
        };

        let mut browser = BrowserSettings::default();
        if let Some(url) = ini.get_from(Some("browser"), "webdriver_url") {
            browser.webdriver_url = url.to_owned();
        }
        if let Some(kind) = ini.get_from(Some("browser"), "kind") {
            browser.kind = BrowserKind::from_str(kind)
                .with_context(|| format!("unknown browser kind `{kind}`"))?;
        }

        let mut download = DownloadSettings::default();
        if let Some(secs) = ini.get_from(Some("download"), "transfer_timeout_secs") {
            download.transfer_timeout_secs = secs
                .parse()
                .with_context(|| format!("transfer_timeout_secs is not a number: `{secs}`"))?;
        }
        if let Some(retries) = ini.get_from(Some("download"), "retries") {
            download.retries = retries
                .parse()
                .with_context(|| format!("retries is not a number: `{retries}`"))?;
        }

        Ok(Config {
            login,
            browser,
            download,
        })
    }
}
