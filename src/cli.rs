use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::gihyo::common::CONF_FILE_NAME;

/// Downloads purchased gihyo.jp ebooks that are not on disk yet.
#[derive(Debug, Parser)]
#[command(name = "gihyo-ebooks", version, long_about = None)]
pub struct Args {
    /// Conf file path (default: get_ebook_files_from_gihyo.conf next to the executable).
    #[arg(short = 'c', long = "conf", value_name = "PATH")]
    pub conf: Option<PathBuf>,

    /// Show the browser window instead of running headless.
    #[arg(short = 's', long = "show_browser")]
    pub show_browser: bool,

    /// Directory the ebook files are saved to.
    #[arg(short = 'd', long = "download_directory", value_name = "DIR")]
    pub download_directory: PathBuf,

    /// Title of ebooks as a regular expression (for example: "Software Design .*月号").
    #[arg(short = 't', long = "title_of_ebooks", value_name = "REGEX", default_value = "")]
    pub title_of_ebooks: String,

    /// WebDriver endpoint, overriding the conf file.
    #[arg(short = 'w', long = "webdriver_url", value_name = "URL")]
    pub webdriver_url: Option<String>,

    /// Log every browser step.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Args {
    pub fn conf_path(&self) -> Result<PathBuf> {
        if let Some(conf) = &self.conf {
            return Ok(conf.clone());
        }
        let exe = env::current_exe().context("Failed to locate the executable")?;
        let dir = exe
            .parent()
            .context("The executable has no parent directory")?;
        Ok(dir.join(CONF_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_flags() {
        let args = Args::try_parse_from([
            "gihyo-ebooks",
            "-c",
            "/etc/gihyo.conf",
            "-s",
            "-d",
            "books",
            "-t",
            "Software Design .*月号",
        ])
        .unwrap();
        assert_eq!(args.conf, Some(PathBuf::from("/etc/gihyo.conf")));
        assert!(args.show_browser);
        assert_eq!(args.download_directory, PathBuf::from("books"));
        assert_eq!(args.title_of_ebooks, "Software Design .*月号");
        assert_eq!(args.conf_path().unwrap(), PathBuf::from("/etc/gihyo.conf"));
    }

    #[test]
    fn parses_long_flags_with_underscores() {
        let args = Args::try_parse_from([
            "gihyo-ebooks",
            "--download_directory",
            "out",
            "--show_browser",
            "--title_of_ebooks",
            "WEB\\+DB",
            "--webdriver_url",
            "http://127.0.0.1:9515",
        ])
        .unwrap();
        assert!(args.show_browser);
        assert_eq!(args.title_of_ebooks, "WEB\\+DB");
        assert_eq!(args.webdriver_url.as_deref(), Some("http://127.0.0.1:9515"));
    }

    #[test]
    fn defaults_match_everything_headless() {
        let args = Args::try_parse_from(["gihyo-ebooks", "-d", "out"]).unwrap();
        assert!(!args.show_browser);
        assert_eq!(args.title_of_ebooks, "");
        assert!(args.conf_path().unwrap().ends_with(CONF_FILE_NAME));
    }

    #[test]
    fn download_directory_is_required() {
        assert!(Args::try_parse_from(["gihyo-ebooks", "-t", "x"]).is_err());
    }
}
