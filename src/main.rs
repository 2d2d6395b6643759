mod browser;
mod cli;
mod config;
mod crawler;
mod error;
mod gihyo;
mod logging;

use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use regex::Regex;
use tracing::info;

use browser::Browser;
use cli::Args;
use config::Config;
use crawler::{CrawlOptions, Crawler};
use gihyo::storefront::BrowserStorefront;

fn main() {
    let args = Args::parse();
    logging::init_logging(args.verbose);

    if let Err(err) = run(args) {
        eprintln!("gihyo-ebooks error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = Config::load(&args.conf_path()?)?;
    if let Some(url) = args.webdriver_url {
        config.browser.webdriver_url = url;
    }

    let title_filter = Regex::new(&args.title_of_ebooks)
        .with_context(|| format!("Invalid title pattern `{}`", args.title_of_ebooks))?;
    fs::create_dir_all(&args.download_directory).with_context(|| {
        format!(
            "Failed to create download directory {}",
            args.download_directory.display()
        )
    })?;

    let browser = Browser::launch(&config.browser, !args.show_browser)?;
    let store = BrowserStorefront::login(browser, &config.login, &config.download)
        .context("Failed to log in to gihyo.jp")?;

    let summary = Crawler::new(
        store,
        CrawlOptions {
            download_dir: args.download_directory,
            title_filter,
            retries: config.download.retries,
        },
    )
    .run()?;

    info!("Done: {}", summary);
    Ok(())
}
