use anyhow::{Context, Result};
use fantoccini::Locator;
use tracing::info;

use crate::browser::Browser;
use crate::config::Credentials;
use crate::gihyo::common::{
    DEFAULT_TIMEOUT, EMAIL_INPUT_CSS, LOGIN_OPEN_XPATH, LOGIN_SUBMIT_XPATH, MY_PAGE_URL,
    MY_PAGE_XPATH, PASSWORD_INPUT_CSS, STORE_URL,
};

/// Signs in through the login modal and lands on the purchase listing.
pub fn login(browser: &Browser, credentials: &Credentials) -> Result<()> {
    info!("Logging in as {}", credentials.email);
    browser
        .goto(STORE_URL)
        .with_context(|| format!("Failed to open {STORE_URL}"))?;

    browser
        .click(Locator::XPath(LOGIN_OPEN_XPATH), DEFAULT_TIMEOUT)
        .context("Failed to open the login modal")?;
    browser
        .fill(Locator::Css(EMAIL_INPUT_CSS), &credentials.email, DEFAULT_TIMEOUT)
        .context("Failed to fill in the email address")?;
    browser
        .fill(
            Locator::Css(PASSWORD_INPUT_CSS),
            &credentials.password,
            DEFAULT_TIMEOUT,
        )
        .context("Failed to fill in the password")?;
    browser
        .click(Locator::XPath(LOGIN_SUBMIT_XPATH), DEFAULT_TIMEOUT)
        .context("Failed to submit the login form")?;

    browser
        .click(Locator::XPath(MY_PAGE_XPATH), DEFAULT_TIMEOUT)
        .context("Login did not succeed: no link to the my page")?;
    browser
        .wait_for_url(MY_PAGE_URL, DEFAULT_TIMEOUT)
        .context("Login did not succeed: my page never loaded")?;

    info!("Logged in");
    Ok(())
}
