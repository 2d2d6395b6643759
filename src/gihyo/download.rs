use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use reqwest::cookie::Jar;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use tracing::debug;

use crate::error::StoreError;

/// A cookie lifted from the browser session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
}

/// HTTP client that fetches the files behind the modal download links
/// using the logged-in browser's cookies.
pub struct Transfer {
    client: Client,
}

impl Transfer {
    pub fn new(
        cookies: &[SessionCookie],
        site: &Url,
        connect_timeout: Duration,
        transfer_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let jar = Jar::default();
        for cookie in cookies {
            let (header, url) = cookie_header(cookie, site);
            jar.add_cookie_str(&header, &url);
        }

        let client = Client::builder()
            .cookie_provider(Arc::new(jar))
            .connect_timeout(connect_timeout)
            .timeout(transfer_timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Downloads `url` into `dest`, returning the number of bytes written.
    ///
    /// The body goes to `<dest>.part` first and is renamed once complete,
    /// so `dest` only ever exists as a whole file.
    pub fn fetch(&self, url: &Url, dest: &Path) -> Result<u64, StoreError> {
        debug!("Download link: {}", url);
        let response = self.client.get(url.clone()).send()?.error_for_status()?;

        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("text/html"));
        if is_html {
            return Err(StoreError::Page(format!(
                "{url} returned an HTML page instead of a file"
            )));
        }

        let name = dest
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bar = progress_bar(response.content_length(), name);

        let part_path = part_path(dest);
        let written = match write_part(bar.wrap_read(response), &part_path) {
            Ok(written) => written,
            Err(err) => {
                bar.abandon();
                let _ = fs::remove_file(&part_path);
                return Err(err.into());
            }
        };
        fs::rename(&part_path, dest)?;
        bar.finish_and_clear();
        Ok(written)
    }
}

fn write_part(mut body: impl io::Read, part_path: &Path) -> io::Result<u64> {
    let mut file = File::create(part_path)?;
    let written = io::copy(&mut body, &mut file)?;
    file.sync_all()?;
    Ok(written)
}

fn part_path(dest: &Path) -> PathBuf {
    let mut part = dest.as_os_str().to_owned();
    part.push(".part");
    PathBuf::from(part)
}

fn progress_bar(total: Option<u64>, name: String) -> ProgressBar {
    let bar = match total {
        Some(total) => {
            let bar = ProgressBar::new(total);
            if let Ok(style) = ProgressStyle::with_template(
                "{msg} {spinner:.green} [{elapsed_precise}] [{bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            ) {
                bar.set_style(style.progress_chars("##-"));
            }
            bar
        }
        None => ProgressBar::new_spinner(),
    };
    bar.set_message(name);
    bar
}

/// `Set-Cookie` style header plus the URL the cookie belongs to.
fn cookie_header(cookie: &SessionCookie, site: &Url) -> (String, Url) {
    let mut header = format!("{}={}", cookie.name, cookie.value);
    let mut url = site.clone();
    if let Some(domain) = &cookie.domain {
        header.push_str(&format!("; Domain={domain}"));
        let host = domain.trim_start_matches('.');
        if url.set_host(Some(host)).is_err() {
            url = site.clone();
        }
    }
    header.push_str(&format!(
        "; Path={}",
        cookie.path.as_deref().unwrap_or("/")
    ));
    (header, url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn session(name: &str, value: &str) -> SessionCookie {
        SessionCookie {
            name: name.to_owned(),
            value: value.to_owned(),
            domain: None,
            path: None,
        }
    }

    fn transfer(cookies: &[SessionCookie], site: &Url) -> Transfer {
        Transfer::new(
            cookies,
            site,
            Duration::from_secs(3),
            Duration::from_secs(30),
        )
        .unwrap()
    }

    #[test]
    fn fetch_writes_file_with_session_cookie() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/dp/download/1234/pdf")
                .header("cookie", "gihyo_session=abc123");
            then.status(200)
                .header("content-type", "application/pdf")
                .body("%PDF-1.7 body");
        });

        let site = Url::parse(&server.base_url()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("Software_Design.pdf");
        let url = Url::parse(&server.url("/dp/download/1234/pdf")).unwrap();

        let written = transfer(&[session("gihyo_session", "abc123")], &site)
            .fetch(&url, &dest)
            .unwrap();

        mock.assert();
        assert_eq!(written, 13);
        assert_eq!(fs::read(&dest).unwrap(), b"%PDF-1.7 body");
        assert!(!part_path(&dest).exists());
    }

    #[test]
    fn fetch_rejects_html_pages() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/dp/my-page");
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body("<html>ログイン</html>");
        });

        let site = Url::parse(&server.base_url()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("book.epub");
        let url = Url::parse(&server.url("/dp/my-page")).unwrap();

        let err = transfer(&[], &site).fetch(&url, &dest).unwrap_err();
        assert!(matches!(err, StoreError::Page(_)));
        assert!(!dest.exists());
    }

    #[test]
    fn stalled_body_is_a_timeout_and_leaves_no_part_file() {
        use std::io::{Read, Write};
        use std::net::TcpListener;
        use std::thread;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request);
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: application/pdf\r\ncontent-length: 100\r\n\r\n%PDF",
                )
                .unwrap();
            socket.flush().unwrap();
            thread::sleep(Duration::from_secs(3));
        });

        let site = Url::parse(&format!("http://{addr}/")).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("stalled.pdf");
        let url = site.join("/dp/download/stalled.pdf").unwrap();

        let err = Transfer::new(&[], &site, Duration::from_secs(3), Duration::from_secs(1))
            .unwrap()
            .fetch(&url, &dest)
            .unwrap_err();

        assert!(err.is_timeout(), "expected a timeout, got {err:?}");
        assert!(!dest.exists());
        assert!(!part_path(&dest).exists());
        server.join().unwrap();
    }

    #[test]
    fn fetch_reports_http_errors_as_fatal() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing.pdf");
            then.status(404);
        });

        let site = Url::parse(&server.base_url()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing.pdf");
        let url = Url::parse(&server.url("/missing.pdf")).unwrap();

        let err = transfer(&[], &site).fetch(&url, &dest).unwrap_err();
        assert!(!err.is_timeout());
        assert!(!dest.exists());
    }

    #[test]
    fn cookie_header_scopes_to_cookie_domain() {
        let site = Url::parse("https://gihyo.jp/dp").unwrap();
        let cookie = SessionCookie {
            name: "sid".to_owned(),
            value: "v".to_owned(),
            domain: Some(".gihyo.jp".to_owned()),
            path: Some("/dp".to_owned()),
        };
        let (header, url) = cookie_header(&cookie, &site);
        assert_eq!(header, "sid=v; Domain=.gihyo.jp; Path=/dp");
        assert_eq!(url.host_str(), Some("gihyo.jp"));
    }
}
