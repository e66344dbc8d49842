//! Blocking HTTP session over libcurl (via the `curl` crate).
//!
//! One `HttpSession` wraps one curl handle, so connections and cookies set by
//! the site carry over between the song page visit and the file fetch. Each
//! download worker owns its own session. Call from `spawn_blocking` when used
//! from async code.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Browser-like request headers sent alongside the user agent.
const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.5"),
    ("DNT", "1"),
    ("Upgrade-Insecure-Requests", "1"),
];

/// A fully buffered response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u32,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub struct HttpSession {
    easy: curl::easy::Easy,
}

impl HttpSession {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let mut easy = curl::easy::Easy::new();
        easy.useragent(user_agent)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        // Empty string enables the in-memory cookie engine without reading a file.
        easy.cookie_file("")?;
        easy.accept_encoding("")?;
        easy.connect_timeout(Duration::from_secs(15))?;
        easy.timeout(timeout)?;
        Ok(Self { easy })
    }

    fn set_headers(&mut self, referer: Option<&str>) -> Result<(), curl::Error> {
        let mut list = curl::easy::List::new();
        for (k, v) in BROWSER_HEADERS {
            list.append(&format!("{}: {}", k, v))?;
        }
        if let Some(r) = referer {
            list.append(&format!("Referer: {}", r))?;
        }
        self.easy.http_headers(list)
    }

    /// GET `url`, buffering the body. Any HTTP status is returned as a `Response`.
    pub fn get(&mut self, url: &str, referer: Option<&str>) -> Result<Response, curl::Error> {
        self.easy.url(url)?;
        self.easy.get(true)?;
        self.set_headers(referer)?;

        let mut body = Vec::new();
        {
            let mut transfer = self.easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let status = self.easy.response_code()?;
        let content_type = self.easy.content_type()?.map(str::to_string);
        tracing::debug!(url, status, bytes = body.len(), "GET");
        Ok(Response {
            status,
            content_type,
            body,
        })
    }

    /// GET `url` as text, failing on a non-2xx status.
    pub fn get_text(&mut self, url: &str, referer: Option<&str>) -> Result<String> {
        let resp = self
            .get(url, referer)
            .with_context(|| format!("GET {} failed", url))?;
        if !resp.is_success() {
            anyhow::bail!("GET {} returned HTTP {}", url, resp.status);
        }
        Ok(resp.text())
    }

    /// HEAD `url` and return the status code.
    pub fn head(&mut self, url: &str) -> Result<u32, curl::Error> {
        self.easy.url(url)?;
        self.easy.nobody(true)?;
        self.set_headers(None)?;
        let result = self.easy.perform().and_then(|()| self.easy.response_code());
        // Restore GET for the next request even when the probe failed.
        self.easy.nobody(false)?;
        let status = result?;
        tracing::debug!(url, status, "HEAD");
        Ok(status)
    }

    /// Stream `url` into a new file at `path`. Returns the number of bytes written.
    /// On failure the partially written file is removed.
    pub fn download_to(&mut self, url: &str, path: &Path) -> Result<u64> {
        let result = self.stream_into(url, path);
        if result.is_err() {
            let _ = std::fs::remove_file(path);
        }
        result
    }

    fn stream_into(&mut self, url: &str, path: &Path) -> Result<u64> {
        let mut file =
            File::create(path).with_context(|| format!("create {}", path.display()))?;
        self.easy.url(url).context("invalid URL")?;
        self.easy.get(true)?;
        self.set_headers(None)?;

        let mut written = 0u64;
        let mut write_err: Option<std::io::Error> = None;
        {
            let mut transfer = self.easy.transfer();
            transfer.write_function(|data| match file.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    write_err = Some(e);
                    Ok(0) // abort transfer
                }
            })?;
            let performed = transfer.perform();
            drop(transfer);
            if let Some(e) = write_err.take() {
                return Err(e).with_context(|| format!("write {}", path.display()));
            }
            performed.with_context(|| format!("GET {} failed", url))?;
        }

        let code = self.easy.response_code().context("no response code")?;
        if !(200..300).contains(&code) {
            anyhow::bail!("GET {} returned HTTP {}", url, code);
        }
        file.flush()?;
        Ok(written)
    }
}
