//! Streaming download of a release asset.

use crate::error::InstallError;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, LOCATION, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::{StatusCode, Url};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

pub const MAX_REDIRECTS: usize = 10;
const PROGRESS_STEP: u8 = 20;
const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadProgress {
    Percent(u8),
    Complete,
}

pub trait Fetch {
    fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut dyn FnMut(DownloadProgress),
    ) -> Result<(), InstallError>;
}

pub struct HttpFetcher {
    client: Client,
    max_redirects: usize,
}

impl HttpFetcher {
    pub fn new(user_agent: &'static str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(user_agent));

        // Redirects are followed by hand so the hop count stays bounded and visible.
        // A slow mirror is waited on rather than cut off.
        let client = Client::builder()
            .default_headers(headers)
            .redirect(Policy::none())
            .timeout(None::<Duration>)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            max_redirects: MAX_REDIRECTS,
        }
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    fn resolve_final(&self, url: &str) -> Result<Response, InstallError> {
        let mut current = url.to_string();
        let mut hops = 0;

        loop {
            let response = self
                .client
                .get(&current)
                .send()
                .map_err(|err| InstallError::Network(err.to_string()))?;

            let status = response.status();
            if is_redirect(status) {
                if hops >= self.max_redirects {
                    return Err(InstallError::TooManyRedirects {
                        url: url.to_string(),
                        hops,
                    });
                }

                let next = redirect_target(&current, &response)?;
                tracing::debug!(from = %current, to = %next, "following redirect");
                current = next;
                hops += 1;
                continue;
            }

            if !status.is_success() {
                return Err(InstallError::HttpError {
                    status: status.as_u16(),
                    url: current,
                });
            }

            return Ok(response);
        }
    }
}

impl Fetch for HttpFetcher {
    fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut dyn FnMut(DownloadProgress),
    ) -> Result<(), InstallError> {
        let response = self.resolve_final(url)?;
        let mut tracker = response.content_length().map(ProgressTracker::new);

        let file = File::create(dest)?;
        if let Err(err) = stream_to_file(response, file, tracker.as_mut(), &mut *progress) {
            if let Err(remove_err) = fs::remove_file(dest) {
                tracing::warn!(
                    path = %dest.display(),
                    error = %remove_err,
                    "could not remove partial download"
                );
            }
            return Err(err);
        }

        progress(DownloadProgress::Complete);
        tracing::debug!(%url, dest = %dest.display(), "download complete");
        Ok(())
    }
}

fn stream_to_file(
    mut response: Response,
    mut file: File,
    mut tracker: Option<&mut ProgressTracker>,
    progress: &mut dyn FnMut(DownloadProgress),
) -> Result<(), InstallError> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let read = response
            .read(&mut buf)
            .map_err(|err| InstallError::Network(err.to_string()))?;
        if read == 0 {
            break;
        }

        file.write_all(&buf[..read])?;

        if let Some(tracker) = tracker.as_deref_mut() {
            if let Some(percent) = tracker.advance(read as u64) {
                progress(DownloadProgress::Percent(percent));
            }
        }
    }

    file.flush()?;
    Ok(())
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

fn redirect_target(current: &str, response: &Response) -> Result<String, InstallError> {
    let status = response.status().as_u16();
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| InstallError::HttpError {
            status,
            url: current.to_string(),
        })?;

    let base = Url::parse(current).map_err(|err| InstallError::Network(err.to_string()))?;
    let next = base
        .join(location)
        .map_err(|err| InstallError::Network(err.to_string()))?;
    Ok(next.to_string())
}

/// Reports progress only when a 20-point boundary is crossed.
#[derive(Debug)]
struct ProgressTracker {
    total: u64,
    downloaded: u64,
    last_reported: u8,
}

impl ProgressTracker {
    fn new(total: u64) -> Self {
        Self {
            total,
            downloaded: 0,
            last_reported: 0,
        }
    }

    fn advance(&mut self, bytes: u64) -> Option<u8> {
        if self.total == 0 {
            return None;
        }

        self.downloaded += bytes;
        let percent = (self.downloaded.saturating_mul(100) / self.total).min(100) as u8;
        let boundary = percent - percent % PROGRESS_STEP;

        if boundary > self.last_reported {
            self.last_reported = boundary;
            Some(boundary)
        } else {
            None
        }
    }
}
