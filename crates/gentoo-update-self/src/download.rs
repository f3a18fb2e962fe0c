//! Release download
//!
//! One unauthenticated GET per update, no retries. Every failure surfaces
//! as [`Error::Network`] so the updater can roll back uniformly.

use std::fs::File;
use std::io::Write;
use std::time::Duration;

use gentoo_update_core::config::SelfUpdateSettings;
use gentoo_update_core::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use reqwest::Url;
use tracing::{debug, info};

/// Source of the replacement program
pub trait PayloadFetcher {
    /// Write the body found at `url` into `dest`, returning the byte count
    fn fetch(&self, url: &str, dest: &mut File) -> Result<u64>;
}

/// Blocking HTTP fetcher
pub struct HttpFetcher {
    client: Client,
    show_progress: bool,
}

impl HttpFetcher {
    /// Create a fetcher using the configured timeout and user agent
    pub fn new(settings: &SelfUpdateSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| Error::network(host_of(&settings.url), e.to_string()))?;

        Ok(Self {
            client,
            show_progress: true,
        })
    }

    /// Enable or disable the download spinner
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn spinner(&self, host: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} {bytes} ({bytes_per_sec})")
                .expect("Invalid progress bar template"),
        );
        pb.set_message(format!("Downloading from {}", host));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

impl PayloadFetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &mut File) -> Result<u64> {
        let host = host_of(url);
        debug!("GET {}", url);

        let pb = self.spinner(&host);
        let result = self
            .client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|mut response| response.copy_to(&mut pb.wrap_write(&mut *dest)))
            .map_err(|e| Error::network(&host, e.to_string()));
        pb.finish_and_clear();

        let written = result?;
        dest.flush()
            .map_err(|e| Error::network(&host, e.to_string()))?;
        info!("Downloaded {} bytes from {}", written, host);
        Ok(written)
    }
}

/// Host part of `url`, or the whole string when it does not parse
pub fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_of() {
        assert_eq!(
            host_of("http://github.com/tsuehpsyde/easygentoo/raw/master/gentoo-update"),
            "github.com"
        );
        assert_eq!(host_of("not a url"), "not a url");
    }

    #[test]
    fn test_unreachable_host_is_network_error() {
        let settings = SelfUpdateSettings {
            url: "http://127.0.0.1:1/gentoo-update".to_string(),
            timeout_secs: 2,
            user_agent: "gentoo-update-test".to_string(),
            temp_dir: None,
        };
        let fetcher = HttpFetcher::new(&settings).unwrap().with_progress(false);
        let mut file = tempfile::tempfile().unwrap();

        match fetcher.fetch(&settings.url, &mut file) {
            Err(Error::Network { host, .. }) => assert_eq!(host, "127.0.0.1"),
            other => panic!("expected network error, got {:?}", other),
        }
    }
}
