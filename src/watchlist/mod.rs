//! Channel watchlist: download recent uploads of followed YouTube channels.
//!
//! Each run reads the channel list, fetches every channel's Atom feed,
//! and hands videos published within the age window to the downloader.
//! Downloaded ids are appended to a cache file so they are never fetched
//! twice.

pub mod cache;
pub mod channel;
pub mod feed;
pub mod http;

use cache::DownloadCache;
use channel::ChannelRef;
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Errors from the watchlist.
#[derive(Debug, thiserror::Error)]
pub enum WatchlistError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("http error for {url}: {reason}")]
    Http { url: String, reason: String },
    #[error("feed parse error: {0}")]
    Feed(#[from] quick_xml::Error),
    #[error("could not resolve handle @{0}")]
    UnresolvedHandle(String),
    #[error("download of {video_id} failed: {reason}")]
    Download { video_id: String, reason: String },
}

/// Fetches a URL's body as text.
pub trait Fetcher {
    fn get(&self, url: &str) -> Result<String, WatchlistError>;
}

/// Downloads one video by id.
pub trait Downloader {
    fn download(&self, video_id: &str) -> Result<(), WatchlistError>;
}

/// `yt-dlp` into a fixed directory.
pub struct YtDlp {
    pub program: String,
    pub format: String,
    pub dir: PathBuf,
}

impl YtDlp {
    /// Output template: `<dir>/<title> [<id>].<ext>`.
    pub fn output_template(&self) -> String {
        self.dir
            .join("%(title)s [%(id)s].%(ext)s")
            .to_string_lossy()
            .into_owned()
    }
}

impl Downloader for YtDlp {
    fn download(&self, video_id: &str) -> Result<(), WatchlistError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| WatchlistError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let url = format!("https://www.youtube.com/watch?v={}", video_id);
        info!("downloading {}", url);
        let status = Command::new(&self.program)
            .args(["-f", &self.format, &url, "-o", &self.output_template()])
            .stdin(Stdio::null())
            .status()
            .map_err(|e| WatchlistError::Download {
                video_id: video_id.to_string(),
                reason: format!("failed to run {}: {}", self.program, e),
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(WatchlistError::Download {
                video_id: video_id.to_string(),
                reason: format!("{} exited with {}", self.program, status),
            })
        }
    }
}

/// Counters from one watchlist run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub channels: usize,
    pub failed_channels: usize,
    pub downloaded: Vec<String>,
    pub failed_downloads: usize,
}

/// One pass over all channels.
///
/// A channel whose feed cannot be fetched or parsed is skipped; a failed
/// download is not cached, so it is retried on the next run.
pub fn run<F: Fetcher, D: Downloader>(
    channels: &[ChannelRef],
    cache: &mut DownloadCache,
    fetcher: &F,
    downloader: &D,
    now: DateTime<Utc>,
    max_age: Duration,
) -> Result<RunSummary, WatchlistError> {
    let mut summary = RunSummary {
        channels: channels.len(),
        ..Default::default()
    };
    for ch in channels {
        let entries = match channel::fetch_feed(ch, fetcher).and_then(|xml| feed::parse_feed(&xml))
        {
            Ok(entries) => entries,
            Err(e) => {
                warn!("failed fetching feed for {}: {}", ch, e);
                summary.failed_channels += 1;
                continue;
            }
        };
        for entry in entries {
            if cache.contains(&entry.video_id) || !feed::is_recent(&entry.published, now, max_age) {
                continue;
            }
            match downloader.download(&entry.video_id) {
                Ok(()) => {
                    cache.record(&entry.video_id)?;
                    summary.downloaded.push(entry.video_id);
                }
                Err(e) => {
                    warn!("{}", e);
                    summary.failed_downloads += 1;
                }
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct MapFetcher(HashMap<String, String>);

    impl Fetcher for MapFetcher {
        fn get(&self, url: &str) -> Result<String, WatchlistError> {
            self.0.get(url).cloned().ok_or_else(|| WatchlistError::Http {
                url: url.into(),
                reason: "404".into(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingDownloader {
        got: RefCell<Vec<String>>,
        refuse: Option<String>,
    }

    impl Downloader for RecordingDownloader {
        fn download(&self, video_id: &str) -> Result<(), WatchlistError> {
            if self.refuse.as_deref() == Some(video_id) {
                return Err(WatchlistError::Download {
                    video_id: video_id.into(),
                    reason: "refused".into(),
                });
            }
            self.got.borrow_mut().push(video_id.into());
            Ok(())
        }
    }

    fn feed_xml(entries: &[(&str, &str)]) -> String {
        let body: String = entries
            .iter()
            .map(|(id, published)| {
                format!(
                    "<entry><yt:videoId>{}</yt:videoId><published>{}</published></entry>",
                    id, published
                )
            })
            .collect();
        format!(
            r#"<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns="http://www.w3.org/2005/Atom">{}</feed>"#,
            body
        )
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-10T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn downloads_recent_uncached_videos() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = DownloadCache::load(dir.path().join("cache.txt")).unwrap();
        cache.record("old-but-cached").unwrap();

        let id_url = channel::feed_url_for_id("UCabc");
        let user_url = channel::feed_url_for_user("legacy");
        let fetcher = MapFetcher(HashMap::from([
            (
                id_url,
                feed_xml(&[
                    ("fresh1", "2024-05-10T08:00:00+00:00"),
                    ("old-but-cached", "2024-05-10T09:00:00+00:00"),
                    ("stale", "2024-05-01T08:00:00+00:00"),
                ]),
            ),
            (user_url, feed_xml(&[("fresh2", "2024-05-09T20:00:00+00:00")])),
        ]));
        let dl = RecordingDownloader::default();
        let channels = vec![
            ChannelRef::parse("UCabc").unwrap(),
            ChannelRef::parse("missing-user").unwrap(),
            ChannelRef::parse("legacy").unwrap(),
        ];

        let summary = run(&channels, &mut cache, &fetcher, &dl, now(), Duration::hours(72)).unwrap();
        assert_eq!(summary.channels, 3);
        assert_eq!(summary.failed_channels, 1);
        assert_eq!(summary.downloaded, vec!["fresh1".to_string(), "fresh2".to_string()]);
        assert_eq!(*dl.got.borrow(), summary.downloaded);
        assert!(cache.contains("fresh1"));

        let reloaded = DownloadCache::load(dir.path().join("cache.txt")).unwrap();
        assert!(reloaded.contains("fresh2"));
    }

    #[test]
    fn failed_download_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = DownloadCache::load(dir.path().join("cache.txt")).unwrap();
        let fetcher = MapFetcher(HashMap::from([(
            channel::feed_url_for_id("UCx"),
            feed_xml(&[("v1", "2024-05-10T11:00:00+00:00")]),
        )]));
        let dl = RecordingDownloader {
            refuse: Some("v1".into()),
            ..Default::default()
        };
        let channels = vec![ChannelRef::parse("UCx").unwrap()];
        let summary = run(&channels, &mut cache, &fetcher, &dl, now(), Duration::hours(72)).unwrap();
        assert_eq!(summary.failed_downloads, 1);
        assert!(!cache.contains("v1"));
    }

    #[test]
    fn output_template_lives_in_download_dir() {
        let y = YtDlp {
            program: "yt-dlp".into(),
            format: "18".into(),
            dir: PathBuf::from("/videos"),
        };
        assert_eq!(y.output_template(), "/videos/%(title)s [%(id)s].%(ext)s");
    }
}
