//! Channel list entries and their feed URLs.

use super::{Fetcher, WatchlistError};
use log::{debug, warn};
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

const FEED_BASE: &str = "https://www.youtube.com/feeds/videos.xml";

/// One line of `channels.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    /// `UC…` channel id.
    Id(String),
    /// `@handle`, stored without the `@`.
    Handle(String),
    /// Legacy username.
    User(String),
}

impl ChannelRef {
    /// Classify a trimmed, non-empty line.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        Some(if let Some(handle) = line.strip_prefix('@') {
            ChannelRef::Handle(handle.to_string())
        } else if line.starts_with("UC") {
            ChannelRef::Id(line.to_string())
        } else {
            ChannelRef::User(line.to_string())
        })
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelRef::Id(id) => write!(f, "{}", id),
            ChannelRef::Handle(h) => write!(f, "@{}", h),
            ChannelRef::User(u) => write!(f, "{}", u),
        }
    }
}

/// Read the channel list.  A missing file yields an empty list.
pub fn read_channels(path: &Path) -> Result<Vec<ChannelRef>, WatchlistError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("channel list not found: {}", path.display());
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(WatchlistError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    Ok(contents.lines().filter_map(ChannelRef::parse).collect())
}

pub fn feed_url_for_id(channel_id: &str) -> String {
    format!("{}?channel_id={}", FEED_BASE, channel_id)
}

pub fn feed_url_for_user(user: &str) -> String {
    format!("{}?user={}", FEED_BASE, user)
}

pub fn handle_page_url(handle: &str) -> String {
    format!("https://www.youtube.com/@{}", handle)
}

static CHANNEL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""channelId":"(UC[^"]+)""#).expect("channel id pattern"));

/// Pull the first `"channelId":"UC…"` out of a channel page.
pub fn extract_channel_id(html: &str) -> Option<String> {
    CHANNEL_ID
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Feed URL for a channel, resolving handles through their channel page.
pub fn feed_url<F: Fetcher>(channel: &ChannelRef, fetcher: &F) -> Result<String, WatchlistError> {
    match channel {
        ChannelRef::Id(id) => Ok(feed_url_for_id(id)),
        ChannelRef::User(user) => Ok(feed_url_for_user(user)),
        ChannelRef::Handle(handle) => {
            let html = fetcher.get(&handle_page_url(handle))?;
            let id = extract_channel_id(&html)
                .ok_or_else(|| WatchlistError::UnresolvedHandle(handle.clone()))?;
            debug!("resolved @{} to {}", handle, id);
            Ok(feed_url_for_id(&id))
        }
    }
}

/// Fetch the raw Atom feed for a channel.
pub fn fetch_feed<F: Fetcher>(channel: &ChannelRef, fetcher: &F) -> Result<String, WatchlistError> {
    let url = feed_url(channel, fetcher)?;
    fetcher.get(&url)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PageFetcher(&'static str);

    impl Fetcher for PageFetcher {
        fn get(&self, url: &str) -> Result<String, WatchlistError> {
            if url == "https://www.youtube.com/@somecreator" {
                Ok(self.0.to_string())
            } else {
                Err(WatchlistError::Http {
                    url: url.into(),
                    reason: "unexpected".into(),
                })
            }
        }
    }

    #[test]
    fn classifies_lines() {
        assert_eq!(
            ChannelRef::parse("UCxyz"),
            Some(ChannelRef::Id("UCxyz".into()))
        );
        assert_eq!(
            ChannelRef::parse("  @creator \n"),
            Some(ChannelRef::Handle("creator".into()))
        );
        assert_eq!(
            ChannelRef::parse("oldname"),
            Some(ChannelRef::User("oldname".into()))
        );
        assert_eq!(ChannelRef::parse(""), None);
        assert_eq!(ChannelRef::parse("# comment"), None);
    }

    #[test]
    fn reads_channel_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channels.txt");
        std::fs::write(&path, "# mine\nUC123\n\n@handle\nlegacy\n").unwrap();
        let channels = read_channels(&path).unwrap();
        assert_eq!(channels.len(), 3);
        assert_eq!(channels[1].to_string(), "@handle");

        assert!(read_channels(&dir.path().join("none.txt")).unwrap().is_empty());
    }

    #[test]
    fn feed_urls() {
        assert_eq!(
            feed_url_for_id("UCabc"),
            "https://www.youtube.com/feeds/videos.xml?channel_id=UCabc"
        );
        assert_eq!(
            feed_url_for_user("bob"),
            "https://www.youtube.com/feeds/videos.xml?user=bob"
        );
    }

    #[test]
    fn resolves_handle_from_page() {
        let page = r#"<script>var x = {"externalId":"x","channelId":"UCresolved42","title":"t"}</script>"#;
        let url = feed_url(&ChannelRef::Handle("somecreator".into()), &PageFetcher(page)).unwrap();
        assert_eq!(url, feed_url_for_id("UCresolved42"));
    }

    #[test]
    fn unresolvable_handle() {
        let err = feed_url(
            &ChannelRef::Handle("somecreator".into()),
            &PageFetcher("<html>nothing here</html>"),
        )
        .unwrap_err();
        assert!(matches!(err, WatchlistError::UnresolvedHandle(ref h) if h == "somecreator"));
        assert_eq!(extract_channel_id(r#""channelId":"notUC""#), None);
    }

    #[test]
    fn first_channel_id_wins() {
        let page = r#"{"channelId":"UCfirst"} {"channelId":"UCsecond"}"#;
        assert_eq!(extract_channel_id(page).as_deref(), Some("UCfirst"));
        assert_eq!(extract_channel_id(page).as_deref(), Some("UCfirst"));
    }
}
