use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use url::{Url, form_urlencoded};

// Known URL shapes, the identifier is the last capture group
static VIDEO_ID_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)^.*((youtu.be/)|(v/)|(/u/w/)|(embed/)|(watch\?))\??v?=?([^#&?]*).*$").ok()
});

const ID_CAPTURE_GROUP: usize = 7;
const VIDEO_ID_LEN: usize = 11;
const LEGACY_ID_LEN: usize = 10;

/// Opaque identifier of a video on the hosting service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the hosting service video id from a URL, `None` if it cannot be resolved
pub fn extract_video_id(url: &str) -> Option<VideoId> {
    if url.is_empty() {
        return None;
    }

    // An explicit `v` query parameter wins over any path shape
    if let Some(id) = query_video_id(url) {
        return Some(VideoId(id));
    }

    match_url_shape(url)
}

fn query_video_id(url: &str) -> Option<String> {
    let query = match Url::parse(url) {
        Ok(parsed) => parsed.query().map(str::to_string)?,
        // Scheme-less and relative references still carry a query
        Err(_) => {
            let (_, rest) = url.split_once('?')?;
            rest.split_once('#').map_or(rest, |(query, _)| query).to_string()
        }
    };

    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        // An empty `v` names no video, so `youtu.be/<id>?v=` still resolves from its path
        .filter(|value| !value.is_empty())
}

fn match_url_shape(url: &str) -> Option<VideoId> {
    if url.trim().is_empty() || !url.starts_with("http") {
        return None;
    }

    let pattern = (*VIDEO_ID_PATTERN).as_ref()?;
    let captured = pattern.captures(url)?.get(ID_CAPTURE_GROUP)?.as_str();

    match captured.chars().count() {
        VIDEO_ID_LEN => Some(VideoId(captured.to_string())),
        // Ten character captures are legacy short ids missing their leading `v`
        LEGACY_ID_LEN => Some(VideoId(format!("v{}", captured))),
        _ => None,
    }
}

/// Check if a reference points at the hosting service
pub fn is_hosted_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }

    match parsed.host_str() {
        Some(host) => {
            let host = host.to_ascii_lowercase();
            host == "youtu.be"
                || host == "youtube.com"
                || host.ends_with(".youtube.com")
                || host == "youtube-nocookie.com"
                || host.ends_with(".youtube-nocookie.com")
        }
        None => false,
    }
}
