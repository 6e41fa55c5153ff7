//! YouTube URL helpers.

use url::Url;

/// Extracts the video ID from a YouTube URL.
///
/// Accepts `youtu.be/<id>`, and on `youtube.com`/`www.youtube.com` the
/// `/watch?v=<id>`, `/embed/<id>` and `/v/<id>` forms. Anything else yields `None`.
pub fn extract_video_id(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    let host = parsed.host_str()?;

    let id = match host {
        "youtu.be" => parsed.path().trim_start_matches('/').to_string(),
        "www.youtube.com" | "youtube.com" => {
            let path = parsed.path();
            if path == "/watch" {
                parsed
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned())?
            } else if let Some(rest) = path
                .strip_prefix("/embed/")
                .or_else(|| path.strip_prefix("/v/"))
            {
                rest.split('/').next().unwrap_or_default().to_string()
            } else {
                return None;
            }
        }
        _ => return None,
    };

    if id.is_empty() { None } else { Some(id) }
}

/// Default thumbnail for a video ID.
pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{video_id}/0.jpg")
}

/// Formats seconds as `m:ss`. Negative or non-finite input renders as `0:00`.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
