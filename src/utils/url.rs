use url::Url;

const WATCH_HOSTS: [&str; 6] = [
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtube-nocookie.com",
    "www.youtube-nocookie.com",
];

/// Path prefixes that carry the id as the next segment.
const ID_SEGMENTS: [&str; 4] = ["embed", "shorts", "live", "v"];

pub fn is_valid_youtube_url(input: &str) -> bool {
    youtube_video_id(input).is_some()
}

/// Extracts the 11 character video id from the usual YouTube link shapes.
pub fn youtube_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() || input.chars().any(char::is_whitespace) {
        return None;
    }
    let parsed = if input.contains("://") {
        Url::parse(input).ok()?
    } else {
        Url::parse(&format!("https://{input}")).ok()?
    };
    // Parsed schemes are already lowercase.
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?.to_ascii_lowercase();
    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());

    let candidate = if host == "youtu.be" || host == "www.youtu.be" {
        segments.next()?.to_string()
    } else if WATCH_HOSTS.contains(&host.as_str()) {
        match segments.next()? {
            "watch" => parsed
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned())?,
            prefix if ID_SEGMENTS.contains(&prefix) => segments.next()?.to_string(),
            _ => return None,
        }
    } else {
        return None;
    };

    is_video_id(&candidate).then_some(candidate)
}

fn is_video_id(s: &str) -> bool {
    s.len() == 11
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
