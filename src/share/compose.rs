//! Compose URLs, captions and the app deep link.

use std::borrow::Cow;
use url::Url;

pub const MAX_CAPTION_CHARS: usize = 280;
pub const DEFAULT_COMPOSE_URL: &str = "https://warpcast.com/~/compose";
pub const DEFAULT_APP_URL: &str = "https://farcaster.xyz/miniapps/S9xDZOSiOGWl/castinspo";
pub const DEFAULT_SHARE_CAPTION: &str =
    "Daily vibes via CastInspo ✨ Come for the inspiration, stay for the rewards!";
pub const DEFAULT_REWARD_CAPTION: &str = "I just claimed 2k $teeboo_hl on CastInspo! 🎁 Check in daily to build your streak and earn rewards on Base.";

const QUOTE_PARAM: &str = "q";

/// Cuts captions longer than [`MAX_CAPTION_CHARS`] characters and marks the cut.
pub fn truncate_caption(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(MAX_CAPTION_CHARS) {
        Some((cut, _)) => Cow::Owned(format!("{}...", &text[..cut])),
        None => Cow::Borrowed(text),
    }
}

/// `<base>?text=<caption>&embeds[]=<url>...`
///
/// Links go in `embeds[]` only. Putting the same link in the text as well makes some
/// clients refuse to post.
pub fn compose_url(base: &Url, caption: &str, embeds: &[&str]) -> Url {
    let mut url = base.clone();
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("text", &truncate_caption(caption));
        for embed in embeds {
            query.append_pair("embeds[]", embed);
        }
    }
    url
}

/// `<app url>?q=<quote id>`
pub fn deep_link(app_url: &Url, quote_id: u32) -> Url {
    let mut url = app_url.clone();
    url.query_pairs_mut()
        .clear()
        .append_pair(QUOTE_PARAM, &quote_id.to_string());
    url
}

/// Reads the requested quote index from a launch link, or from a bare `q` value.
///
/// Returns `None` when there is no numeric value. Range checks are left to the
/// selector, so negative values come through as they are.
pub fn quote_index_from_link(link: &str) -> Option<i64> {
    let raw = match Url::parse(link) {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == QUOTE_PARAM)
            .map(|(_, value)| value.into_owned())?,
        Err(_) => link.trim().trim_start_matches("?q=").to_string(),
    };
    leading_integer(raw.trim())
}

/// Parses the signed decimal prefix of `raw`, ignoring whatever follows it.
fn leading_integer(raw: &str) -> Option<i64> {
    let unsigned = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    let digits = unsigned
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if digits == 0 {
        return None;
    }
    let end = raw.len() - unsigned.len() + digits;
    raw[..end].parse().ok()
}
