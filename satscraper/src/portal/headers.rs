//! Header sets the portal expects on each kind of request.

use crate::http::Headers;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "es-MX,es;q=0.9,en;q=0.8";

fn headers(pairs: &[(&str, &str)]) -> Headers {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
        .collect()
}

/// Headers for a plain page navigation.
#[must_use]
pub fn get() -> Headers {
    headers(&[("Accept", ACCEPT_HTML), ("Accept-Language", ACCEPT_LANGUAGE)])
}

/// Headers for a navigation coming from `referer`.
#[must_use]
pub fn get_with_referer(referer: &str) -> Headers {
    let mut map = get();
    map.insert("Referer".to_string(), referer.to_string());
    map
}

/// Headers for a regular form submission.
#[must_use]
pub fn post(origin: &str, referer: &str) -> Headers {
    let mut map = headers(&[
        ("Accept", ACCEPT_HTML),
        ("Accept-Language", ACCEPT_LANGUAGE),
        ("Cache-Control", "max-age=0"),
        ("Upgrade-Insecure-Requests", "1"),
    ]);
    map.insert("Origin".to_string(), origin.to_string());
    map.insert("Referer".to_string(), referer.to_string());
    map
}

/// Headers for an ASP.NET partial postback.
#[must_use]
pub fn post_ajax(origin: &str, referer: &str) -> Headers {
    let mut map = post(origin, referer);
    map.insert("X-MicrosoftAjax".to_string(), "Delta=true".to_string());
    map.insert("X-Requested-With".to_string(), "XMLHttpRequest".to_string());
    map.insert("Accept".to_string(), "*/*".to_string());
    map
}
