//! Built-in tracker/ad host table for the request hook (§4.4 "Request
//! hook"), kept as data rather than code per the same principle the
//! consent vocabulary table follows (§9 "Consent resolver portability").

const TRACKER_HOST_FRAGMENTS: &[&str] = &[
    "google-analytics.com",
    "googletagmanager.com",
    "googlesyndication.com",
    "googleadservices.com",
    "adservice.google.com",
    "doubleclick.net",
    "connect.facebook.net",
    "facebook.com/tr",
    "analytics.tiktok.com",
    "ads.linkedin.com",
    "px.ads.linkedin.com",
    "snap.licdn.com",
    "sc-static.net",
    "hotjar.com",
    "hotjar.io",
    "fullstory.com",
    "mouseflow.com",
    "segment.io",
    "segment.com",
    "mixpanel.com",
    "amplitude.com",
    "criteo.com",
    "criteo.net",
    "scorecardresearch.com",
    "quantserve.com",
    "taboola.com",
    "outbrain.com",
    "bat.bing.com",
    "clarity.ms",
    "pinterest.com/ct",
    "ct.pinterest.com",
    "adsrvr.org",
    "adnxs.com",
    "rlcdn.com",
    "newrelic.com",
    "nr-data.net",
];

/// Whether `url` belongs to a known tracker/analytics host, by substring
/// match against [`TRACKER_HOST_FRAGMENTS`].
#[must_use]
pub fn is_tracker_url(url: &str) -> bool {
    TRACKER_HOST_FRAGMENTS.iter().any(|fragment| url.contains(fragment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_tracker_hosts() {
        assert!(is_tracker_url("https://www.google-analytics.com/collect?v=1"));
        assert!(is_tracker_url("https://connect.facebook.net/en_US/fbevents.js"));
    }

    #[test]
    fn does_not_match_ordinary_site_assets() {
        assert!(!is_tracker_url("https://shop.example.com/assets/app.js"));
    }
}
