use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A social platform the pipeline can collect mentions from.
///
/// Variant order is the order platforms appear in aggregated reports and in
/// the flattened mention sequence handed to the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    LinkedIn,
    Instagram,
    X,
    YouTube,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::LinkedIn,
        Platform::Instagram,
        Platform::X,
        Platform::YouTube,
    ];

    /// Lowercase identifier used in config keys, logs, and provider requests.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Platform::LinkedIn => "linkedin",
            Platform::Instagram => "instagram",
            Platform::X => "x",
            Platform::YouTube => "youtube",
        }
    }

    /// Human-readable label for reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Platform::LinkedIn => "LinkedIn",
            Platform::Instagram => "Instagram",
            Platform::X => "X/Twitter",
            Platform::YouTube => "YouTube",
        }
    }

    /// Classify a URL by host.
    ///
    /// Returns `None` for hosts that do not belong to a supported platform.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Platform> {
        let host = host_of(url)?;
        let matches = |domain: &str| host == domain || host.ends_with(&format!(".{domain}"));

        if matches("linkedin.com") {
            Some(Platform::LinkedIn)
        } else if matches("instagram.com") {
            Some(Platform::Instagram)
        } else if matches("youtube.com") || matches("youtu.be") {
            Some(Platform::YouTube)
        } else if matches("x.com") || matches("twitter.com") {
            Some(Platform::X)
        } else {
            None
        }
    }
}

/// Extract the lowercase host from an absolute URL without pulling in a URL parser.
fn host_of(url: &str) -> Option<String> {
    let rest = url.trim().split_once("://").map_or(url.trim(), |(_, r)| r);
    let authority = rest.split(['/', '?', '#']).next()?;
    let host = authority.rsplit('@').next()?.split(':').next()?;
    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linkedin" => Ok(Platform::LinkedIn),
            "instagram" | "insta" => Ok(Platform::Instagram),
            "x" | "twitter" | "x/twitter" => Ok(Platform::X),
            "youtube" | "yt" => Ok(Platform::YouTube),
            _ => Err(CoreError::UnknownPlatform(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases_case_insensitively() {
        assert_eq!("LinkedIn".parse::<Platform>().unwrap(), Platform::LinkedIn);
        assert_eq!("twitter".parse::<Platform>().unwrap(), Platform::X);
        assert_eq!(" X ".parse::<Platform>().unwrap(), Platform::X);
        assert_eq!("YouTube".parse::<Platform>().unwrap(), Platform::YouTube);
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let err = "myspace".parse::<Platform>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownPlatform(ref s) if s == "myspace"));
    }

    #[test]
    fn classifies_urls_by_host() {
        assert_eq!(
            Platform::from_url("https://www.linkedin.com/posts/acme-123"),
            Some(Platform::LinkedIn)
        );
        assert_eq!(
            Platform::from_url("https://instagram.com/p/abc/"),
            Some(Platform::Instagram)
        );
        assert_eq!(
            Platform::from_url("https://youtu.be/xyz"),
            Some(Platform::YouTube)
        );
        assert_eq!(
            Platform::from_url("https://twitter.com/acme/status/1"),
            Some(Platform::X)
        );
        assert_eq!(
            Platform::from_url("https://x.com/acme/status/1"),
            Some(Platform::X)
        );
    }

    #[test]
    fn lookalike_hosts_are_not_classified() {
        assert_eq!(Platform::from_url("https://box.com/file"), None);
        assert_eq!(Platform::from_url("https://notlinkedin.com/x"), None);
        assert_eq!(Platform::from_url(""), None);
    }

    #[test]
    fn slug_round_trips_through_from_str() {
        for platform in Platform::ALL {
            assert_eq!(platform.slug().parse::<Platform>().unwrap(), platform);
        }
    }
}
