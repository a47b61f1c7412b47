//! Local (client-side) shape checks for candidate links. Keep logic minimal
//! and deterministic: no network, no hidden state between calls.

use std::fmt::{Display, Formatter};

/// Why a candidate was rejected before any network call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocalRejection {
    /// Does not start with an accepted host prefix.
    WrongKind,
    /// Right host, but points at an individual item (or nothing) rather than a channel.
    WrongShape,
}

impl LocalRejection {
    pub fn message(&self) -> &'static str {
        match self {
            LocalRejection::WrongKind => "Wrong kind of link: please submit a YouTube channel link",
            LocalRejection::WrongShape => {
                "Wrong link shape: submit the channel link, not a single video"
            }
        }
    }
}

impl Display for LocalRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for LocalRejection {}

/// Accepted resource family and the per-item shapes excluded from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkRules {
    accepted_prefixes: Vec<String>,
    disallowed_segments: Vec<String>,
}

impl LinkRules {
    pub fn new<P, S>(accepted_prefixes: P, disallowed_segments: S) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            accepted_prefixes: accepted_prefixes.into_iter().map(Into::into).collect(),
            disallowed_segments: disallowed_segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Check a raw input. Returns the trimmed candidate when it is accepted.
    ///
    /// Accepted iff it starts with an accepted prefix AND the first non-empty
    /// path segment after that prefix exists and is not a disallowed
    /// per-item segment.
    pub fn check<'a>(&self, raw: &'a str) -> Result<&'a str, LocalRejection> {
        let trimmed = raw.trim();
        let Some(rest) = self
            .accepted_prefixes
            .iter()
            .find_map(|p| trimmed.strip_prefix(p.as_str()))
        else {
            return Err(LocalRejection::WrongKind);
        };

        // Extra slashes do not hide the segment; the bare site root names no channel
        let segment = first_segment(rest.trim_start_matches('/'));
        if segment.is_empty()
            || self
                .disallowed_segments
                .iter()
                .any(|d| d.eq_ignore_ascii_case(segment))
        {
            return Err(LocalRejection::WrongShape);
        }
        Ok(trimmed)
    }
}

impl Default for LinkRules {
    /// YouTube channels: individual videos, shorts, embeds and live streams are excluded.
    fn default() -> Self {
        Self::new(
            ["https://www.youtube.com/"],
            ["watch", "shorts", "embed", "live", "v"],
        )
    }
}

// First path segment, stopping at '/', '?' or '#'.
fn first_segment(rest: &str) -> &str {
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    &rest[..end]
}
