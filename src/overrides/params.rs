//! Launch parameters parsed from the page URL's query string.

use std::collections::HashMap;

use url::Url;

use crate::types::FrameId;

/// Query parameter whose presence marks a launch inside the host frame.
pub const FRAME_ID_PARAM: &str = "frame_id";

/// The navigational query parameters the page was launched with.
///
/// Only the first occurrence of a repeated key is kept, matching how a
/// browser's `URLSearchParams::get` resolves duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchParams {
    values: HashMap<String, String>,
}

impl LaunchParams {
    /// Parse the query string of a full launch URL.
    pub fn from_url(url: &Url) -> Self {
        Self::collect(url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())))
    }

    /// Parse a bare query string, with or without the leading `?`.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::collect(
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        )
    }

    fn collect(pairs: impl Iterator<Item = (String, String)>) -> Self {
        let mut values = HashMap::new();
        for (key, value) in pairs {
            values.entry(key).or_insert(value);
        }
        Self { values }
    }

    /// Value of a query parameter. An empty value still counts as present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The host frame id, if the page was launched inside the host.
    pub fn frame_id(&self) -> Option<FrameId> {
        self.get(FRAME_ID_PARAM).map(FrameId::new)
    }

    pub fn is_embedded(&self) -> bool {
        self.values.contains_key(FRAME_ID_PARAM)
    }
}
