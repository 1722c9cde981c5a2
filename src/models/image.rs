use serde::{Deserialize, Serialize};

/// Media kind reported by the APOD service. Most entries are images; a few
/// days publish videos instead. Unknown values are carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MediaType {
    Image,
    Video,
    Other(String),
}

impl MediaType {
    pub fn as_str(&self) -> &str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Other(other) => other,
        }
    }
}

impl Default for MediaType {
    fn default() -> Self {
        MediaType::Image
    }
}

impl From<String> for MediaType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "image" => MediaType::Image,
            "video" => MediaType::Video,
            _ => MediaType::Other(value),
        }
    }
}

impl From<MediaType> for String {
    fn from(value: MediaType) -> Self {
        value.as_str().to_string()
    }
}

/// One APOD entry. `date` (YYYY-MM-DD) is the natural key: the API is looked
/// up by date and the favorites table enforces at most one row per date.
///
/// A record parsed from the API is transient (`id: None`) until it is
/// inserted into the favorites store, which assigns the local id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: Option<i64>,
    pub title: String,
    pub date: String,
    pub explanation: String,
    pub url: String,
    pub hd_url: String,
    pub media_type: MediaType,
    pub copyright: String,
}

impl ImageRecord {
    pub fn is_video(&self) -> bool {
        self.media_type == MediaType::Video
    }

    /// Short one-line form for list output.
    pub fn summary(&self) -> String {
        format!("{} ({})", self.title, self.date)
    }
}
