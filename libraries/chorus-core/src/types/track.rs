/// Track descriptor types
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A resolved, playable item
///
/// Produced by a track resolver and never mutated afterwards. Sessions share
/// descriptors behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    /// Display title
    pub title: String,

    /// Opaque handle the playback driver knows how to open (usually a stream URL)
    pub playable: String,

    /// Canonical page URL for display and re-resolution
    pub source_url: String,

    /// Track length, unknown for live streams
    #[serde(default, with = "duration_secs")]
    pub duration: Option<Duration>,

    /// Thumbnail image URL
    #[serde(default)]
    pub thumbnail: Option<String>,

    /// Uploader or artist name
    #[serde(default)]
    pub uploader: Option<String>,
}

impl TrackDescriptor {
    /// Create a descriptor with the required fields
    pub fn new(
        title: impl Into<String>,
        playable: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            playable: playable.into(),
            source_url: source_url.into(),
            duration: None,
            thumbnail: None,
            uploader: None,
        }
    }

    /// Set the duration
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Set the thumbnail URL
    #[must_use]
    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    /// Set the uploader
    #[must_use]
    pub fn with_uploader(mut self, uploader: impl Into<String>) -> Self {
        self.uploader = Some(uploader.into());
        self
    }

    /// Duration formatted for display (`mm:ss`, or `hh:mm:ss` past an hour)
    pub fn display_duration(&self) -> String {
        format_duration(self.duration)
    }
}

/// Format an optional duration as `mm:ss` or `hh:mm:ss`
pub fn format_duration(duration: Option<Duration>) -> String {
    let Some(duration) = duration else {
        return "unknown".to_string();
    };

    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs = Option::<f64>::deserialize(d)?;
        Ok(secs
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(Duration::from_secs_f64))
    }
}
