//! Metric definitions: one collectible statistic of a game.

use serde::{Deserialize, Serialize};

/// How a metric value is resolved after extraction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialType {
    /// Plain text value.
    #[default]
    None,

    /// The extracted value is an image URL. The image is downloaded and the
    /// stored value becomes a local path to it.
    ImageDownload,
}

impl SpecialType {
    pub const fn is_image_download(&self) -> bool {
        matches!(self, Self::ImageDownload)
    }
}

/// Static definition of a single metric.
///
/// Immutable once loaded and owned by exactly one [`crate::GameDefinition`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDefinition {
    /// Metric identifier, unique within its game (e.g. `"Kills"`).
    pub key: String,

    /// Label shown next to the toggle in the metric selector.
    #[serde(default)]
    pub toggle_text: String,

    /// Optional markup rendered as the metric's indicator.
    #[serde(default)]
    pub icon: Option<String>,

    #[serde(default)]
    pub special_type: SpecialType,

    /// JSON pointer (RFC 6901) locating the value in the source payload.
    pub pointer: String,

    /// Optional display template, `%x%` is replaced by the extracted value.
    #[serde(default)]
    pub display_as: Option<String>,
}

impl MetricDefinition {
    pub fn new(key: impl Into<String>, pointer: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            toggle_text: key.clone(),
            key,
            icon: None,
            special_type: SpecialType::None,
            pointer: pointer.into(),
            display_as: None,
        }
    }

    pub fn with_toggle_text(mut self, text: impl Into<String>) -> Self {
        self.toggle_text = text.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_special_type(mut self, special_type: SpecialType) -> Self {
        self.special_type = special_type;
        self
    }

    pub fn with_display_as(mut self, template: impl Into<String>) -> Self {
        self.display_as = Some(template.into());
        self
    }

    /// Returns the icon markup if one is set and non-empty.
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref().filter(|icon| !icon.is_empty())
    }

    /// Applies `display_as` to a raw extracted value.
    pub fn format_value(&self, raw: &str) -> String {
        match &self.display_as {
            Some(template) if template.contains("%x%") => template.replace("%x%", raw),
            _ => raw.to_string(),
        }
    }
}
