use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Edge(s) of an image the remote service should repaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskDirective {
    Top,
    Bottom,
    Left,
    Right,
    All,
}

impl MaskDirective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
            Self::All => "all",
        }
    }
}

impl fmt::Display for MaskDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaskDirective {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "all" => Ok(Self::All),
            other => Err(format!("unknown expand direction '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    pub model: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub aspect_ratio: Option<String>,
    /// 1..=10; only shapes the prompt of single-key backends.
    pub quality: Option<u8>,
    pub negative_prompt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditOptions {
    pub model: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub aspect_ratio: Option<String>,
    /// Encoded mask image; transparent pixels are kept.
    #[serde(default, skip_serializing)]
    pub mask: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpandOptions {
    pub model: Option<String>,
    pub prompt: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub aspect_ratio: Option<String>,
    /// Zoom out by this factor instead of repainting an edge.
    pub scale_factor: Option<f32>,
}

/// One logical request as sent to a backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub model: String,
    pub mask: Option<String>,
}

impl GenerationRequest {
    pub fn size_label(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Ordered image references returned by one successful call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReferences {
    pub primary: String,
    pub secondary: Vec<String>,
}

impl ImageReferences {
    /// `None` for an empty list; the first reference becomes primary.
    pub fn from_ordered(mut references: Vec<String>) -> Option<Self> {
        if references.is_empty() {
            return None;
        }
        let primary = references.remove(0);
        Some(Self {
            primary,
            secondary: references,
        })
    }

    pub fn count(&self) -> usize {
        1 + self.secondary.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub image_url: String,
    #[serde(default)]
    pub secondary_urls: Vec<String>,
    pub prompt: String,
    pub size: String,
    pub model: String,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl GenerationResult {
    pub fn new(request: &GenerationRequest, references: ImageReferences) -> Self {
        Self {
            image_url: references.primary,
            secondary_urls: references.secondary,
            prompt: request.prompt.clone(),
            size: request.size_label(),
            model: request.model.clone(),
            warnings: Vec::new(),
        }
    }
}
