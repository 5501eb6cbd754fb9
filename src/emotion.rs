//! Emotion labels, detection samples and the classifier wire format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Gameplay emotions a gate can require.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Sad,
    Happy,
    Surprised,
}

impl Emotion {
    pub const ALL: [Emotion; 3] = [Emotion::Sad, Emotion::Happy, Emotion::Surprised];

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Sad => "sad",
            Emotion::Happy => "happy",
            Emotion::Surprised => "surprised",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Emotion::Sad => "SAD",
            Emotion::Happy => "HAPPY",
            Emotion::Surprised => "SURPRISED",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Emotion::Sad => "😢",
            Emotion::Happy => "😄",
            Emotion::Surprised => "😲",
        }
    }

    /// Main gate colour.
    pub fn color(self) -> &'static str {
        match self {
            Emotion::Sad => "#3b82f6",
            Emotion::Happy => "#22c55e",
            Emotion::Surprised => "#f97316",
        }
    }

    /// Translucent variant used for shadows / glow.
    pub fn glow(self) -> &'static str {
        match self {
            Emotion::Sad => "rgba(59,130,246,.35)",
            Emotion::Happy => "rgba(34,197,94,.35)",
            Emotion::Surprised => "rgba(249,115,22,.35)",
        }
    }

    /// Map a raw classifier label (7-class model output) onto a gameplay emotion.
    /// The backend spells surprise as "Suprise"; both spellings are accepted.
    pub fn from_raw_label(raw: &str) -> Option<Emotion> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "happy" => Some(Emotion::Happy),
            "sad" => Some(Emotion::Sad),
            "surprise" | "suprise" | "surprised" => Some(Emotion::Surprised),
            _ => None,
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sad" => Ok(Emotion::Sad),
            "happy" => Ok(Emotion::Happy),
            "surprised" => Ok(Emotion::Surprised),
            _ => Err(GameError::UnknownEmotion(s.to_string())),
        }
    }
}

// --- Detection sample --------------------------------------------------------

/// Latest classification result available to the game.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionSample {
    pub label: Option<Emotion>,
    pub raw_label: Option<String>,
    pub confidence: f64,
    pub face_detected: bool,
    pub timestamp: f64,
}

impl DetectionSample {
    pub fn no_face(timestamp: f64) -> Self {
        Self {
            timestamp,
            ..Self::default()
        }
    }

    pub fn face(label: Emotion, confidence: f64, timestamp: f64) -> Self {
        Self {
            label: Some(label),
            raw_label: None,
            confidence: confidence.clamp(0.0, 1.0),
            face_detected: true,
            timestamp,
        }
    }

    /// A sample only counts for a gate when a face is present.
    pub fn matches(&self, emotion: Emotion) -> bool {
        self.face_detected && self.label == Some(emotion)
    }

    pub fn hud_text(&self) -> String {
        if !self.face_detected {
            return "⚠️ No face detected".to_string();
        }
        match (self.label, self.raw_label.as_deref()) {
            (Some(e), raw) => format!(
                "{} {} ({:.0}%)",
                e.emoji(),
                raw.unwrap_or(e.label()),
                self.confidence * 100.0
            ),
            (None, raw) => format!("😐 {}", raw.unwrap_or("---")),
        }
    }
}

// --- Wire format ---------------------------------------------------------------

/// Inbound message of the game classification socket.
#[derive(Clone, Debug, Deserialize)]
pub struct DetectionMessage {
    pub face_detected: bool,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub raw_label: Option<String>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub error: Option<String>,
}

impl DetectionMessage {
    pub fn into_sample(self, timestamp: f64) -> DetectionSample {
        if !self.face_detected {
            return DetectionSample::no_face(timestamp);
        }
        // Unknown gameplay labels (e.g. a neutral face) keep the face but no label.
        let label = match self.emotion.as_deref() {
            Some(e) => e.parse::<Emotion>().ok(),
            None => self.raw_label.as_deref().and_then(Emotion::from_raw_label),
        };
        DetectionSample {
            label,
            raw_label: self.raw_label,
            confidence: self.confidence.clamp(0.0, 1.0),
            face_detected: true,
            timestamp,
        }
    }
}

pub fn decode_detection(text: &str, timestamp: f64) -> Result<DetectionSample> {
    let msg: DetectionMessage = serde_json::from_str(text).map_err(GameError::MalformedMessage)?;
    if let Some(err) = &msg.error {
        log::debug!("classifier reported: {err}");
    }
    Ok(msg.into_sample(timestamp))
}
