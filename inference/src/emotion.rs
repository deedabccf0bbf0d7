use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Number of classes the model predicts.
pub const NUM_EMOTIONS: usize = 7;

/// Class labels in model output order.
pub const EMOTION_LABELS: [&str; NUM_EMOTIONS] =
    ["anger", "disgust", "fear", "happy", "neutral", "sad", "surprise"];

/// Emotion classes, in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Anger = 0,
    Disgust = 1,
    Fear = 2,
    Happy = 3,
    Neutral = 4,
    Sad = 5,
    Surprise = 6,
}

impl Emotion {
    pub const ALL: [Emotion; NUM_EMOTIONS] = [
        Self::Anger,
        Self::Disgust,
        Self::Fear,
        Self::Happy,
        Self::Neutral,
        Self::Sad,
        Self::Surprise,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        EMOTION_LABELS[self.index()]
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label of a classification: a class, or the `error` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Emotion(Emotion),
    Error,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emotion(e) => e.as_str(),
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Why a classification produced the `error` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceFailure {
    /// No model loaded, tensors missing, or quantization params invalid.
    NotReady,
    /// Feature count differs from the input tensor size.
    InputShape,
    /// The engine rejected an input write.
    WriteInput,
    /// The engine reported a non-success status from invoke.
    Invoke,
    /// The engine rejected an output read.
    ReadOutput,
}

impl fmt::Display for InferenceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "engine not ready"),
            Self::InputShape => write!(f, "input shape mismatch"),
            Self::WriteInput => write!(f, "input write failed"),
            Self::Invoke => write!(f, "invoke failed"),
            Self::ReadOutput => write!(f, "output read failed"),
        }
    }
}

/// Output of one inference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    /// Winning class, or `error`.
    pub label: Label,

    /// Dequantized score of the winning class.
    ///
    /// This is the raw model output. It is a probability only when the
    /// model ends in a normalizing layer; no renormalization is applied.
    pub confidence: f32,

    /// Index of the winning class (0 for failures).
    pub index: usize,

    /// Dequantized scores of all classes, in [`Emotion::ALL`] order.
    pub probabilities: [f32; NUM_EMOTIONS],

    /// Set when `label` is `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<InferenceFailure>,
}

impl ClassificationResult {
    /// Picks the arg-max of `scores`; the first of equal maxima wins.
    pub fn from_scores(scores: [f32; NUM_EMOTIONS]) -> Self {
        let mut index = 0;
        for (i, &s) in scores.iter().enumerate().skip(1) {
            if s > scores[index] {
                index = i;
            }
        }

        let label = Emotion::from_index(index).map_or(Label::Error, Label::Emotion);
        Self {
            label,
            confidence: scores[index],
            index,
            probabilities: scores,
            failure: None,
        }
    }

    /// The `error` sentinel with zero confidence.
    pub fn failure(reason: InferenceFailure) -> Self {
        Self {
            label: Label::Error,
            confidence: 0.0,
            index: 0,
            probabilities: [0.0; NUM_EMOTIONS],
            failure: Some(reason),
        }
    }

    pub fn is_error(&self) -> bool {
        self.label == Label::Error
    }

    pub fn emotion(&self) -> Option<Emotion> {
        match self.label {
            Label::Emotion(e) => Some(e),
            Label::Error => None,
        }
    }
}

impl fmt::Display for ClassificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failure {
            Some(reason) => write!(f, "error ({reason})"),
            None => write!(f, "{} ({:.1}%)", self.label, self.confidence * 100.0),
        }
    }
}
