use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of labels an undated task is sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskCategory {
    #[serde(rename = "買物")]
    Shopping,
    #[serde(rename = "学校・子育て")]
    SchoolAndChildcare,
    #[serde(rename = "その他")]
    Other,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 3] = [Self::Shopping, Self::SchoolAndChildcare, Self::Other];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Shopping => "買物",
            Self::SchoolAndChildcare => "学校・子育て",
            Self::Other => "その他",
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaskCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// The oracle's answer to a classification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Classification {
    pub category: TaskCategory,
    /// 0..=100.
    #[serde(deserialize_with = "crate::number::confidence")]
    pub confidence: u8,
}

/// An undated task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRecord {
    /// The original message, verbatim.
    pub text: String,
    pub category: TaskCategory,
    /// `None` when the source protocol carries no score.
    pub confidence: Option<u8>,
}

impl TodoRecord {
    pub fn classified(text: impl Into<String>, classification: Classification) -> Self {
        Self {
            text: text.into(),
            category: classification.category,
            confidence: Some(classification.confidence),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_label_round_trip() {
        for category in TaskCategory::ALL {
            assert_eq!(category.label().parse::<TaskCategory>(), Ok(category));
        }
        assert_eq!("料理".parse::<TaskCategory>(), Err("料理".to_string()));
    }

    #[test]
    fn test_classification_decodes() {
        let c: Classification =
            serde_json::from_value(json!({"category": "学校・子育て", "confidence": 85})).unwrap();
        assert_eq!(c.category, TaskCategory::SchoolAndChildcare);
        assert_eq!(c.confidence, 85);
    }

    #[test]
    fn test_classification_rejects_out_of_set_label() {
        let result =
            serde_json::from_value::<Classification>(json!({"category": "仕事", "confidence": 50}));
        assert!(result.is_err());
    }

    #[test]
    fn test_classification_rejects_out_of_range_confidence() {
        let result =
            serde_json::from_value::<Classification>(json!({"category": "その他", "confidence": 150}));
        assert!(result.is_err());
    }
}
