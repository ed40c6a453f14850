//! Structured sample identifiers
//!
//! A sample id has six `-`-separated fields:
//! `category-identity-target-context-question-permutation`, e.g.
//! `Age-001a-002-amb-bsd-1`. The last character of the identity field marks
//! the polarity of the disambiguated context.

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, EvalResult};

pub const ID_DELIMITER: char = '-';
pub const ID_FIELD_COUNT: usize = 6;

/// Whether the context carries enough information to answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextCondition {
    Amb,
    Dis,
}

impl ContextCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextCondition::Amb => "amb",
            ContextCondition::Dis => "dis",
        }
    }
}

impl std::fmt::Display for ContextCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContextCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "amb" => Ok(ContextCondition::Amb),
            "dis" => Ok(ContextCondition::Dis),
            _ => Err(format!("unknown context marker '{}'", s)),
        }
    }
}

/// Framing of the question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Question phrased toward the stereotype
    Bsd,
    /// Question phrased against the stereotype
    Cnt,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Bsd => "bsd",
            QuestionType::Cnt => "cnt",
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bsd" => Ok(QuestionType::Bsd),
            "cnt" => Ok(QuestionType::Cnt),
            _ => Err(format!("unknown question marker '{}'", s)),
        }
    }
}

/// A validated sample identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleId {
    pub category: String,
    pub identity_variant: String,
    pub target_group: String,
    pub context: ContextCondition,
    pub question: QuestionType,
    pub permutation: u8,
}

impl SampleId {
    /// Parse and validate an identifier string
    pub fn parse(raw: &str) -> EvalResult<Self> {
        let invalid = |reason: String| EvalError::InvalidSampleId {
            sample_id: raw.to_string(),
            reason,
        };

        let fields: Vec<&str> = raw.trim().split(ID_DELIMITER).collect();
        if fields.len() != ID_FIELD_COUNT {
            return Err(invalid(format!(
                "expected {} fields, found {}",
                ID_FIELD_COUNT,
                fields.len()
            )));
        }
        if let Some(pos) = fields.iter().position(|f| f.is_empty()) {
            return Err(invalid(format!("field {} is empty", pos + 1)));
        }

        let context: ContextCondition = fields[3].parse().map_err(invalid)?;
        let question: QuestionType = fields[4].parse().map_err(invalid)?;
        let permutation = match fields[5] {
            "0" => 0,
            "1" => 1,
            "2" => 2,
            other => return Err(invalid(format!("permutation index '{}' not in 0..=2", other))),
        };

        Ok(Self {
            category: fields[0].to_string(),
            identity_variant: fields[1].to_string(),
            target_group: fields[2].to_string(),
            context,
            question,
            permutation,
        })
    }

    /// Trailing polarity marker of the identity variant
    pub fn polarity_char(&self) -> char {
        // identity_variant is non-empty after parse()
        self.identity_variant.chars().last().unwrap_or_default()
    }

    /// Identity variant with its polarity marker removed
    pub fn identity_prefix(&self) -> &str {
        let cut = self
            .identity_variant
            .char_indices()
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0);
        &self.identity_variant[..cut]
    }

    /// Key shared by both polarities and all targets of one template
    pub fn template_id(&self) -> String {
        format!("{}{}{}", self.category, ID_DELIMITER, self.identity_prefix())
    }

    /// Key shared by the three permutations of one question
    pub fn question_id(&self) -> String {
        [
            self.category.as_str(),
            self.identity_variant.as_str(),
            self.target_group.as_str(),
            self.context.as_str(),
            self.question.as_str(),
        ]
        .join("-")
    }
}

impl std::fmt::Display for SampleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.question_id(), ID_DELIMITER, self.permutation)
    }
}

impl std::str::FromStr for SampleId {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SampleId::parse(s)
    }
}
