//! Configuration management for the bias evaluation
//!
//! Loads evaluation settings from TOML files and provides runtime access.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::{Granularity, InconsistencyBasis};

/// "Unknown" choice texts, one per prompt id (1-based)
pub const ENGLISH_UNKNOWN_ANSWERS: [&str; 5] = [
    "Unknown",
    "Not enough information",
    "Cannot be determined",
    "Unspecified",
    "Unanswerable",
];

pub const KOREAN_UNKNOWN_ANSWERS: [&str; 5] = [
    "알 수 없음",
    "보기 중 답을 찾을 수 없음",
    "주어진 정보만으로는 답을 알 수 없음",
    "정답 없음",
    "답을 확정할 수 없음",
];

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Language of the benchmark samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Korean,
    English,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Korean => "korean",
            Language::English => "english",
        }
    }

    /// Built-in "unknown" choice texts of this language
    pub fn unknown_answers(&self) -> &'static [&'static str; 5] {
        match self {
            Language::Korean => &KOREAN_UNKNOWN_ANSWERS,
            Language::English => &ENGLISH_UNKNOWN_ANSWERS,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Labeling and aggregation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default)]
    pub language: Language,
    /// Prompt variant; selects the built-in "unknown" choice text
    #[serde(default = "default_prompt_id")]
    pub prompt_id: usize,
    /// Explicit "unknown" choice text, overriding the built-in table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown_answer: Option<String>,
    /// Identity polarity markers that denote a biased disambiguated context
    #[serde(default = "default_biased_suffixes")]
    pub biased_suffixes: Vec<char>,
    #[serde(default)]
    pub granularity: Granularity,
    #[serde(default)]
    pub inconsistency_basis: InconsistencyBasis,
    /// Append one quick-mode row per template after the category rows
    #[serde(default)]
    pub group_by_template: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            prompt_id: default_prompt_id(),
            unknown_answer: None,
            biased_suffixes: default_biased_suffixes(),
            granularity: Granularity::default(),
            inconsistency_basis: InconsistencyBasis::default(),
            group_by_template: false,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_results_dir")]
    pub results_dir: String,
    #[serde(default)]
    pub write_json: bool,
    /// Out-of-choice audit log written by `extract`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ooc_log: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            write_json: false,
            ooc_log: None,
        }
    }
}

// Default value functions
fn default_prompt_id() -> usize { 1 }
fn default_biased_suffixes() -> Vec<char> { vec!['b'] }
fn default_results_dir() -> String { "results/evaluation".to_string() }

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default config location or return defaults
    pub fn load_or_default() -> Self {
        let config_paths = [
            "config/eval.toml",
            "../config/eval.toml",
            "bias-eval/config/eval.toml",
        ];

        for path in &config_paths {
            match Self::from_file(path) {
                Ok(config) => {
                    tracing::info!("Loaded configuration from {}", path);
                    return config;
                }
                Err(ConfigError::Io(_)) => {}
                Err(e) => tracing::warn!("Ignoring {}: {}", path, e),
            }
        }

        tracing::info!("Using default configuration");
        Self::default()
    }

    /// Save configuration to a TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
            }
        }
        fs::write(path, content)
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.unknown_answer().map(|_| ())
    }

    /// The "unknown" choice text used for labeling
    pub fn unknown_answer(&self) -> Result<String, ConfigError> {
        let eval = &self.evaluation;
        if let Some(answer) = &eval.unknown_answer {
            return Ok(answer.clone());
        }

        let table = eval.language.unknown_answers();
        eval.prompt_id
            .checked_sub(1)
            .and_then(|i| table.get(i))
            .map(|s| s.to_string())
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "prompt_id {} is outside 1..={}",
                    eval.prompt_id,
                    table.len()
                ))
            })
    }
}

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.evaluation.language, Language::Korean);
        assert_eq!(config.evaluation.granularity, Granularity::Full);
        assert_eq!(config.evaluation.biased_suffixes, vec!['b']);
        assert_eq!(config.unknown_answer().unwrap(), "알 수 없음");
    }

    #[test]
    fn test_parse_toml_config() {
        let toml = r#"
[evaluation]
language = "english"
prompt_id = 3
biased_suffixes = ["b", "d"]
granularity = "quick"
inconsistency_basis = "choice_text"

[output]
results_dir = "out"
write_json = true
"#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.unknown_answer().unwrap(), "Cannot be determined");
        assert_eq!(config.evaluation.biased_suffixes, vec!['b', 'd']);
        assert_eq!(config.evaluation.granularity, Granularity::Quick);
        assert_eq!(
            config.evaluation.inconsistency_basis,
            InconsistencyBasis::ChoiceText
        );
        assert_eq!(config.output.results_dir, "out");
        assert!(config.output.ooc_log.is_none());
    }

    #[test]
    fn test_unknown_answer_override() {
        let config = Config::from_toml(
            "[evaluation]\nprompt_id = 9\nunknown_answer = \"모름\"\n",
        )
        .unwrap();
        assert_eq!(config.unknown_answer().unwrap(), "모름");
    }

    #[test]
    fn test_prompt_id_out_of_range() {
        let err = Config::from_toml("[evaluation]\nprompt_id = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(Config::from_toml("[evaluation]\nprompt_id = 6\n").is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config").join("eval.toml");

        let mut config = Config::default();
        config.evaluation.language = Language::English;
        config.evaluation.group_by_template = true;
        config.save_toml(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.evaluation.language, Language::English);
        assert!(loaded.evaluation.group_by_template);
        assert_eq!(loaded.unknown_answer().unwrap(), "Unknown");
    }
}
