//! Choice labels and per-sample choice sets

use serde::{Deserialize, Serialize};

/// One of the three answer slots presented to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChoiceLabel {
    A,
    B,
    C,
}

impl ChoiceLabel {
    pub const ALL: [ChoiceLabel; 3] = [ChoiceLabel::A, ChoiceLabel::B, ChoiceLabel::C];

    /// Map an (upper- or lower-case) letter to its label
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(ChoiceLabel::A),
            'B' => Some(ChoiceLabel::B),
            'C' => Some(ChoiceLabel::C),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            ChoiceLabel::A => 'A',
            ChoiceLabel::B => 'B',
            ChoiceLabel::C => 'C',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChoiceLabel::A => "A",
            ChoiceLabel::B => "B",
            ChoiceLabel::C => "C",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for ChoiceLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChoiceLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                ChoiceLabel::from_char(c).ok_or_else(|| format!("Unknown choice label: {}", s))
            }
            _ => Err(format!("Unknown choice label: {}", s)),
        }
    }
}

/// Normalized form used for every comparison between choice texts
pub fn normalize_choice(text: &str) -> String {
    text.trim().to_lowercase()
}

/// The three choice texts of one presented permutation, keyed by label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceSet {
    texts: [String; 3],
    #[serde(skip)]
    normalized: [String; 3],
}

impl ChoiceSet {
    pub fn new(a: impl Into<String>, b: impl Into<String>, c: impl Into<String>) -> Self {
        let texts = [a.into(), b.into(), c.into()];
        let normalized = [
            normalize_choice(&texts[0]),
            normalize_choice(&texts[1]),
            normalize_choice(&texts[2]),
        ];
        Self { texts, normalized }
    }

    /// Choice text as presented
    pub fn text(&self, label: ChoiceLabel) -> &str {
        &self.texts[label.index()]
    }

    /// Lower-cased, trimmed choice text
    pub fn normalized(&self, label: ChoiceLabel) -> &str {
        &self.normalized[label.index()]
    }

    /// Label whose text equals `text` after normalization.
    ///
    /// Returns `None` when nothing matches and also when more than one
    /// choice matches, so colliding choice sets never resolve silently.
    pub fn label_of(&self, text: &str) -> Option<ChoiceLabel> {
        let needle = normalize_choice(text);
        let mut matches = ChoiceLabel::ALL
            .into_iter()
            .filter(|l| self.normalized(*l) == needle);
        let first = matches.next()?;
        match matches.next() {
            Some(_) => None,
            None => Some(first),
        }
    }

    /// True when two labels share the same normalized text
    pub fn has_collisions(&self) -> bool {
        let [a, b, c] = &self.normalized;
        a == b || a == c || b == c
    }
}

/// Rendered the way the audit log stores it: `{'A': '..', 'B': '..', 'C': '..'}`
impl std::fmt::Display for ChoiceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{'A': '{}', 'B': '{}', 'C': '{}'}}",
            self.normalized[0], self.normalized[1], self.normalized[2]
        )
    }
}
