//! Closed value sets accepted by the evidence service.
//!
//! ```rust
//! use knows::{AnswerType, DataScope, normalize_data_scopes};
//!
//! assert_eq!(DataScope::parse(" paper_cn ").expect("scope should parse"), DataScope::PaperCn);
//! assert_eq!(AnswerType::parse("clinical").expect("type should parse").as_str(), "CLINICAL");
//!
//! let scopes = normalize_data_scopes(&["guide", "PAPER", "Guide"]).expect("scopes should parse");
//! assert_eq!(scopes, vec![DataScope::Guide, DataScope::Paper]);
//! ```

use std::fmt::{Display, Formatter};

use ktooling::{ToolError, normalize_choice};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataScope {
    Paper,
    PaperCn,
    Guide,
    Meeting,
}

/// Evidence items are classified with the same values used to scope a search.
pub type EvidenceKind = DataScope;

impl DataScope {
    pub const ALL: [DataScope; 4] = [Self::Paper, Self::PaperCn, Self::Guide, Self::Meeting];
    pub const NAMES: [&'static str; 4] = ["PAPER", "PAPER_CN", "GUIDE", "MEETING"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paper => "PAPER",
            Self::PaperCn => "PAPER_CN",
            Self::Guide => "GUIDE",
            Self::Meeting => "MEETING",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ToolError> {
        Self::parse_labeled(value, "data scope")
    }

    /// Same value set as [`DataScope::parse`], reported as an evidence type.
    pub fn parse_evidence_type(value: &str) -> Result<Self, ToolError> {
        Self::parse_labeled(value, "evidence type")
    }

    fn parse_labeled(value: &str, label: &str) -> Result<Self, ToolError> {
        let normalized = normalize_choice(value, &Self::NAMES, label)?;
        Self::ALL
            .into_iter()
            .find(|scope| scope.as_str() == normalized)
            .ok_or_else(|| ToolError::invalid_arguments(format!("unsupported {label} {value:?}")))
    }
}

impl Display for DataScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnswerType {
    Clinical,
    Research,
    PopularScience,
}

impl AnswerType {
    pub const ALL: [AnswerType; 3] = [Self::Clinical, Self::Research, Self::PopularScience];
    pub const NAMES: [&'static str; 3] = ["CLINICAL", "RESEARCH", "POPULAR_SCIENCE"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clinical => "CLINICAL",
            Self::Research => "RESEARCH",
            Self::PopularScience => "POPULAR_SCIENCE",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ToolError> {
        let normalized = normalize_choice(value, &Self::NAMES, "answer_type")?;
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ToolError::invalid_arguments(format!("unsupported answer_type {value:?}")))
    }
}

impl Display for AnswerType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses every scope, keeping the first occurrence of duplicates.
pub fn normalize_data_scopes<S>(scopes: &[S]) -> Result<Vec<DataScope>, ToolError>
where
    S: AsRef<str>,
{
    let mut out = Vec::with_capacity(scopes.len());
    for scope in scopes {
        let scope = DataScope::parse(scope.as_ref())?;
        if !out.contains(&scope) {
            out.push(scope);
        }
    }
    Ok(out)
}
