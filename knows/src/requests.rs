//! Typed requests parsed from tool call arguments.
//!
//! Each request doubles as the JSON body sent upstream, so nothing untyped
//! crosses from a tool call into the HTTP client.

use ktooling::{
    ToolArgs, ToolError, indexed, optional_bool, optional_i64, optional_string,
    optional_string_array, required_object_array, required_string,
};
use serde::Serialize;

use crate::{AnswerType, DataScope, EvidenceKind, normalize_data_scopes};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    #[serde(rename = "query")]
    pub question: String,
    pub data_scope: Vec<DataScope>,
}

impl SearchRequest {
    /// An omitted or empty scope falls back to `default_scope`, then to every scope.
    pub fn from_args(args: &ToolArgs, default_scope: &[DataScope]) -> Result<Self, ToolError> {
        let question = required_string(args, "question")?;
        let mut data_scope = normalize_data_scopes(&optional_string_array(args, "data_scope")?)?;
        if data_scope.is_empty() {
            data_scope = default_scope.to_vec();
        }
        if data_scope.is_empty() {
            data_scope = DataScope::ALL.to_vec();
        }

        Ok(Self {
            question,
            data_scope,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRequest {
    pub question_id: String,
    pub answer_type: AnswerType,
}

impl AnswerRequest {
    pub fn from_args(args: &ToolArgs) -> Result<Self, ToolError> {
        let question_id = required_string(args, "question_id")?;
        let answer_type = AnswerType::parse(&required_string(args, "answer_type")?)?;
        Ok(Self {
            question_id,
            answer_type,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvidenceRequest {
    pub evidence_id: String,
}

impl EvidenceRequest {
    pub fn from_args(args: &ToolArgs) -> Result<Self, ToolError> {
        Ok(Self {
            evidence_id: required_string(args, "evidence_id")?,
        })
    }
}

/// Detail lookup body. The translation flag is only sent when supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailRequest {
    pub evidence_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translate_to_chinese: Option<bool>,
}

impl DetailRequest {
    pub fn new(evidence_id: impl Into<String>, translate_to_chinese: Option<bool>) -> Self {
        Self {
            evidence_id: evidence_id.into(),
            translate_to_chinese,
        }
    }

    pub fn from_args(args: &ToolArgs) -> Result<Self, ToolError> {
        let evidence_id = required_string(args, "evidence_id")?;
        let translate_to_chinese = optional_bool(args, "translate_to_chinese")?;
        Ok(Self::new(evidence_id, translate_to_chinese))
    }

    /// Same lookup without the translation flag.
    pub fn untranslated(&self) -> Self {
        Self::new(self.evidence_id.clone(), None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceDetailRequest {
    pub kind: EvidenceKind,
    pub detail: DetailRequest,
}

impl EvidenceDetailRequest {
    pub fn from_args(args: &ToolArgs) -> Result<Self, ToolError> {
        let detail = DetailRequest::from_args(args)?;
        let kind = DataScope::parse_evidence_type(&required_string(args, "type")?)?;
        Ok(Self { kind, detail })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggingRequest {
    pub tagging_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_id: Option<String>,
}

impl TaggingRequest {
    pub fn from_args(args: &ToolArgs) -> Result<Self, ToolError> {
        Ok(Self {
            tagging_type: required_string(args, "tagging_type")?,
            content: optional_string(args, "content")?,
            evidence_id: optional_string(args, "evidence_id")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
}

impl ListRequest {
    pub fn from_args(args: &ToolArgs) -> Result<Self, ToolError> {
        Ok(Self {
            from_time: optional_i64(args, "from_time")?,
            to_time: optional_i64(args, "to_time")?,
            page: optional_i64(args, "page")?,
            page_size: optional_i64(args, "page_size")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchAnswerRequest {
    pub items: Vec<AnswerRequest>,
}

impl BatchAnswerRequest {
    pub fn from_args(args: &ToolArgs) -> Result<Self, ToolError> {
        let items = required_object_array(args, "requests")?
            .into_iter()
            .enumerate()
            .map(|(index, item)| AnswerRequest::from_args(item).map_err(indexed("requests", index)))
            .collect::<Result<Vec<_>, _>>()?;

        if items.is_empty() {
            return Err(ToolError::invalid_arguments("requests must not be empty"));
        }
        Ok(Self { items })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvidenceItem {
    pub evidence_id: String,
    #[serde(rename = "type")]
    pub kind: EvidenceKind,
}

impl EvidenceItem {
    pub fn from_args(args: &ToolArgs) -> Result<Self, ToolError> {
        let evidence_id = required_string(args, "evidence_id")?;
        let kind = DataScope::parse_evidence_type(&required_string(args, "type")?)?;
        Ok(Self { evidence_id, kind })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEvidenceRequest {
    pub items: Vec<EvidenceItem>,
    pub translate_to_chinese: Option<bool>,
}

impl BatchEvidenceRequest {
    pub fn from_args(args: &ToolArgs) -> Result<Self, ToolError> {
        let items = required_object_array(args, "evidences")?
            .into_iter()
            .enumerate()
            .map(|(index, item)| EvidenceItem::from_args(item).map_err(indexed("evidences", index)))
            .collect::<Result<Vec<_>, _>>()?;

        if items.is_empty() {
            return Err(ToolError::invalid_arguments("evidences must not be empty"));
        }

        Ok(Self {
            items,
            translate_to_chinese: optional_bool(args, "translate_to_chinese")?,
        })
    }
}
