//! Endpoint methods for the evidence service, with cached detail lookups.
//!
//! ```rust
//! use knows::{DataScope, cache_key};
//!
//! assert_eq!(cache_key(DataScope::Paper, "ev-1", Some(true)), "PAPER:ev-1:true");
//! assert_eq!(cache_key(DataScope::Guide, "ev-1", None), "GUIDE:ev-1:false");
//! assert_eq!(cache_key(DataScope::PaperCn, "ev-1", Some(true)), "PAPER_CN:ev-1:false");
//! ```

use std::sync::Arc;

use kclient::{ApiClient, ClientError};
use kcommon::CancelSignal;
use serde_json::Value;

use crate::{
    AnswerRequest, DataScope, DetailCache, DetailRequest, EvidenceKind, EvidenceRequest,
    KnowsHooks, ListRequest, NoopKnowsHooks, SearchRequest, TaggingRequest,
};

pub mod paths {
    pub const AI_SEARCH: &str = "/knows/ai_search";
    pub const ANSWER: &str = "/knows/answer";
    pub const EVIDENCE_SUMMARY: &str = "/knows/evidence/summary";
    pub const EVIDENCE_HIGHLIGHT: &str = "/knows/evidence/highlight";
    pub const GET_PAPER_EN: &str = "/knows/evidence/get_paper_en";
    pub const GET_PAPER_CN: &str = "/knows/evidence/get_paper_cn";
    pub const GET_GUIDE: &str = "/knows/evidence/get_guide";
    pub const GET_MEETING: &str = "/knows/evidence/get_meeting";
    pub const AUTO_TAGGING: &str = "/knows/auto_tagging";
    pub const LIST_QUESTION: &str = "/knows/list_question";
    /// Upstream spells this endpoint without the "at".
    pub const LIST_INTERPRETATION: &str = "/knows/list_interpretion";
}

/// Cache key for a detail lookup. Chinese papers have no translation variant.
pub fn cache_key(kind: EvidenceKind, evidence_id: &str, translate_to_chinese: Option<bool>) -> String {
    let flag = match kind {
        DataScope::PaperCn => false,
        _ => translate_to_chinese.unwrap_or(false),
    };
    format!("{kind}:{evidence_id}:{flag}")
}

pub fn detail_path(kind: EvidenceKind) -> &'static str {
    match kind {
        DataScope::Paper => paths::GET_PAPER_EN,
        DataScope::PaperCn => paths::GET_PAPER_CN,
        DataScope::Guide => paths::GET_GUIDE,
        DataScope::Meeting => paths::GET_MEETING,
    }
}

#[derive(Clone)]
pub struct KnowsClient {
    api: ApiClient,
    cache: Arc<DetailCache<Value>>,
    hooks: Arc<dyn KnowsHooks>,
}

impl std::fmt::Debug for KnowsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowsClient")
            .field("api", &self.api)
            .field("cache_capacity", &self.cache.capacity())
            .field("cache_ttl", &self.cache.ttl())
            .finish_non_exhaustive()
    }
}

impl KnowsClient {
    pub fn new(api: ApiClient, cache: DetailCache<Value>) -> Self {
        Self {
            api,
            cache: Arc::new(cache),
            hooks: Arc::new(NoopKnowsHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn KnowsHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &DetailCache<Value> {
        &self.cache
    }

    pub async fn ai_search(&self, request: &SearchRequest, signal: &CancelSignal) -> Result<Value, ClientError> {
        self.api.call(paths::AI_SEARCH, request, signal).await
    }

    pub async fn answer(&self, request: &AnswerRequest, signal: &CancelSignal) -> Result<Value, ClientError> {
        self.api.call(paths::ANSWER, request, signal).await
    }

    pub async fn evidence_summary(
        &self,
        request: &EvidenceRequest,
        signal: &CancelSignal,
    ) -> Result<Value, ClientError> {
        self.api.call(paths::EVIDENCE_SUMMARY, request, signal).await
    }

    pub async fn evidence_highlight(
        &self,
        request: &EvidenceRequest,
        signal: &CancelSignal,
    ) -> Result<Value, ClientError> {
        self.api.call(paths::EVIDENCE_HIGHLIGHT, request, signal).await
    }

    pub async fn get_paper_en(&self, request: &DetailRequest, signal: &CancelSignal) -> Result<Value, ClientError> {
        self.fetch_evidence_detail(DataScope::Paper, request, signal).await
    }

    pub async fn get_paper_cn(&self, evidence_id: &str, signal: &CancelSignal) -> Result<Value, ClientError> {
        let request = DetailRequest::new(evidence_id, None);
        self.fetch_evidence_detail(DataScope::PaperCn, &request, signal).await
    }

    pub async fn get_guide(&self, request: &DetailRequest, signal: &CancelSignal) -> Result<Value, ClientError> {
        self.fetch_evidence_detail(DataScope::Guide, request, signal).await
    }

    pub async fn get_meeting(&self, request: &DetailRequest, signal: &CancelSignal) -> Result<Value, ClientError> {
        self.fetch_evidence_detail(DataScope::Meeting, request, signal).await
    }

    pub async fn auto_tagging(&self, request: &TaggingRequest, signal: &CancelSignal) -> Result<Value, ClientError> {
        self.api.call(paths::AUTO_TAGGING, request, signal).await
    }

    pub async fn list_question(&self, request: &ListRequest, signal: &CancelSignal) -> Result<Value, ClientError> {
        self.api.call(paths::LIST_QUESTION, request, signal).await
    }

    pub async fn list_interpretation(
        &self,
        request: &ListRequest,
        signal: &CancelSignal,
    ) -> Result<Value, ClientError> {
        self.api.call(paths::LIST_INTERPRETATION, request, signal).await
    }

    /// Looks up one evidence item by kind, serving repeats from the cache.
    pub async fn fetch_evidence_detail(
        &self,
        kind: EvidenceKind,
        request: &DetailRequest,
        signal: &CancelSignal,
    ) -> Result<Value, ClientError> {
        let key = cache_key(kind, &request.evidence_id, request.translate_to_chinese);
        if let Some(cached) = self.cache.get(&key) {
            self.hooks.on_cache_hit(&key);
            return Ok(cached);
        }
        self.hooks.on_cache_miss(&key);

        let data = match kind {
            DataScope::PaperCn => {
                self.api
                    .call(detail_path(kind), &request.untranslated(), signal)
                    .await?
            }
            _ => self.api.call(detail_path(kind), request, signal).await?,
        };

        self.cache.set(key, data.clone());
        Ok(data)
    }
}
