use napi::bindgen_prelude::*;
use napi::threadsafe_function::{ErrorStrategy, ThreadsafeFunction, ThreadsafeFunctionCallMode};
use napi::Status;
use napi_derive::napi;
use std::sync::{Arc, Mutex as StdMutex};

use crate::config::AppConfig;
use crate::llm::stream::DisplaySink;
use crate::review::{
    AnalyzedFile, DiffData, GithubUrlKind, ProjectRecord, ReviewConfig, ReviewRecord,
};

pub(crate) type MarkdownHandler = ThreadsafeFunction<CoreMarkdownEvent, ErrorStrategy::CalleeHandled>;

/// Slot shared between a `Reviewer` and the sinks of its running analyses.
pub(crate) type SubscriberSlot = Arc<StdMutex<Option<MarkdownHandler>>>;

pub(crate) fn to_napi_err(e: impl std::fmt::Display) -> Error {
    Error::from_reason(e.to_string())
}

pub(crate) fn load_config() -> Result<AppConfig> {
    AppConfig::load().map_err(|e| Error::from_reason(format!("Failed to load config: {}", e)))
}

#[napi(object)]
#[derive(Clone)]
pub struct CoreMarkdownEvent {
    /// Buffer key, `ai_comment_{index}`.
    pub key: String,
    /// Full text accumulated so far.
    pub text: String,
}

/// Forwards every render to the JS subscriber, if one is attached.
pub(crate) struct JsMarkdownSink {
    pub key: String,
    pub slot: SubscriberSlot,
}

impl DisplaySink for JsMarkdownSink {
    fn markdown(&mut self, text: &str) {
        let Ok(guard) = self.slot.lock() else {
            return;
        };
        let Some(handler) = guard.as_ref() else {
            return;
        };
        let event = CoreMarkdownEvent {
            key: self.key.clone(),
            text: text.to_string(),
        };
        let status = handler.call(Ok(event.clone()), ThreadsafeFunctionCallMode::NonBlocking);
        if status != Status::Ok {
            let _ = handler.call(Ok(event), ThreadsafeFunctionCallMode::Blocking);
        }
    }
}

#[napi(object)]
pub struct CoreDiffData {
    pub repo_name: String,
    pub file_names: Vec<String>,
    pub patches: Vec<String>,
    pub contents: Vec<String>,
}

impl From<CoreDiffData> for DiffData {
    fn from(d: CoreDiffData) -> Self {
        DiffData {
            repo_name: d.repo_name,
            file_names: d.file_names,
            patches: d.patches,
            contents: d.contents,
        }
    }
}

#[napi(object)]
pub struct CoreAnalysisRequest {
    pub diffs: CoreDiffData,
    pub url: Option<String>,
    pub model: Option<String>,
    pub prompt_template: String,
    pub prompt_input: Option<String>,
    pub stream_output: Option<bool>,
    pub per_file_analysis: Option<bool>,
    pub analyze_whole_file: Option<bool>,
    pub ignore_tests: Option<bool>,
    pub project_id: Option<String>,
}

impl CoreAnalysisRequest {
    /// Request values win over the configured review defaults.
    pub(crate) fn into_parts(self, cfg: &AppConfig) -> Result<(DiffData, ReviewConfig)> {
        let model = self
            .model
            .filter(|m| !m.trim().is_empty())
            .or_else(|| cfg.review.default_model.clone())
            .ok_or_else(|| Error::from_reason("No model selected and no default_model configured"))?;

        let mut config = ReviewConfig::from_defaults(&cfg.review, &self.prompt_template, &model);
        if let Some(v) = self.stream_output {
            config.stream_checked = v;
        }
        if let Some(v) = self.per_file_analysis {
            config.per_file_analysis = v;
        }
        if let Some(v) = self.analyze_whole_file {
            config.analyze_whole_file = v;
        }
        config.prompt_input = self.prompt_input.unwrap_or_default();
        config.url = self.url.unwrap_or_default();
        config.url_type = GithubUrlKind::classify(&config.url);
        config.repo_name = self.diffs.repo_name.clone();
        config.project_id = self.project_id;

        let mut diffs = DiffData::from(self.diffs);
        if self.ignore_tests.unwrap_or(cfg.review.ignore_tests) {
            diffs = diffs.without_tests();
        }
        Ok((diffs, config))
    }
}

#[napi(object)]
pub struct CoreAnalyzedFile {
    pub file_id: String,
    pub file_name: String,
    pub response: String,
    pub interrupted: bool,
}

impl From<AnalyzedFile> for CoreAnalyzedFile {
    fn from(f: AnalyzedFile) -> Self {
        Self {
            file_id: f.file_id,
            file_name: f.file_name,
            response: f.response,
            interrupted: f.interrupted,
        }
    }
}

#[napi(object)]
pub struct CoreReviewResult {
    pub review_id: String,
    pub title: String,
    pub files: Vec<CoreAnalyzedFile>,
}

#[napi(object)]
pub struct CoreReviewSummary {
    pub review_id: String,
    pub title: String,
    pub url: String,
    pub model: String,
    pub created_at_ms: i64,
    pub project_id: Option<String>,
}

impl From<&ReviewRecord> for CoreReviewSummary {
    fn from(r: &ReviewRecord) -> Self {
        Self {
            review_id: r.review_id.clone(),
            title: r.title(),
            url: r.url.clone(),
            model: r.model.clone(),
            created_at_ms: r.created_at_ms,
            project_id: r.project_id.clone(),
        }
    }
}

#[napi(object)]
pub struct CoreProject {
    pub project_id: String,
    pub name: String,
    pub github_repo_url: String,
    pub repo_validated: bool,
    /// Why the URL was rejected, when it was.
    pub validation_error: Option<String>,
}

impl From<ProjectRecord> for CoreProject {
    fn from(p: ProjectRecord) -> Self {
        Self {
            project_id: p.project_id,
            name: p.name,
            github_repo_url: p.github_repo_url,
            repo_validated: p.repo_validated,
            validation_error: None,
        }
    }
}

#[napi(object)]
pub struct CoreAvailableModel {
    pub provider: String,
    pub model: String,
}
