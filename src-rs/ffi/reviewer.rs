use napi::bindgen_prelude::*;
use napi::JsFunction;
use napi_derive::napi;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

use crate::config::ModelConfig;
use crate::init_logger;
use crate::llm::models::provider_handle::ProviderClientFactory;
use crate::llm::stream::{buffer_key, DisplaySink};
use crate::review::{
    process_review, save_project, start_review, validate_github_repo_url, JsonReviewStore,
    Project, ReviewStore,
};

use super::review_util::{
    load_config, to_napi_err, CoreAnalysisRequest, CoreAvailableModel, CoreProject,
    CoreReviewResult, CoreReviewSummary, JsMarkdownSink, SubscriberSlot,
};

#[napi]
pub struct Reviewer {
    subscriber: SubscriberSlot,
    clients: Arc<Mutex<ProviderClientFactory>>,
}

impl Default for Reviewer {
    fn default() -> Self {
        Self::new()
    }
}

#[napi]
impl Reviewer {
    #[napi(constructor)]
    pub fn new() -> Self {
        init_logger();
        Self {
            subscriber: Arc::new(StdMutex::new(None)),
            clients: Arc::new(Mutex::new(ProviderClientFactory::default())),
        }
    }

    /// `on_markdown` receives `{ key, text }` with the full text so far.
    #[napi]
    pub fn subscribe(&self, on_markdown: JsFunction) -> Result<()> {
        let tsfn = on_markdown.create_threadsafe_function(0, |ctx| Ok(vec![ctx.value]))?;
        let mut guard = self
            .subscriber
            .lock()
            .map_err(|_| Error::from_reason("subscriber lock poisoned"))?;
        *guard = Some(tsfn);
        Ok(())
    }

    #[napi]
    pub fn unsubscribe(&self) -> Result<()> {
        if let Ok(mut guard) = self.subscriber.lock() {
            guard.take();
        }
        Ok(())
    }

    #[napi]
    pub async fn run_review(&self, request: CoreAnalysisRequest) -> Result<CoreReviewResult> {
        let cfg = load_config()?;
        let (diffs, config) = request.into_parts(&cfg)?;

        let model = ModelConfig::from_model_name(&config.selected_model, &cfg.providers);
        let client = {
            let mut clients = self.clients.lock().await;
            clients
                .get_or_create(&model, &cfg.providers, cfg.http.client_options())
                .map_err(to_napi_err)?
        };

        let store = JsonReviewStore::open_default().map_err(to_napi_err)?;
        let review_id = start_review(&config, &store).map_err(to_napi_err)?;
        log::info!(
            "Review {} started: {} file(s), model {}",
            review_id,
            diffs.len(),
            model.model_name
        );

        let slot = Arc::clone(&self.subscriber);
        let files = process_review(
            &diffs,
            &config,
            &store,
            &review_id,
            client.as_ref(),
            &cfg.prompt_templates,
            move |idx| -> Box<dyn DisplaySink> {
                Box::new(JsMarkdownSink {
                    key: buffer_key(idx),
                    slot: Arc::clone(&slot),
                })
            },
        )
        .await
        .map_err(to_napi_err)?;

        let title = store
            .get_review_with_files(&review_id)
            .map_err(to_napi_err)?
            .map(|r| r.review.title())
            .unwrap_or_default();

        Ok(CoreReviewResult {
            review_id,
            title,
            files: files.into_iter().map(Into::into).collect(),
        })
    }

    #[napi]
    pub fn list_reviews(&self, project_id: Option<String>) -> Result<Vec<CoreReviewSummary>> {
        let store = JsonReviewStore::open_default().map_err(to_napi_err)?;
        let reviews = match project_id {
            Some(id) => store.list_project_reviews(&id),
            None => store.list_reviews(),
        }
        .map_err(to_napi_err)?;
        Ok(reviews.iter().map(CoreReviewSummary::from).collect())
    }

    #[napi]
    pub fn delete_review(&self, review_id: String) -> Result<bool> {
        let store = JsonReviewStore::open_default().map_err(to_napi_err)?;
        store.delete_review(&review_id).map_err(to_napi_err)
    }
}

/// Stores a project. An invalid URL is still stored, flagged unvalidated.
#[napi]
pub fn create_project(name: String, github_repo_url: String) -> Result<CoreProject> {
    init_logger();
    let validation = validate_github_repo_url(&github_repo_url);
    let project = Project {
        name,
        github_repo_url,
        repo_validated: validation.is_ok(),
    };
    let store = JsonReviewStore::open_default().map_err(to_napi_err)?;
    let project_id = save_project(&project, &store).map_err(to_napi_err)?;
    Ok(CoreProject {
        project_id,
        name: project.name,
        github_repo_url: project.github_repo_url,
        repo_validated: project.repo_validated,
        validation_error: validation.err(),
    })
}

#[napi]
pub fn list_projects() -> Result<Vec<CoreProject>> {
    let store = JsonReviewStore::open_default().map_err(to_napi_err)?;
    let projects = store.list_projects().map_err(to_napi_err)?;
    Ok(projects.into_iter().map(Into::into).collect())
}

#[napi]
pub fn list_available_models() -> Result<Vec<CoreAvailableModel>> {
    init_logger();
    let cfg = load_config()?;
    let mut out = Vec::new();
    for p in cfg.providers {
        for m in p.models {
            out.push(CoreAvailableModel {
                provider: p.name.clone(),
                model: m,
            });
        }
    }
    Ok(out)
}

/// Public configuration as JSON; API keys are never included.
#[napi]
pub fn get_app_config() -> String {
    let config = match load_config() {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            return "{}".to_string();
        }
    };
    serde_json::to_string(&config.to_public()).unwrap_or_else(|_| "{}".to_string())
}
