use serde::Serialize;

use crate::config::PromptTemplate;
use crate::error::ReviewError;
use crate::llm::models::provider_base::ProviderClient;
use crate::llm::prompts::prepare_prompts;
use crate::llm::stream::{DisplaySink, StreamAggregator, StreamBuffer};

use super::patches::get_patches;
use super::store::{ReviewRecord, ReviewStore};
use super::types::{AnalysisContext, DiffData, Project, ReviewConfig};

/// Runs one analysis and returns the model's full answer.
///
/// With streaming on, the sink sees the growing text once per chunk. With it
/// off, a single `chat` call is made and the sink is left alone.
pub async fn generate_analysis<C>(
    ctx: &AnalysisContext<'_>,
    client: &C,
    templates: &[PromptTemplate],
    sink: &mut dyn DisplaySink,
) -> Result<String, ReviewError>
where
    C: ProviderClient,
{
    let code = ctx.patch_content()?;
    let messages = prepare_prompts(
        &ctx.config.prompt_input,
        &ctx.config.prompt_template_selected,
        code,
        templates,
    )?;

    if !ctx.config.stream_checked {
        log::debug!(
            "Analysing {} with {} (non-streaming)",
            ctx.file_name,
            client.model_name()
        );
        return Ok(client.chat(messages).await?);
    }

    log::debug!(
        "Analysing {} with {} (streaming)",
        ctx.file_name,
        client.model_name()
    );
    let chunks = client.stream_chat(messages).await?;
    let buffer = StreamAggregator::new(client.provider())
        .aggregate(chunks, sink, StreamBuffer::for_index(ctx.idx))
        .await?;
    Ok(buffer.into_string())
}

/// Persists one analysed file. Code content is only kept in per-file mode.
pub fn save_review(
    ctx: &AnalysisContext<'_>,
    response: &str,
    store: &dyn ReviewStore,
) -> Result<String, ReviewError> {
    let code_content = ctx.code_content()?;
    let file_id = store.insert_file(
        ctx.review_id,
        ctx.file_name,
        ctx.patch,
        code_content,
        response,
    )?;
    Ok(file_id)
}

pub fn save_project(project: &Project, store: &dyn ReviewStore) -> Result<String, ReviewError> {
    let project_id = store.insert_project(
        &project.name,
        &project.github_repo_url,
        project.repo_validated,
    )?;
    log::info!("Created project {} ({})", project.name, project_id);
    Ok(project_id)
}

/// Stores the review header and returns its id.
pub fn start_review(config: &ReviewConfig, store: &dyn ReviewStore) -> Result<String, ReviewError> {
    let record = ReviewRecord::from_config(config.review_id.clone().unwrap_or_default(), config);
    Ok(store.insert_review(record)?)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyzedFile {
    pub file_id: String,
    pub file_name: String,
    pub response: String,
    /// The stream broke off; `response` holds what arrived before that.
    pub interrupted: bool,
}

/// Analyses every patch of `diffs` under `review_id` and stores the results.
///
/// `sink_for` is asked for a display target per file, keyed by index. A
/// broken stream keeps its partial text and the run moves on; any other
/// failure stops the run.
pub async fn process_review<C, F>(
    diffs: &DiffData,
    config: &ReviewConfig,
    store: &dyn ReviewStore,
    review_id: &str,
    client: &C,
    templates: &[PromptTemplate],
    mut sink_for: F,
) -> Result<Vec<AnalyzedFile>, ReviewError>
where
    C: ProviderClient,
    F: FnMut(usize) -> Box<dyn DisplaySink>,
{
    let (patches, file_names) = get_patches(diffs, config.per_file_analysis);
    let mut analyzed = Vec::with_capacity(patches.len());

    for (idx, (patch, file_name)) in patches.iter().zip(file_names.iter()).enumerate() {
        let ctx = AnalysisContext {
            diffs,
            config,
            review_id,
            file_name,
            patch,
            idx,
        };
        let mut sink = sink_for(idx);

        let (response, interrupted) =
            match generate_analysis(&ctx, client, templates, sink.as_mut()).await {
                Ok(text) => (text, false),
                Err(ReviewError::StreamInterrupted {
                    partial, received, ..
                }) => {
                    log::warn!(
                        "Keeping partial analysis of {} ({} chunks received)",
                        file_name,
                        received
                    );
                    (partial, true)
                }
                Err(e) => {
                    log::error!("Analysis of {} failed: {}", file_name, e);
                    return Err(e);
                }
            };

        if !config.stream_checked {
            sink.markdown(&response);
        }

        let file_id = save_review(&ctx, &response, store)?;
        analyzed.push(AnalyzedFile {
            file_id,
            file_name: file_name.clone(),
            response,
            interrupted,
        });
    }

    log::info!("Review {} finished: {} file(s)", review_id, analyzed.len());
    Ok(analyzed)
}
