use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use super::github_url::GithubUrlKind;
use super::id::{generate_file_id, generate_project_id, generate_review_id, validate_record_id};
use super::types::ReviewConfig;

pub const STORE_VERSION: u16 = 1;

const TITLE_PROMPT_CHARS: usize = 22;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub version: u16,
    pub review_id: String,
    pub repo_name: String,
    pub url: String,
    pub prompt_template: String,
    #[serde(default)]
    pub prompt_input: String,
    pub model: String,
    pub per_file_analysis: bool,
    pub created_at_ms: i64,
    #[serde(default)]
    pub url_type: Option<GithubUrlKind>,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl ReviewRecord {
    pub fn from_config(review_id: impl Into<String>, config: &ReviewConfig) -> Self {
        Self {
            version: STORE_VERSION,
            review_id: review_id.into(),
            repo_name: config.repo_name.clone(),
            url: config.url.clone(),
            prompt_template: config.prompt_template_selected.clone(),
            prompt_input: config.prompt_input.clone(),
            model: config.selected_model.clone(),
            per_file_analysis: config.per_file_analysis,
            created_at_ms: if config.created_at_ms > 0 {
                config.created_at_ms
            } else {
                now_ms()
            },
            url_type: config.url_type,
            project_id: config.project_id.clone(),
        }
    }

    /// Sidebar label. URL-backed reviews are named after the last URL
    /// segment; otherwise the custom prompt (shortened) or the template.
    pub fn title(&self) -> String {
        if let Some(kind) = self.url_type {
            let last = self
                .url
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default();
            return match kind {
                GithubUrlKind::FilePath | GithubUrlKind::Branch => {
                    format!("{} {}", self.prompt_template, last)
                }
                GithubUrlKind::FolderPath => format!("{} /{}", self.prompt_template, last),
                GithubUrlKind::PullRequest => format!("{} pull/{}", self.prompt_template, last),
                GithubUrlKind::Commit => {
                    let short: String = last.chars().take(7).collect();
                    format!("{} {}", self.prompt_template, short)
                }
            };
        }
        let prompt = self.prompt_input.as_str();
        if prompt.is_empty() {
            return self.prompt_template.clone();
        }
        if prompt.chars().count() > TITLE_PROMPT_CHARS {
            let head: String = prompt.chars().take(TITLE_PROMPT_CHARS).collect();
            return format!("{}...", head);
        }
        prompt.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_id: String,
    pub review_id: String,
    /// Insertion position within the review.
    #[serde(default)]
    pub seq: u32,
    pub file_name: String,
    pub patch: String,
    pub code_content: String,
    pub response: String,
    pub created_at_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub version: u16,
    pub project_id: String,
    pub name: String,
    pub github_repo_url: String,
    pub repo_validated: bool,
    pub created_at_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewWithFiles {
    pub review: ReviewRecord,
    pub files: Vec<FileRecord>,
}

/// Persistence for reviews, their analysed files and projects.
pub trait ReviewStore: Send + Sync {
    /// Stores `record`, assigning an id when `record.review_id` is empty.
    fn insert_review(&self, record: ReviewRecord) -> Result<String>;

    fn insert_file(
        &self,
        review_id: &str,
        file_name: &str,
        patch: &str,
        code_content: &str,
        response: &str,
    ) -> Result<String>;

    fn insert_project(&self, name: &str, repo_url: &str, validated: bool) -> Result<String>;

    fn get_review_with_files(&self, review_id: &str) -> Result<Option<ReviewWithFiles>>;

    /// Newest first.
    fn list_reviews(&self) -> Result<Vec<ReviewRecord>>;

    fn list_projects(&self) -> Result<Vec<ProjectRecord>>;

    fn list_project_reviews(&self, project_id: &str) -> Result<Vec<ReviewRecord>>;

    /// Returns whether anything was removed.
    fn delete_review(&self, review_id: &str) -> Result<bool>;
}

pub(crate) fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let parent = path
        .parent()
        .context("missing parent directory for atomic write")?;
    if !parent.exists() {
        fs::create_dir_all(parent).context("failed to create store directory")?;
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file");
    let tmp_path = parent.join(format!("{file_name}.tmp.{}", now_ms()));

    fs::write(&tmp_path, content).context("failed to write tmp file")?;
    fs::rename(&tmp_path, path).context("failed to rename tmp file")?;
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize record")?;
    atomic_write(path, &json)
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(value))
}

/// Layout:
/// ```text
/// <root>/reviews/<review_id>/review.json
/// <root>/reviews/<review_id>/files/<file_id>.json
/// <root>/projects/<project_id>.json
/// ```
#[derive(Debug, Clone)]
pub struct JsonReviewStore {
    root: PathBuf,
}

impl JsonReviewStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `~/.lemma/store`
    pub fn open_default() -> Result<Self> {
        let home = dirs::home_dir().context("failed to determine home directory")?;
        Ok(Self::new(home.join(".lemma").join("store")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn reviews_dir(&self) -> PathBuf {
        self.root.join("reviews")
    }

    fn review_dir(&self, review_id: &str) -> Result<PathBuf> {
        validate_record_id(review_id)?;
        Ok(self.reviews_dir().join(review_id))
    }

    fn projects_dir(&self) -> PathBuf {
        self.root.join("projects")
    }

    fn load_review(&self, review_id: &str) -> Result<Option<ReviewRecord>> {
        let path = self.review_dir(review_id)?.join("review.json");
        let record: Option<ReviewRecord> = read_json(&path)?;
        Ok(record.filter(|r| r.version == STORE_VERSION))
    }

    fn load_files(&self, review_id: &str) -> Result<Vec<FileRecord>> {
        let dir = self.review_dir(review_id)?.join("files");
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(&dir).context("failed to read files directory")? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_json::<FileRecord>(&path) {
                Ok(Some(file)) => files.push(file),
                Ok(None) => {}
                Err(e) => log::warn!("Skipping unreadable file record: {:#}", e),
            }
        }
        files.sort_by(|a, b| {
            a.seq
                .cmp(&b.seq)
                .then_with(|| a.created_at_ms.cmp(&b.created_at_ms))
        });
        Ok(files)
    }

    fn next_file_seq(&self, review_id: &str) -> Result<u32> {
        let dir = self.review_dir(review_id)?.join("files");
        if !dir.exists() {
            return Ok(0);
        }
        let mut count = 0u32;
        for entry in fs::read_dir(&dir).context("failed to read files directory")? {
            if entry?.path().extension().and_then(|e| e.to_str()) == Some("json") {
                count += 1;
            }
        }
        Ok(count)
    }
}

impl ReviewStore for JsonReviewStore {
    fn insert_review(&self, mut record: ReviewRecord) -> Result<String> {
        if record.review_id.is_empty() {
            record.review_id = generate_review_id();
        }
        if record.created_at_ms <= 0 {
            record.created_at_ms = now_ms();
        }
        record.version = STORE_VERSION;
        let path = self.review_dir(&record.review_id)?.join("review.json");
        write_json(&path, &record)?;
        log::debug!("Stored review {}", record.review_id);
        Ok(record.review_id)
    }

    fn insert_file(
        &self,
        review_id: &str,
        file_name: &str,
        patch: &str,
        code_content: &str,
        response: &str,
    ) -> Result<String> {
        let dir = self.review_dir(review_id)?;
        if !dir.join("review.json").exists() {
            anyhow::bail!("review {} does not exist", review_id);
        }
        let record = FileRecord {
            file_id: generate_file_id(),
            review_id: review_id.to_string(),
            seq: self.next_file_seq(review_id)?,
            file_name: file_name.to_string(),
            patch: patch.to_string(),
            code_content: code_content.to_string(),
            response: response.to_string(),
            created_at_ms: now_ms(),
        };
        let path = dir.join("files").join(format!("{}.json", record.file_id));
        write_json(&path, &record)?;
        log::debug!("Stored file {} for review {}", record.file_id, review_id);
        Ok(record.file_id)
    }

    fn insert_project(&self, name: &str, repo_url: &str, validated: bool) -> Result<String> {
        let record = ProjectRecord {
            version: STORE_VERSION,
            project_id: generate_project_id(),
            name: name.to_string(),
            github_repo_url: repo_url.to_string(),
            repo_validated: validated,
            created_at_ms: now_ms(),
        };
        let path = self
            .projects_dir()
            .join(format!("{}.json", record.project_id));
        write_json(&path, &record)?;
        Ok(record.project_id)
    }

    fn get_review_with_files(&self, review_id: &str) -> Result<Option<ReviewWithFiles>> {
        let Some(review) = self.load_review(review_id)? else {
            return Ok(None);
        };
        let files = self.load_files(review_id)?;
        Ok(Some(ReviewWithFiles { review, files }))
    }

    fn list_reviews(&self) -> Result<Vec<ReviewRecord>> {
        let root = self.reviews_dir();
        if !root.exists() {
            return Ok(Vec::new());
        }
        let mut reviews = Vec::new();
        for entry in fs::read_dir(&root).context("failed to read reviews directory")? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let review_id = match path.file_name().and_then(|n| n.to_str()) {
                Some(s) => s.to_string(),
                None => continue,
            };
            if validate_record_id(&review_id).is_err() {
                continue;
            }
            match self.load_review(&review_id) {
                Ok(Some(review)) => reviews.push(review),
                Ok(None) => {}
                Err(e) => log::warn!("Skipping review {}: {:#}", review_id, e),
            }
        }
        reviews.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        Ok(reviews)
    }

    fn list_projects(&self) -> Result<Vec<ProjectRecord>> {
        let root = self.projects_dir();
        if !root.exists() {
            return Ok(Vec::new());
        }
        let mut projects = Vec::new();
        for entry in fs::read_dir(&root).context("failed to read projects directory")? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_json::<ProjectRecord>(&path) {
                Ok(Some(p)) if p.version == STORE_VERSION => projects.push(p),
                Ok(_) => {}
                Err(e) => log::warn!("Skipping unreadable project: {:#}", e),
            }
        }
        projects.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        Ok(projects)
    }

    fn list_project_reviews(&self, project_id: &str) -> Result<Vec<ReviewRecord>> {
        Ok(self
            .list_reviews()?
            .into_iter()
            .filter(|r| r.project_id.as_deref() == Some(project_id))
            .collect())
    }

    fn delete_review(&self, review_id: &str) -> Result<bool> {
        let dir = self.review_dir(review_id)?;
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)
            .with_context(|| format!("failed to delete review {}", review_id))?;
        Ok(true)
    }
}
