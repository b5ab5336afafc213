use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ReviewDefaults;
use crate::error::ReviewError;

use super::github_url::GithubUrlKind;

lazy_static! {
    static ref TEST_PATH: Regex = Regex::new(
        r"(^|/)(tests?|__tests__|spec|specs)/|(^|/)test_[^/]*$|_test\.[^/]+$|\.(test|spec)\.[^/]+$"
    )
    .expect("test path regex is valid");
}

/// Changed files of one review target, index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffData {
    pub repo_name: String,
    pub file_names: Vec<String>,
    pub patches: Vec<String>,
    /// Full post-change file contents.
    pub contents: Vec<String>,
}

impl DiffData {
    pub fn len(&self) -> usize {
        self.file_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_names.is_empty()
    }

    pub fn content(&self, idx: usize) -> Result<&str, ReviewError> {
        self.contents
            .get(idx)
            .map(String::as_str)
            .ok_or(ReviewError::IndexOutOfRange {
                index: idx,
                len: self.contents.len(),
            })
    }

    /// Drops files that look like tests.
    pub fn without_tests(self) -> Self {
        let DiffData {
            repo_name,
            file_names,
            patches,
            contents,
        } = self;
        let mut kept = DiffData {
            repo_name,
            ..Default::default()
        };
        let mut patches = patches.into_iter();
        let mut contents = contents.into_iter();
        for name in file_names {
            let patch = patches.next().unwrap_or_default();
            let content = contents.next().unwrap_or_default();
            if is_test_path(&name) {
                log::debug!("Skipping test file {}", name);
                continue;
            }
            kept.file_names.push(name);
            kept.patches.push(patch);
            kept.contents.push(content);
        }
        kept
    }
}

pub fn is_test_path(path: &str) -> bool {
    TEST_PATH.is_match(path)
}

/// Per-run review settings, fixed once the review starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewConfig {
    pub per_file_analysis: bool,
    pub analyze_whole_file: bool,
    pub stream_checked: bool,
    pub prompt_input: String,
    pub prompt_template_selected: String,
    pub selected_model: String,

    pub review_id: Option<String>,
    pub repo_name: String,
    pub url: String,
    pub url_type: Option<GithubUrlKind>,
    pub created_at_ms: i64,
    pub project_id: Option<String>,
}

impl ReviewConfig {
    pub fn from_defaults(defaults: &ReviewDefaults, template: &str, model: &str) -> Self {
        Self {
            per_file_analysis: defaults.per_file_analysis,
            analyze_whole_file: defaults.analyze_whole_file,
            stream_checked: defaults.stream_output,
            prompt_input: String::new(),
            prompt_template_selected: template.to_string(),
            selected_model: model.to_string(),
            review_id: None,
            repo_name: String::new(),
            url: String::new(),
            url_type: None,
            created_at_ms: 0,
            project_id: None,
        }
    }
}

/// Everything one file analysis reads.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisContext<'a> {
    pub diffs: &'a DiffData,
    pub config: &'a ReviewConfig,
    pub review_id: &'a str,
    pub file_name: &'a str,
    pub patch: &'a str,
    pub idx: usize,
}

impl<'a> AnalysisContext<'a> {
    /// The code sent to the model: the whole file or just its patch.
    ///
    /// In combined mode `idx` is 0, so a whole-file request sends only the
    /// first file's content and fails on an empty diff set.
    pub fn patch_content(&self) -> Result<&'a str, ReviewError> {
        if self.config.analyze_whole_file {
            self.diffs.content(self.idx)
        } else {
            Ok(self.patch)
        }
    }

    /// The code stored next to the review; a single space in combined mode.
    pub fn code_content(&self) -> Result<&'a str, ReviewError> {
        if self.config.per_file_analysis {
            self.diffs.content(self.idx)
        } else {
            Ok(" ")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub github_repo_url: String,
    pub repo_validated: bool,
}
