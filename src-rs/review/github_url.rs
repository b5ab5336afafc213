use serde::{Deserialize, Serialize};
use url::Url;

/// What a GitHub URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GithubUrlKind {
    PullRequest,
    Commit,
    Branch,
    FilePath,
    FolderPath,
}

impl GithubUrlKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GithubUrlKind::PullRequest => "pull_request",
            GithubUrlKind::Commit => "commit",
            GithubUrlKind::Branch => "branch",
            GithubUrlKind::FilePath => "file_path",
            GithubUrlKind::FolderPath => "folder_path",
        }
    }

    /// `/{owner}/{repo}/pull/{n}`, `/commit/{sha}`, `/tree/{branch}[/{dir}...]`,
    /// `/blob/{branch}/{file}`. Anything else is not a review target.
    pub fn classify(raw: &str) -> Option<Self> {
        let segments = github_path_segments(raw)?;
        if segments.len() < 4 {
            return None;
        }
        match segments[2].as_str() {
            "pull" => Some(GithubUrlKind::PullRequest),
            "commit" => Some(GithubUrlKind::Commit),
            "blob" => Some(GithubUrlKind::FilePath),
            "tree" if segments.len() == 4 => Some(GithubUrlKind::Branch),
            "tree" => Some(GithubUrlKind::FolderPath),
            _ => None,
        }
    }
}

impl std::fmt::Display for GithubUrlKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn github_path_segments(raw: &str) -> Option<Vec<String>> {
    let parsed = Url::parse(raw.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?;
    if host != "github.com" && host != "www.github.com" {
        return None;
    }
    Some(
        parsed
            .path_segments()?
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Accepts `https://github.com/{owner}/{repo}` (optionally `.git` or a
/// trailing slash). On rejection returns the reason to show the user.
pub fn validate_github_repo_url(raw: &str) -> Result<(), String> {
    let Some(segments) = github_path_segments(raw) else {
        return Err("URL must be an http(s) link to github.com".to_string());
    };
    if segments.len() != 2 {
        return Err("URL must look like https://github.com/<owner>/<repo>".to_string());
    }
    let valid_part = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    };
    let repo = segments[1].trim_end_matches(".git");
    if !valid_part(&segments[0]) || !valid_part(repo) {
        return Err("owner or repository name contains invalid characters".to_string());
    }
    Ok(())
}
