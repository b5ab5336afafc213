// Review pipeline: diff shaping, analysis runs and persistence

pub mod analysis;
pub mod github_url;
pub mod id;
pub mod patches;
pub mod store;
pub mod types;

pub use analysis::{
    generate_analysis, process_review, save_project, save_review, start_review, AnalyzedFile,
};
pub use github_url::{validate_github_repo_url, GithubUrlKind};
pub use patches::{get_patches, COMBINED_FILE_NAME};
pub use store::{
    FileRecord, JsonReviewStore, ProjectRecord, ReviewRecord, ReviewStore, ReviewWithFiles,
};
pub use types::{AnalysisContext, DiffData, Project, ReviewConfig};
