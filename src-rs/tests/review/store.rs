use crate::review::github_url::GithubUrlKind;
use crate::review::store::{JsonReviewStore, ReviewRecord, ReviewStore, STORE_VERSION};

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, created_at_ms: i64) -> ReviewRecord {
        ReviewRecord {
            version: STORE_VERSION,
            review_id: id.to_string(),
            repo_name: "acme/api".to_string(),
            url: String::new(),
            prompt_template: "Code Review".to_string(),
            prompt_input: String::new(),
            model: "gpt-4o-mini".to_string(),
            per_file_analysis: true,
            created_at_ms,
            url_type: None,
            project_id: None,
        }
    }

    #[test]
    fn review_and_files_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonReviewStore::new(dir.path());

        let review_id = store.insert_review(record("", 0)).expect("insert review");
        assert!(review_id.starts_with("rev_"));

        let f1 = store
            .insert_file(&review_id, "src/a.rs", "@@ a", "fn a() {}", "looks fine")
            .expect("insert file");
        let f2 = store
            .insert_file(&review_id, "src/b.rs", "@@ b", " ", "rename b")
            .expect("insert file");
        assert_ne!(f1, f2);
        assert!(f1.starts_with("file_"));

        let loaded = store
            .get_review_with_files(&review_id)
            .expect("load")
            .expect("present");
        assert_eq!(loaded.review.review_id, review_id);
        assert!(loaded.review.created_at_ms > 0);
        assert_eq!(loaded.files.len(), 2);
        let a = loaded.files.iter().find(|f| f.file_id == f1).expect("file a");
        assert_eq!(a.file_name, "src/a.rs");
        assert_eq!(a.code_content, "fn a() {}");
        assert_eq!(a.response, "looks fine");
    }

    #[test]
    fn files_come_back_in_insertion_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonReviewStore::new(dir.path());
        let review_id = store.insert_review(record("rev_order", 1)).expect("insert review");

        let expected: Vec<String> = (0..30).map(|i| format!("f{:02}", i)).collect();
        for name in &expected {
            store
                .insert_file(&review_id, name, "", "", "")
                .expect("insert file");
        }

        let loaded = store
            .get_review_with_files(&review_id)
            .expect("load")
            .expect("present");
        let names: Vec<String> = loaded.files.iter().map(|f| f.file_name.clone()).collect();
        assert_eq!(names, expected);
        assert_eq!(loaded.files[29].seq, 29);
    }

    #[test]
    fn insert_file_requires_existing_review() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonReviewStore::new(dir.path());
        assert!(store.insert_file("rev_missing", "a", "", "", "").is_err());
        assert!(store.insert_file("../escape", "a", "", "", "").is_err());
    }

    #[test]
    fn list_reviews_is_newest_first_and_filters_by_project() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonReviewStore::new(dir.path());

        store.insert_review(record("rev_old", 1_000)).expect("insert");
        let mut newer = record("rev_new", 2_000);
        newer.project_id = Some("proj_1".to_string());
        store.insert_review(newer).expect("insert");

        let ids: Vec<String> = store
            .list_reviews()
            .expect("list")
            .into_iter()
            .map(|r| r.review_id)
            .collect();
        assert_eq!(ids, vec!["rev_new", "rev_old"]);

        let in_project = store.list_project_reviews("proj_1").expect("list");
        assert_eq!(in_project.len(), 1);
        assert_eq!(in_project[0].review_id, "rev_new");
    }

    #[test]
    fn delete_review_removes_files_too() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonReviewStore::new(dir.path());
        let id = store.insert_review(record("rev_gone", 5)).expect("insert");
        store.insert_file(&id, "a", "", "", "").expect("file");

        assert!(store.delete_review(&id).expect("delete"));
        assert!(store.get_review_with_files(&id).expect("load").is_none());
        assert!(!store.delete_review(&id).expect("delete again"));
    }

    #[test]
    fn projects_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonReviewStore::new(dir.path());
        assert!(store.list_projects().expect("empty").is_empty());

        let id = store
            .insert_project("api", "https://github.com/acme/api", true)
            .expect("insert");
        assert!(id.starts_with("proj_"));

        let projects = store.list_projects().expect("list");
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "api");
        assert!(projects[0].repo_validated);
    }

    #[test]
    fn title_uses_url_tail_by_kind() {
        let mut r = record("rev_t", 1);
        let cases = [
            (GithubUrlKind::PullRequest, "https://github.com/acme/api/pull/42", "Code Review pull/42"),
            (GithubUrlKind::Commit, "https://github.com/acme/api/commit/0a1b2c3d4e5f", "Code Review 0a1b2c3"),
            (GithubUrlKind::Branch, "https://github.com/acme/api/tree/main", "Code Review main"),
            (GithubUrlKind::FolderPath, "https://github.com/acme/api/tree/main/src", "Code Review /src"),
            (GithubUrlKind::FilePath, "https://github.com/acme/api/blob/main/lib.rs", "Code Review lib.rs"),
        ];
        for (kind, url, expected) in cases {
            r.url_type = Some(kind);
            r.url = url.to_string();
            assert_eq!(r.title(), expected);
        }
    }

    #[test]
    fn title_falls_back_to_prompt_then_template() {
        let mut r = record("rev_t", 1);
        assert_eq!(r.title(), "Code Review");

        r.prompt_input = "check errors".to_string();
        assert_eq!(r.title(), "check errors");

        r.prompt_input = "look closely at the retry loop please".to_string();
        assert_eq!(r.title(), "look closely at the re...");
    }
}
