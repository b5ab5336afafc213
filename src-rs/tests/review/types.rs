use crate::config::ReviewDefaults;
use crate::error::ReviewError;
use crate::review::types::{is_test_path, AnalysisContext, DiffData, ReviewConfig};

#[cfg(test)]
mod tests {
    use super::*;

    fn diffs() -> DiffData {
        DiffData {
            repo_name: "acme/api".to_string(),
            file_names: vec![
                "src/lib.rs".to_string(),
                "tests/api_test.rs".to_string(),
                "web/button.test.tsx".to_string(),
            ],
            patches: vec!["p0".to_string(), "p1".to_string(), "p2".to_string()],
            contents: vec!["c0".to_string(), "c1".to_string(), "c2".to_string()],
        }
    }

    #[test]
    fn is_test_path_matches_common_layouts() {
        for path in [
            "tests/foo.rs",
            "pkg/__tests__/x.js",
            "test_models.py",
            "app/test_views.py",
            "server/handler_test.go",
            "ui/button.spec.ts",
        ] {
            assert!(is_test_path(path), "{}", path);
        }
        for path in ["src/lib.rs", "src/testing_utils.rs", "contest/main.py", "latest.rs"] {
            assert!(!is_test_path(path), "{}", path);
        }
    }

    #[test]
    fn without_tests_keeps_lists_aligned() {
        let kept = diffs().without_tests();
        assert_eq!(kept.file_names, vec!["src/lib.rs"]);
        assert_eq!(kept.patches, vec!["p0"]);
        assert_eq!(kept.contents, vec!["c0"]);
        assert_eq!(kept.repo_name, "acme/api");
    }

    #[test]
    fn content_reports_out_of_range() {
        let d = diffs();
        assert_eq!(d.content(2).expect("content"), "c2");
        let err = d.content(3).expect_err("out of range");
        assert!(matches!(err, ReviewError::IndexOutOfRange { index: 3, len: 3 }));
    }

    #[test]
    fn analysis_context_selects_code_by_mode() {
        let d = diffs();
        let mut config = ReviewConfig::from_defaults(&ReviewDefaults::default(), "Code Review", "m");
        let ctx = AnalysisContext {
            diffs: &d,
            config: &config,
            review_id: "rev_1",
            file_name: "src/lib.rs",
            patch: "p0",
            idx: 0,
        };
        assert_eq!(ctx.patch_content().expect("patch"), "p0");
        assert_eq!(ctx.code_content().expect("code"), " ");

        config.analyze_whole_file = true;
        config.per_file_analysis = true;
        let ctx = AnalysisContext {
            diffs: &d,
            config: &config,
            review_id: "rev_1",
            file_name: "src/lib.rs",
            patch: "p0",
            idx: 0,
        };
        assert_eq!(ctx.patch_content().expect("patch"), "c0");
        assert_eq!(ctx.code_content().expect("code"), "c0");
    }

    #[test]
    fn combined_whole_file_uses_first_content_only() {
        let d = diffs();
        let mut config = ReviewConfig::from_defaults(&ReviewDefaults::default(), "Code Review", "m");
        config.per_file_analysis = false;
        config.analyze_whole_file = true;
        let ctx = AnalysisContext {
            diffs: &d,
            config: &config,
            review_id: "rev_1",
            file_name: "Combined Files",
            patch: "p0\np1\np2",
            idx: 0,
        };
        assert_eq!(ctx.patch_content().expect("patch"), "c0");

        let empty = DiffData {
            repo_name: "acme/api".to_string(),
            file_names: Vec::new(),
            patches: Vec::new(),
            contents: Vec::new(),
        };
        let ctx = AnalysisContext {
            diffs: &empty,
            config: &config,
            review_id: "rev_1",
            file_name: "Combined Files",
            patch: "",
            idx: 0,
        };
        let err = ctx.patch_content().expect_err("no content");
        assert!(matches!(err, ReviewError::IndexOutOfRange { index: 0, len: 0 }));
    }
}
