use super::types::DiffData;

pub const COMBINED_FILE_NAME: &str = "Combined Files";

/// Pairs patches with the names they are stored under.
///
/// Per-file mode keeps one entry per changed file. Combined mode joins every
/// patch with `"\n"` into a single entry named [`COMBINED_FILE_NAME`]; an
/// empty diff set still yields that one (empty) entry.
pub fn get_patches(diffs: &DiffData, is_per_file: bool) -> (Vec<String>, Vec<String>) {
    if is_per_file {
        let n = diffs.file_names.len().min(diffs.patches.len());
        if n != diffs.file_names.len() || n != diffs.patches.len() {
            log::warn!(
                "Diff set for {} has {} file names but {} patches, pairing the first {}",
                diffs.repo_name,
                diffs.file_names.len(),
                diffs.patches.len(),
                n
            );
        }
        (diffs.patches[..n].to_vec(), diffs.file_names[..n].to_vec())
    } else {
        (
            vec![diffs.patches.join("\n")],
            vec![COMBINED_FILE_NAME.to_string()],
        )
    }
}
