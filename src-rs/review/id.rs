use rand::{distributions::Alphanumeric, Rng};

fn generate_id(prefix: &str, random_len: usize) -> String {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();

    let random_part: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(random_len)
        .map(char::from)
        .collect();

    format!("{}_{}_{}", prefix, timestamp, random_part.to_lowercase())
}

pub fn generate_review_id() -> String {
    generate_id("rev", 8)
}

pub fn generate_file_id() -> String {
    generate_id("file", 10)
}

pub fn generate_project_id() -> String {
    generate_id("proj", 8)
}

/// Ids become file names, so only `[A-Za-z0-9_-]` is accepted.
pub fn validate_record_id(id: &str) -> anyhow::Result<()> {
    if id.is_empty() {
        anyhow::bail!("record id is empty");
    }
    if id.len() > 128 {
        anyhow::bail!("record id too long");
    }
    let ok = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !ok {
        anyhow::bail!("invalid record id: {}", id);
    }
    Ok(())
}
