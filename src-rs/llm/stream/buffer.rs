/// Text accumulated for one analysis, addressed by a session-scoped key.
///
/// The buffer only grows. It is owned by whoever drives the stream and handed
/// back when the stream ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamBuffer {
    key: String,
    text: String,
}

impl StreamBuffer {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: String::new(),
        }
    }

    /// Buffer for the `idx`-th analysed file of a review.
    pub fn for_index(idx: usize) -> Self {
        Self::new(buffer_key(idx))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn push_str(&mut self, fragment: &str) {
        self.text.push_str(fragment);
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

pub fn buffer_key(idx: usize) -> String {
    format!("ai_comment_{}", idx)
}
