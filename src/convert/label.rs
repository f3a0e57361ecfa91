//! Block label allocation
//!
//! Labels are derived only from the label prefix, the job name and the
//! stanza ordinal, so re-converting an unchanged job yields the same labels.

/// Turn arbitrary text into a valid identifier.
///
/// Characters outside `[A-Za-z0-9_]` become `_`; a leading digit gets a `_`
/// in front.
pub fn sanitize_identifier(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}

/// Join the non-empty parts with `_` and sanitize the result
pub fn label_for_parts(parts: &[&str]) -> String {
    let joined: Vec<&str> = parts.iter().copied().filter(|p| !p.is_empty()).collect();
    sanitize_identifier(&joined.join("_"))
}

/// Like [`label_for_parts`], with the ordinal appended as the last part
pub fn label_with_index(index: usize, parts: &[&str]) -> String {
    let index = index.to_string();
    let mut all: Vec<&str> = parts.to_vec();
    all.push(&index);
    label_for_parts(&all)
}

/// Allocates labels for the blocks of one job
#[derive(Debug, Clone)]
pub struct LabelAllocator {
    prefix: Option<String>,
    job: String,
}

impl LabelAllocator {
    pub fn new(prefix: Option<&str>, job: impl Into<String>) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            job: job.into(),
        }
    }

    fn parts(&self) -> Vec<&str> {
        let mut parts = Vec::with_capacity(2);
        if let Some(prefix) = &self.prefix {
            parts.push(prefix.as_str());
        }
        parts.push(self.job.as_str());
        parts
    }

    /// Label shared by the job-wide blocks (sink, relabel stage)
    pub fn job_label(&self) -> String {
        label_for_parts(&self.parts())
    }

    /// Label for the blocks of the stanza at `index`
    pub fn stanza_label(&self, index: usize) -> String {
        label_with_index(index, &self.parts())
    }
}
