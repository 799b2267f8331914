//! Keyword voting classifier

use crate::classifier::{normalize_label, ClassificationResult, Classifier};
use aho_corasick::AhoCorasick;
use std::time::Instant;
use triage_core::{Error, Request, Result};

/// Fast keyword classifier using the Aho-Corasick algorithm
///
/// Every whole-word keyword hit is a vote for its label. The label with the most votes
/// wins, ties go to the label registered first, and a request with no hits
/// is classified as unknown.
pub struct KeywordClassifier {
    name: String,
    matcher: AhoCorasick,
    /// Label index for each pattern
    pattern_labels: Vec<usize>,
    labels: Vec<String>,
}

impl KeywordClassifier {
    /// Create a new keyword classifier from `(label, keywords)` pairs
    pub fn new(name: impl Into<String>, labels: Vec<(String, Vec<String>)>) -> Result<Self> {
        let mut label_names = Vec::with_capacity(labels.len());
        let mut pattern_labels = Vec::new();
        let mut patterns = Vec::new();

        for (label, keywords) in labels {
            let label = normalize_label(&label);
            if label_names.contains(&label) {
                return Err(Error::config(format!("Duplicate keyword label '{}'", label)));
            }

            let index = label_names.len();
            label_names.push(label);

            for keyword in keywords {
                let keyword = keyword.trim().to_string();
                if keyword.is_empty() {
                    continue;
                }
                pattern_labels.push(index);
                patterns.push(keyword);
            }
        }

        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&patterns)
            .map_err(|e| Error::classifier(format!("Failed to build keyword matcher: {}", e)))?;

        Ok(Self {
            name: name.into(),
            matcher,
            pattern_labels,
            labels: label_names,
        })
    }

    /// Labels this classifier can produce, in registration order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Whether `text[start..end]` is not glued to a neighbouring letter or digit
fn is_whole_word(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.map_or(false, char::is_alphanumeric) && !after.map_or(false, char::is_alphanumeric)
}

#[async_trait::async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, request: &Request) -> Result<ClassificationResult> {
        let start = Instant::now();

        let text = request.text();
        let mut votes = vec![0usize; self.labels.len()];
        let mut matched = Vec::new();
        for m in self.matcher.find_overlapping_iter(text) {
            if !is_whole_word(text, m.start(), m.end()) {
                continue;
            }
            votes[self.pattern_labels[m.pattern().as_usize()]] += 1;
            matched.push(&text[m.start()..m.end()]);
        }

        let total: usize = votes.iter().sum();
        let mut winner: Option<(usize, usize)> = None;
        for (index, &count) in votes.iter().enumerate() {
            if count > 0 && winner.map_or(true, |(_, best)| count > best) {
                winner = Some((index, count));
            }
        }

        let result = match winner {
            Some((index, count)) => ClassificationResult::new(
                &self.labels[index],
                count as f32 / total as f32,
                format!("matched keywords: {}", matched.join(", ")),
            ),
            None => ClassificationResult::unknown("no keywords matched"),
        };

        Ok(result.with_latency_us(start.elapsed().as_micros() as u64))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
