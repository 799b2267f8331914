//! Input filters applied on handoff
//!
//! Filters rewrite the text a handler receives. Guardrails and the
//! classifier always see the caller's original text.

use aho_corasick::AhoCorasick;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use triage_core::{Error, Request, Result};

const REDACTION_NOTE: &str =
    "\n\n[Note: Some sensitive information has been redacted for security purposes.]";

/// Transforms the text handed to a handler
pub trait InputFilter: Send + Sync {
    /// Rewrite `text`; `request` gives access to the id and metadata
    fn apply(&self, request: &Request, text: String) -> String;

    /// Get the filter name
    fn name(&self) -> &str;
}

/// Replaces sensitive terms with placeholders
pub struct SanitizeFilter {
    matcher: AhoCorasick,
    replacements: Vec<String>,
}

impl SanitizeFilter {
    /// Create a filter from `(term, replacement)` pairs (case-insensitive)
    pub fn new(terms: Vec<(String, String)>) -> Result<Self> {
        let (patterns, replacements): (Vec<_>, Vec<_>) = terms.into_iter().unzip();

        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&patterns)
            .map_err(|e| Error::config(format!("Failed to build sanitize matcher: {}", e)))?;

        Ok(Self {
            matcher,
            replacements,
        })
    }

    /// The default term list: payment, identity, and credential words
    pub fn standard() -> Result<Self> {
        Self::new(
            [
                ("credit card", "[PAYMENT METHOD]"),
                ("SSN", "[REDACTED ID]"),
                ("password", "[CREDENTIALS]"),
                ("account number", "[ACCOUNT ID]"),
            ]
            .into_iter()
            .map(|(term, replacement)| (term.to_string(), replacement.to_string()))
            .collect(),
        )
    }
}

impl InputFilter for SanitizeFilter {
    fn apply(&self, _request: &Request, text: String) -> String {
        if !self.matcher.is_match(&text) {
            return text;
        }
        let mut sanitized = self.matcher.replace_all(&text, &self.replacements);
        sanitized.push_str(REDACTION_NOTE);
        sanitized
    }

    fn name(&self) -> &str {
        "sanitize"
    }
}

/// Prepends fixed instructions to the user's text
pub struct PrefixFilter {
    prefix: String,
}

impl PrefixFilter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl InputFilter for PrefixFilter {
    fn apply(&self, _request: &Request, text: String) -> String {
        format!("{}\n\nUSER QUERY:\n{}", self.prefix.trim_end(), text)
    }

    fn name(&self) -> &str {
        "prefix"
    }
}

/// Prepends the request metadata as `key: value` lines
pub struct MetadataContextFilter;

impl InputFilter for MetadataContextFilter {
    fn apply(&self, request: &Request, text: String) -> String {
        if request.metadata().is_empty() {
            return text;
        }

        let mut context = String::from("CONTEXT:\n");
        for (key, value) in request.metadata() {
            context.push_str(&format!("{}: {}\n", key, value));
        }
        format!("{}\n{}", context, text)
    }

    fn name(&self) -> &str {
        "metadata"
    }
}

/// Filter specification (for YAML/config files)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FilterSpec {
    /// Standard sensitive terms, or a custom list
    Sanitize {
        #[serde(default)]
        terms: Vec<SanitizeTermSpec>,
    },

    /// Fixed instructions before the text
    Prefix { text: String },

    /// Request metadata before the text
    Metadata,
}

/// One sensitive term and its placeholder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizeTermSpec {
    pub term: String,
    pub replacement: String,
}

impl FilterSpec {
    /// Instantiate the filter
    pub fn build(&self) -> Result<Arc<dyn InputFilter>> {
        let filter: Arc<dyn InputFilter> = match self {
            Self::Sanitize { terms } if terms.is_empty() => Arc::new(SanitizeFilter::standard()?),
            Self::Sanitize { terms } => Arc::new(SanitizeFilter::new(
                terms
                    .iter()
                    .map(|t| (t.term.clone(), t.replacement.clone()))
                    .collect(),
            )?),
            Self::Prefix { text } => Arc::new(PrefixFilter::new(text.clone())),
            Self::Metadata => Arc::new(MetadataContextFilter),
        };
        Ok(filter)
    }
}
