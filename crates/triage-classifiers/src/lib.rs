//! Triage Classifiers
//!
//! Classifiers turn a free-text request into one label from the closed set
//! the router knows about. A classifier that cannot decide returns the
//! reserved [`UNKNOWN_LABEL`] instead of failing.
//!
//! Available classifiers:
//! - [`KeywordClassifier`]: Aho-Corasick keyword voting, no network
//! - [`CompletionClassifier`]: asks the completion service to pick a label
//! - [`StaticClassifier`]: always returns the same label

pub mod classifier;
pub mod completion;
pub mod config;
pub mod fixed;
pub mod keyword;

pub use classifier::{
    normalize_label, ClassificationResult, Classifier, LabelDescription, UNKNOWN_LABEL,
};
pub use completion::CompletionClassifier;
pub use config::{ClassifierSpec, KeywordLabelSpec};
pub use fixed::StaticClassifier;
pub use keyword::KeywordClassifier;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::{ClassificationResult, Classifier, UNKNOWN_LABEL};
    pub use crate::completion::CompletionClassifier;
    pub use crate::fixed::StaticClassifier;
    pub use crate::keyword::KeywordClassifier;
}
