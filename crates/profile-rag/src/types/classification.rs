//! Question classification and the retrieval filter derived from it

use serde::{Deserialize, Serialize};

use super::document::SourceLabel;

/// Predicted topical source of a question. Exists only for the duration
/// of one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Answer likely comes from the transcript
    Transcript,
    /// Answer likely comes from the resume
    Resume,
    /// Answer could come from either document
    Both,
    /// Classifier output matched no known label
    Unknown,
}

impl Classification {
    /// Parse raw classifier model output.
    ///
    /// Takes the first whitespace-delimited token, strips trailing
    /// punctuation, lowercases it, and maps it to a label. Anything
    /// else is `Unknown`; callers decide the fallback, never this parser.
    pub fn parse(raw: &str) -> Self {
        let token = raw
            .split_whitespace()
            .next()
            .unwrap_or("")
            .trim_matches(|c: char| c.is_ascii_punctuation())
            .to_lowercase();

        match token.as_str() {
            "transcript" => Self::Transcript,
            "resume" => Self::Resume,
            "both" => Self::Both,
            _ => Self::Unknown,
        }
    }

    /// Label as used in prompts and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transcript => "transcript",
            Self::Resume => "resume",
            Self::Both => "both",
            Self::Unknown => "unknown",
        }
    }
}

/// Predicate over chunk `source` metadata, rebuilt per query from the
/// classification. Only ever names labels from the fixed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalFilter {
    /// Equality on one source label
    Source(SourceLabel),
    /// Either source label
    AnySource,
    /// No constraint
    Unfiltered,
}

impl RetrievalFilter {
    /// Derive the filter from a classification. `Unknown` falls back to
    /// an unfiltered search.
    pub fn from_classification(classification: Classification) -> Self {
        match classification {
            Classification::Transcript => Self::Source(SourceLabel::Transcript),
            Classification::Resume => Self::Source(SourceLabel::Resume),
            Classification::Both => Self::AnySource,
            Classification::Unknown => Self::Unfiltered,
        }
    }

    /// Whether a chunk with the given source passes this filter
    pub fn matches(&self, source: SourceLabel) -> bool {
        match self {
            Self::Source(label) => *label == source,
            Self::AnySource | Self::Unfiltered => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_labels() {
        assert_eq!(Classification::parse("transcript"), Classification::Transcript);
        assert_eq!(Classification::parse("resume"), Classification::Resume);
        assert_eq!(Classification::parse("both"), Classification::Both);
    }

    #[test]
    fn parses_noisy_model_output() {
        assert_eq!(Classification::parse("Transcript."), Classification::Transcript);
        assert_eq!(Classification::parse("  resume\n"), Classification::Resume);
        assert_eq!(
            Classification::parse("transcript, because it mentions grades"),
            Classification::Transcript
        );
    }

    #[test]
    fn unrecognized_output_is_unknown() {
        assert_eq!(Classification::parse(""), Classification::Unknown);
        assert_eq!(Classification::parse("cover letter"), Classification::Unknown);
        assert_eq!(
            Classification::parse("the answer is transcript"),
            Classification::Unknown
        );
    }

    #[test]
    fn filter_from_classification() {
        assert_eq!(
            RetrievalFilter::from_classification(Classification::Transcript),
            RetrievalFilter::Source(SourceLabel::Transcript)
        );
        assert_eq!(
            RetrievalFilter::from_classification(Classification::Both),
            RetrievalFilter::AnySource
        );
        assert_eq!(
            RetrievalFilter::from_classification(Classification::Unknown),
            RetrievalFilter::Unfiltered
        );
    }

    #[test]
    fn source_filter_excludes_the_other_label() {
        let filter = RetrievalFilter::Source(SourceLabel::Transcript);
        assert!(filter.matches(SourceLabel::Transcript));
        assert!(!filter.matches(SourceLabel::Resume));

        let any = RetrievalFilter::AnySource;
        assert!(any.matches(SourceLabel::Transcript));
        assert!(any.matches(SourceLabel::Resume));
    }
}
