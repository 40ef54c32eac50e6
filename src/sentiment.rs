//! Sentiment scoring.
//!
//! [`SentimentAnalyzer`] wraps the VADER lexicon scorer and maps its compound
//! score onto a three-way label. It is built once at startup from the
//! `[analysis]` configuration and passed to whoever needs it.

use serde::Serialize;
use vader_sentiment::SentimentIntensityAnalyzer;

use crate::config::AnalysisConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

/// Compound polarity in `[-1, 1]` and its label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sentiment {
    pub compound: f64,
    pub label: SentimentLabel,
}

impl Sentiment {
    pub const NEUTRAL: Sentiment = Sentiment {
        compound: 0.0,
        label: SentimentLabel::Neutral,
    };
}

pub struct SentimentAnalyzer {
    vader: SentimentIntensityAnalyzer<'static>,
    positive_threshold: f64,
    negative_threshold: f64,
}

impl SentimentAnalyzer {
    /// Build the analyzer and warm up the lexicon.
    pub fn new(config: &AnalysisConfig) -> Self {
        let analyzer = Self {
            vader: SentimentIntensityAnalyzer::new(),
            positive_threshold: config.positive_threshold,
            negative_threshold: config.negative_threshold,
        };
        // The lexicon loads lazily on first use; pay that cost at startup.
        analyzer.compound("ok");
        analyzer
    }

    /// Score `text`. Empty or blank text is neutral with compound 0.0.
    pub fn score(&self, text: &str) -> Sentiment {
        if text.trim().is_empty() {
            return Sentiment::NEUTRAL;
        }
        let compound = self.compound(text);
        Sentiment {
            compound,
            label: self.label_for(compound),
        }
    }

    /// Label for a compound score: `>= positive` positive, `<= negative`
    /// negative, neutral in between.
    pub fn label_for(&self, compound: f64) -> SentimentLabel {
        if compound >= self.positive_threshold {
            SentimentLabel::Positive
        } else if compound <= self.negative_threshold {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    fn compound(&self, text: &str) -> f64 {
        self.vader
            .polarity_scores(text)
            .get("compound")
            .copied()
            .filter(|c: &f64| c.is_finite())
            .unwrap_or(0.0)
            .clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> SentimentAnalyzer {
        SentimentAnalyzer::new(&AnalysisConfig::default())
    }

    #[test]
    fn test_empty_text_is_neutral_zero() {
        let a = analyzer();
        assert_eq!(a.score(""), Sentiment::NEUTRAL);
        assert_eq!(a.score("   \t "), Sentiment::NEUTRAL);
    }

    #[test]
    fn test_polar_texts() {
        let a = analyzer();
        let good = a.score("I love this, it is wonderful and great!");
        assert_eq!(good.label, SentimentLabel::Positive);
        assert!(good.compound > 0.05 && good.compound <= 1.0);

        let bad = a.score("This is terrible, I hate it. Awful and horrible.");
        assert_eq!(bad.label, SentimentLabel::Negative);
        assert!(bad.compound < -0.05 && bad.compound >= -1.0);
    }

    #[test]
    fn test_one_analyzer_scores_many_texts() {
        fn assert_shareable<T: Send + Sync>(_: &T) {}

        let a = analyzer();
        assert_shareable(&a);
        let texts = ["I love it", "I hate it", "It is a table"];
        let first: Vec<Sentiment> = texts.iter().map(|t| a.score(t)).collect();
        let second: Vec<Sentiment> = texts.iter().map(|t| a.score(t)).collect();
        assert_eq!(first, second);
        assert_eq!(first[0].label, SentimentLabel::Positive);
        assert_eq!(first[1].label, SentimentLabel::Negative);
        assert_eq!(first[2].label, SentimentLabel::Neutral);
    }

    #[test]
    fn test_threshold_boundaries() {
        let a = analyzer();
        assert_eq!(a.label_for(0.05), SentimentLabel::Positive);
        assert_eq!(a.label_for(0.0499), SentimentLabel::Neutral);
        assert_eq!(a.label_for(-0.05), SentimentLabel::Negative);
        assert_eq!(a.label_for(-0.0499), SentimentLabel::Neutral);
    }

    #[test]
    fn test_label_serializes_lowercase() {
        let json = serde_json::to_string(&SentimentLabel::Positive).unwrap();
        assert_eq!(json, "\"positive\"");
    }
}
