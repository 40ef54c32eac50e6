//! Keyword extraction with corpus-relative TF-IDF weights.
//!
//! Each text is lowercased, stripped of punctuation and digits, split on
//! whitespace, and filtered to alphabetic tokens longer than two characters
//! that are not stopwords. Unigrams and bigrams are counted per document.
//!
//! A term is eligible when it occurs in at least [`MIN_DOC_FREQ`] documents
//! and in no more than [`MAX_DOC_RATIO`] of them; at most [`MAX_FEATURES`]
//! eligible terms (highest corpus frequency first) are kept. Weights use the
//! smoothed idf `ln((1 + n) / (1 + df)) + 1`, each document vector is L2
//! normalized, and a term's weight is the sum over documents.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::AnalysisConfig;

pub const MIN_DOC_FREQ: usize = 2;
pub const MAX_DOC_RATIO: f64 = 0.95;
pub const MAX_FEATURES: usize = 1000;
/// Terms at or below this summed weight are noise.
pub const MIN_WEIGHT: f64 = 0.01;

const ITALIAN_STOPWORDS: &[&str] = &[
    "a", "abbia", "abbiamo", "abbiano", "abbiate", "ad", "agl", "agli", "ai", "al", "all", "alla",
    "alle", "allo", "anche", "avemmo", "avendo", "avesse", "avessero", "avessi", "avessimo",
    "aveste", "avesti", "avete", "aveva", "avevamo", "avevano", "avevate", "avevi", "avevo",
    "avrai", "avranno", "avrebbe", "avrebbero", "avrei", "avremmo", "avremo", "avreste",
    "avresti", "avrete", "avrà", "avrò", "avuta", "avute", "avuti", "avuto", "c", "che", "chi",
    "ci", "coi", "col", "come", "con", "contro", "cui", "da", "dagl", "dagli", "dai", "dal",
    "dall", "dalla", "dalle", "dallo", "degl", "degli", "dei", "del", "dell", "della", "delle",
    "dello", "di", "dov", "dove", "e", "ebbe", "ebbero", "ebbi", "ed", "era", "erano", "eravamo",
    "eravate", "eri", "ero", "essendo", "faccia", "facciamo", "facciano", "facciate", "faccio",
    "facemmo", "facendo", "facesse", "facessero", "facessi", "facessimo", "faceste", "facesti",
    "faceva", "facevamo", "facevano", "facevate", "facevi", "facevo", "fai", "fanno", "farai",
    "faranno", "farebbe", "farebbero", "farei", "faremmo", "faremo", "fareste", "faresti",
    "farete", "farà", "farò", "fece", "fecero", "feci", "fosse", "fossero", "fossi", "fossimo",
    "foste", "fosti", "fu", "fui", "fummo", "furono", "gli", "ha", "hai", "hanno", "ho", "i",
    "il", "in", "io", "l", "la", "le", "lei", "li", "lo", "loro", "lui", "ma", "mi", "mia",
    "mie", "miei", "mio", "ne", "negl", "negli", "nei", "nel", "nell", "nella", "nelle", "nello",
    "noi", "non", "nostra", "nostre", "nostri", "nostro", "o", "per", "perché", "più", "quale",
    "quanta", "quante", "quanti", "quanto", "quella", "quelle", "quelli", "quello", "questa",
    "queste", "questi", "questo", "sarai", "saranno", "sarebbe", "sarebbero", "sarei",
    "saremmo", "saremo", "sareste", "saresti", "sarete", "sarà", "sarò", "se", "sei", "si",
    "sia", "siamo", "siano", "siate", "siete", "sono", "sta", "stai", "stando", "stanno",
    "starai", "staranno", "starebbe", "starebbero", "starei", "staremmo", "staremo",
    "stareste", "staresti", "starete", "starà", "starò", "stava", "stavamo", "stavano",
    "stavate", "stavi", "stavo", "stemmo", "stesse", "stessero", "stessi", "stessimo",
    "steste", "stesti", "stette", "stettero", "stetti", "stia", "stiamo", "stiano", "stiate",
    "sto", "su", "sua", "sue", "sugl", "sugli", "sui", "sul", "sull", "sulla", "sulle", "sullo",
    "suo", "suoi", "ti", "tra", "tu", "tua", "tue", "tuo", "tuoi", "tutti", "tutto", "un",
    "una", "uno", "vi", "voi", "vostra", "vostre", "vostri", "vostro", "è",
];

const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "aren", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "couldn", "did", "didn", "do", "does", "doesn", "doing", "don", "down",
    "during", "each", "few", "for", "from", "further", "had", "hadn", "has", "hasn", "have",
    "haven", "having", "he", "her", "here", "hers", "herself", "him", "himself", "his", "how",
    "i", "if", "in", "into", "is", "isn", "it", "its", "itself", "just", "ll", "me", "mightn",
    "more", "most", "mustn", "my", "myself", "needn", "no", "nor", "not", "now", "of", "off",
    "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own",
    "re", "same", "shan", "she", "should", "shouldn", "so", "some", "such", "than", "that",
    "the", "their", "theirs", "them", "themselves", "then", "there", "these", "they", "this",
    "those", "through", "to", "too", "under", "until", "up", "ve", "very", "was", "wasn", "we",
    "were", "weren", "what", "when", "where", "which", "while", "who", "whom", "why", "will",
    "with", "won", "wouldn", "you", "your", "yours", "yourself", "yourselves",
];

/// Built-in stoplist for a language name, empty for unknown languages.
pub fn builtin_stopwords(language: &str) -> &'static [&'static str] {
    match language {
        "italian" => ITALIAN_STOPWORDS,
        "english" => ENGLISH_STOPWORDS,
        _ => &[],
    }
}

pub struct KeywordExtractor {
    stopwords: HashSet<String>,
}

impl KeywordExtractor {
    /// Build the stoplist from the configured language plus extra terms.
    pub fn new(config: &AnalysisConfig) -> Self {
        let mut stopwords: HashSet<String> = builtin_stopwords(&config.language)
            .iter()
            .map(|s| s.to_string())
            .collect();
        stopwords.extend(config.extra_stopwords.iter().map(|s| s.to_lowercase()));
        Self { stopwords }
    }

    /// Filtered tokens of `text`, in order.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphabetic() || c.is_whitespace() || *c == '_')
            .collect();

        cleaned
            .split_whitespace()
            .filter(|token| {
                token.chars().all(char::is_alphabetic)
                    && token.chars().count() > 2
                    && !self.stopwords.contains(*token)
            })
            .map(str::to_string)
            .collect()
    }

    /// The `n` highest-weighted terms across `texts`, heaviest first.
    pub fn top_keywords(&self, texts: &[&str], n: usize) -> Vec<(String, f64)> {
        let docs: Vec<HashMap<String, usize>> = texts
            .iter()
            .map(|text| self.tokenize(text))
            .filter(|tokens| !tokens.is_empty())
            .map(|tokens| term_counts(&tokens))
            .collect();

        if docs.is_empty() || n == 0 {
            return Vec::new();
        }

        let n_docs = docs.len();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        let mut corpus_freq: HashMap<&str, usize> = HashMap::new();
        for doc in &docs {
            for (term, count) in doc {
                *doc_freq.entry(term.as_str()).or_default() += 1;
                *corpus_freq.entry(term.as_str()).or_default() += count;
            }
        }

        let max_doc_count = MAX_DOC_RATIO * n_docs as f64;
        let mut eligible: Vec<&str> = doc_freq
            .iter()
            .filter(|&(_, &df)| df >= MIN_DOC_FREQ && (df as f64) <= max_doc_count)
            .map(|(term, _)| *term)
            .collect();
        eligible.sort_by(|a, b| corpus_freq[b].cmp(&corpus_freq[a]).then_with(|| a.cmp(b)));
        eligible.truncate(MAX_FEATURES);

        let idf: HashMap<&str, f64> = eligible
            .iter()
            .map(|term| {
                let df = doc_freq[term] as f64;
                (*term, ((1.0 + n_docs as f64) / (1.0 + df)).ln() + 1.0)
            })
            .collect();

        let mut weights: BTreeMap<&str, f64> = BTreeMap::new();
        for doc in &docs {
            let vector: Vec<(&str, f64)> = doc
                .iter()
                .filter_map(|(term, &count)| {
                    idf.get(term.as_str())
                        .map(|w| (term.as_str(), count as f64 * w))
                })
                .collect();
            let norm = vector.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
            if norm == 0.0 {
                continue;
            }
            for (term, value) in vector {
                *weights.entry(term).or_default() += value / norm;
            }
        }

        let mut ranked: Vec<(String, f64)> = weights
            .into_iter()
            .filter(|(_, w)| *w > MIN_WEIGHT)
            .map(|(term, w)| (term.to_string(), w))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }
}

/// Unigram and bigram counts for one document.
fn term_counts(tokens: &[String]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for token in tokens {
        *counts.entry(token.clone()).or_default() += 1;
    }
    for pair in tokens.windows(2) {
        *counts.entry(format!("{} {}", pair[0], pair[1])).or_default() += 1;
    }
    counts
}
