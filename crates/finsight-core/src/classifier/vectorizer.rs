//! Term-weighting vectorizer for transaction descriptions
//!
//! Lowercases text, keeps tokens of two or more word characters, drops English
//! stop words, then weights term counts by smoothed inverse document frequency
//! and L2-normalizes each row.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst",
    "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below", "beside",
    "besides", "between", "beyond", "bill", "both", "bottom", "but", "by", "call", "can",
    "cannot", "cant", "co", "con", "could", "couldnt", "cry", "de", "describe", "detail", "do",
    "done", "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else",
    "elsewhere", "empty", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "fifteen", "fifty", "fill", "find", "fire", "first", "five",
    "for", "former", "formerly", "forty", "found", "four", "from", "front", "full", "further",
    "get", "give", "go", "had", "has", "hasnt", "have", "he", "hence", "her", "here",
    "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him", "himself", "his",
    "how", "however", "hundred", "i", "ie", "if", "in", "inc", "indeed", "interest", "into",
    "is", "it", "its", "itself", "keep", "last", "latter", "latterly", "least", "less", "ltd",
    "made", "many", "may", "me", "meanwhile", "might", "mill", "mine", "more", "moreover",
    "most", "mostly", "move", "much", "must", "my", "myself", "name", "namely", "neither",
    "never", "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not",
    "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto", "or",
    "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own", "part",
    "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem", "seemed",
    "seeming", "seems", "serious", "several", "she", "should", "show", "side", "since",
    "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something", "sometime",
    "sometimes", "somewhere", "still", "such", "system", "take", "ten", "than", "that", "the",
    "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "thick", "thin", "third", "this",
    "those", "though", "three", "through", "throughout", "thru", "thus", "to", "together", "too",
    "top", "toward", "towards", "twelve", "twenty", "two", "un", "under", "until", "up", "upon",
    "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when", "whence",
    "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon", "wherever",
    "whether", "which", "while", "whither", "who", "whoever", "whole", "whom", "whose", "why",
    "will", "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("valid regex"))
}

/// Split a description into lowercase, non-stop-word tokens
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    token_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Fitted vocabulary and idf weights
///
/// `vocabulary` is sorted, so the feature index of a term is its position and
/// lookups are a binary search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: Vec<String>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Fit on `documents`, keeping at most `max_features` terms ranked by
    /// corpus frequency (ties alphabetical)
    pub fn fit<S: AsRef<str>>(documents: &[S], max_features: usize) -> Self {
        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let tokens = tokenize(doc.as_ref());
            let mut seen: Vec<&str> = Vec::new();
            for token in &tokens {
                *term_counts.entry(token.clone()).or_default() += 1;
                if !seen.contains(&token.as_str()) {
                    seen.push(token);
                    *doc_freq.entry(token.clone()).or_default() += 1;
                }
            }
        }

        let mut ranked: Vec<(String, usize)> = term_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(max_features);

        let mut vocabulary: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        vocabulary.sort();

        let n = documents.len() as f64;
        let idf = vocabulary
            .iter()
            .map(|term| {
                let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        Self { vocabulary, idf }
    }

    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Weighted, L2-normalized feature row. Unknown or empty text gives all zeros.
    pub fn transform(&self, text: &str) -> Vec<f64> {
        let mut row = vec![0.0; self.vocabulary.len()];
        for token in tokenize(text) {
            if let Ok(idx) = self.vocabulary.binary_search(&token) {
                row[idx] += 1.0;
            }
        }
        for (value, idf) in row.iter_mut().zip(&self.idf) {
            *value *= idf;
        }

        let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in &mut row {
                *value /= norm;
            }
        }
        row
    }

    /// Consistency check used after loading a persisted artifact
    pub(crate) fn is_consistent(&self) -> bool {
        self.vocabulary.len() == self.idf.len()
            && self.vocabulary.windows(2).all(|w| w[0] < w[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_stop_words_and_short_tokens() {
        assert_eq!(
            tokenize("UNIVERSITY OF CALIFORNIA"),
            vec!["university", "california"]
        );
        assert_eq!(tokenize("PG&E"), vec!["pg"]);
        assert_eq!(tokenize("AMAZON.COM"), vec!["amazon", "com"]);
        assert_eq!(tokenize("24 HOUR FITNESS"), vec!["24", "hour", "fitness"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_fit_vocabulary_sorted_and_capped() {
        let docs = ["rent payment", "mortgage payment", "uber trip"];
        let v = TfidfVectorizer::fit(&docs, 100);
        assert_eq!(
            v.vocabulary(),
            &["mortgage", "payment", "rent", "trip", "uber"]
        );

        let capped = TfidfVectorizer::fit(&docs, 1);
        assert_eq!(capped.vocabulary(), &["payment"]);
        assert!(capped.is_consistent());
    }

    #[test]
    fn test_transform_is_unit_length() {
        let docs = ["rent payment", "mortgage payment"];
        let v = TfidfVectorizer::fit(&docs, 100);
        let row = v.transform("RENT PAYMENT");
        let norm: f64 = row.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);

        // rarer term carries more weight
        let rent = v.vocabulary().iter().position(|t| t == "rent").unwrap();
        let payment = v.vocabulary().iter().position(|t| t == "payment").unwrap();
        assert!(row[rent] > row[payment]);
    }

    #[test]
    fn test_transform_out_of_vocabulary_is_zero() {
        let v = TfidfVectorizer::fit(&["starbucks"], 100);
        assert!(v.transform("zzz qqq").iter().all(|x| *x == 0.0));
        assert!(v.transform("").iter().all(|x| *x == 0.0));
    }
}
