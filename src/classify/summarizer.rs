use crate::classify::Summarizer;
use std::collections::{HashMap, HashSet};

/// Common English words that carry no topical signal
const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "even",
    "few", "for", "from", "further", "get", "got", "had", "has", "have", "having", "he", "her",
    "here", "hers", "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is",
    "it", "its", "itself", "just", "me", "more", "most", "much", "my", "myself", "no", "nor",
    "not", "now", "of", "off", "on", "once", "one", "only", "or", "other", "our", "ours",
    "ourselves", "out", "over", "own", "same", "she", "should", "so", "some", "such", "than",
    "that", "the", "their", "theirs", "them", "themselves", "then", "there", "these", "they",
    "this", "those", "through", "to", "too", "under", "until", "up", "us", "very", "was", "we",
    "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
    "would", "you", "your", "yours", "yourself", "yourselves",
];

/// Extractive summarizer ranking sentences by keyword frequency
///
/// Every non-stopword token is scored by its frequency relative to the most
/// frequent token. A sentence's strength is the sum of its token scores and
/// the strongest sentences form the summary, strongest first.
#[derive(Debug, Clone)]
pub struct FrequencySummarizer {
    sentences: usize,
    stopwords: HashSet<&'static str>,
}

impl FrequencySummarizer {
    /// Creates a summarizer keeping at most `sentences` sentences
    pub fn new(sentences: usize) -> Self {
        Self {
            sentences,
            stopwords: STOPWORDS.iter().copied().collect(),
        }
    }

    fn is_keyword(&self, token: &str) -> bool {
        !token.is_empty()
            && !self.stopwords.contains(token)
            && token.chars().any(char::is_alphabetic)
    }
}

impl Default for FrequencySummarizer {
    fn default() -> Self {
        Self::new(5)
    }
}

impl Summarizer for FrequencySummarizer {
    fn summarize(&self, text: &str) -> String {
        let sentences = split_sentences(text);

        let mut frequencies: HashMap<String, f64> = HashMap::new();
        for sentence in &sentences {
            for token in tokens(sentence).filter(|t| self.is_keyword(t)) {
                *frequencies.entry(token).or_insert(0.0) += 1.0;
            }
        }

        let max_frequency = frequencies.values().copied().fold(0.0, f64::max);
        if max_frequency == 0.0 {
            return String::new();
        }

        let mut ranked: Vec<(usize, f64)> = sentences
            .iter()
            .enumerate()
            .filter_map(|(index, sentence)| {
                let strength: f64 = tokens(sentence)
                    .filter_map(|t| frequencies.get(&t))
                    .map(|count| count / max_frequency)
                    .sum();
                (strength > 0.0).then_some((index, strength))
            })
            .collect();

        // Strongest first; earlier sentences win ties
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        ranked
            .iter()
            .take(self.sentences)
            .map(|(index, _)| sentences[*index])
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Splits text after `.`, `!`, `?` and line breaks, keeping the terminator
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for (index, c) in text.char_indices() {
        if matches!(c, '.' | '!' | '?' | '\n') {
            let end = index + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

fn tokens(sentence: &str) -> impl Iterator<Item = String> + '_ {
    sentence
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|token| token.trim_matches('\'').to_lowercase())
        .filter(|token| !token.is_empty())
}
