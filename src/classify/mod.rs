//! Post-crawl classification
//!
//! Interesting URLs were only matched on their address. This pass fetches
//! each one again, summarizes its article text, and keeps the URL as
//! "confident" when a keyword survives into the summary.

mod extractor;
mod summarizer;

pub use extractor::HtmlContentExtractor;
pub use summarizer::FrequencySummarizer;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Title and body text of an article
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub title: String,
    /// Lowercase body text
    pub text: String,
}

/// Errors from content extraction
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("No article text found at {0}")]
    Empty(String),
}

/// Downloads a page and returns its readable article text
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, url: &Url) -> Result<ExtractedArticle, ExtractError>;
}

/// Condenses article text to its most representative sentences
pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str) -> String;
}

/// Confirms interesting URLs against their summarized content
pub struct Classifier {
    extractor: Arc<dyn ContentExtractor>,
    summarizer: Arc<dyn Summarizer>,
    keywords: Vec<String>,
    concurrency: usize,
}

impl Classifier {
    /// Creates a classifier
    ///
    /// `keywords` are expected trimmed and lowercase; `concurrency` bounds the
    /// number of articles downloaded at once.
    pub fn new(
        extractor: Arc<dyn ContentExtractor>,
        summarizer: Arc<dyn Summarizer>,
        keywords: Vec<String>,
        concurrency: usize,
    ) -> Self {
        Self {
            extractor,
            summarizer,
            keywords,
            concurrency: concurrency.max(1),
        }
    }

    /// Returns the subset of `urls` whose summary mentions a keyword
    ///
    /// URLs whose content cannot be extracted are skipped.
    pub async fn confident(&self, urls: Vec<Url>) -> BTreeSet<String> {
        let total = urls.len();
        tracing::info!("Classifying {} interesting URLs", total);

        let confident: BTreeSet<String> = stream::iter(urls)
            .map(|url| async move { self.classify(&url).await.then(|| url.to_string()) })
            .buffer_unordered(self.concurrency)
            .filter_map(|kept| async move { kept })
            .collect()
            .await;

        tracing::info!("{} of {} interesting URLs confirmed", confident.len(), total);
        confident
    }

    async fn classify(&self, url: &Url) -> bool {
        let article = match self.extractor.extract(url).await {
            Ok(article) => article,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", url, e);
                return false;
            }
        };

        let summary = self.summarizer.summarize(&article.text).to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| !keyword.is_empty() && summary.contains(keyword.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedExtractor(HashMap<String, String>);

    #[async_trait]
    impl ContentExtractor for FixedExtractor {
        async fn extract(&self, url: &Url) -> Result<ExtractedArticle, ExtractError> {
            self.0
                .get(url.as_str())
                .map(|text| ExtractedArticle {
                    title: String::new(),
                    text: text.clone(),
                })
                .ok_or_else(|| ExtractError::Empty(url.to_string()))
        }
    }

    /// Keeps only the first sentence
    struct FirstSentence;

    impl Summarizer for FirstSentence {
        fn summarize(&self, text: &str) -> String {
            text.split('.').next().unwrap_or_default().to_string()
        }
    }

    fn url(path: &str) -> Url {
        Url::parse(&format!("http://site-a.test{}", path)).unwrap()
    }

    #[tokio::test]
    async fn test_confident_requires_keyword_in_summary() {
        let pages = HashMap::from([
            (url("/gaming-news").to_string(), "New gaming console out. Prices vary.".to_string()),
            (url("/gaming-ads").to_string(), "Buy shoes now. Also gaming.".to_string()),
        ]);
        let classifier = Classifier::new(
            Arc::new(FixedExtractor(pages)),
            Arc::new(FirstSentence),
            vec!["gaming".to_string()],
            2,
        );

        let confident = classifier
            .confident(vec![url("/gaming-news"), url("/gaming-ads"), url("/gaming-missing")])
            .await;

        assert_eq!(confident.len(), 1);
        assert!(confident.contains(url("/gaming-news").as_str()));
    }

    #[tokio::test]
    async fn test_no_urls_no_work() {
        let classifier = Classifier::new(
            Arc::new(FixedExtractor(HashMap::new())),
            Arc::new(FrequencySummarizer::default()),
            vec!["gaming".to_string()],
            4,
        );
        assert!(classifier.confident(Vec::new()).await.is_empty());
    }
}
