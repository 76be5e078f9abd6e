use crate::classify::{ContentExtractor, ExtractError, ExtractedArticle};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

/// Paragraphs containing this marker are page furniture, not article text
const AD_MARKER: &str = "advertisement";

/// Extracts article text from `<p>` elements
///
/// The title comes from `<title>`. Paragraphs mentioning "advertisement" are
/// dropped, non-ASCII characters are removed, and the body is lowercased.
#[derive(Debug, Clone)]
pub struct HtmlContentExtractor {
    client: Client,
}

impl HtmlContentExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentExtractor for HtmlContentExtractor {
    async fn extract(&self, url: &Url) -> Result<ExtractedArticle, ExtractError> {
        let download = |source| ExtractError::Download {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url.as_str()).send().await.map_err(download)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await.map_err(download)?;
        let article = parse_article(&html);
        if article.text.trim().is_empty() {
            return Err(ExtractError::Empty(url.to_string()));
        }
        Ok(article)
    }
}

/// Pulls the title and paragraph text out of an HTML document
pub(crate) fn parse_article(html: &str) -> ExtractedArticle {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .map(|element| element.text().collect::<String>())
        })
        .map(|title| ascii_only(title.trim()))
        .unwrap_or_default();

    let mut paragraphs = Vec::new();
    if let Ok(selector) = Selector::parse("p") {
        for element in document.select(&selector) {
            let text = element.text().collect::<String>();
            let text = text.trim();
            if text.is_empty() || text.to_lowercase().contains(AD_MARKER) {
                continue;
            }
            paragraphs.push(ascii_only(text));
        }
    }

    ExtractedArticle {
        title,
        text: paragraphs.join("\n").to_lowercase(),
    }
}

fn ascii_only(text: &str) -> String {
    text.chars().filter(char::is_ascii).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ARTICLE: &str = r#"
        <html>
        <head><title> Big Café News </title></head>
        <body>
            <p>The NEW Console launched today.</p>
            <p>Advertisement: buy now</p>
            <p>Players <b>love</b> its naïve charm.</p>
            <p>   </p>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_article() {
        let article = parse_article(ARTICLE);
        assert_eq!(article.title, "Big Caf News");
        assert_eq!(
            article.text,
            "the new console launched today.\nplayers love its nave charm."
        );
    }

    #[test]
    fn test_parse_article_without_paragraphs() {
        let article = parse_article("<html><body><div>no paragraphs</div></body></html>");
        assert!(article.title.is_empty());
        assert!(article.text.is_empty());
    }

    #[tokio::test]
    async fn test_extract_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/story"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ARTICLE))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/empty"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let extractor = HtmlContentExtractor::new(Client::new());
        let story = Url::parse(&format!("{}/story", server.uri())).unwrap();
        let article = extractor.extract(&story).await.unwrap();
        assert!(article.text.contains("console"));

        let empty = Url::parse(&format!("{}/empty", server.uri())).unwrap();
        assert!(matches!(extractor.extract(&empty).await, Err(ExtractError::Empty(_))));

        let missing = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        assert!(matches!(
            extractor.extract(&missing).await,
            Err(ExtractError::Status { status: 404, .. })
        ));
    }
}
