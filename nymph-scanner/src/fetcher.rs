use crate::error::{Result, ScanError};
use crate::listing::parse_listing;
use crate::result::{ListingPage, SpecimenPage};
use crate::specimen::parse_specimen;
use reqwest::{Client, Response};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = "Nymph/0.1 (+https://github.com/trapdoorsec/nymph)";

/// HTTP client for listing pages, specimen pages and image bytes.
/// Non-2xx responses are returned as [`ScanError::BadStatus`].
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(30)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<Response> {
        debug!("Fetching {}", url);
        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();
        debug!("{} {} in {:?}", status.as_u16(), url, start.elapsed());

        if !status.is_success() {
            return Err(ScanError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    pub async fn get_text(&self, url: &str) -> Result<String> {
        Ok(self.get(url).await?.text().await?)
    }

    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        Ok(self.get(url).await?.bytes().await?.to_vec())
    }

    /// Fetch and extract one listing page.
    pub async fn fetch_listing(&self, url: &str, first_page: bool) -> Result<ListingPage> {
        let body = self.get_text(url).await?;
        parse_listing(&body, url, first_page)
    }

    /// Fetch and extract one specimen page.
    pub async fn fetch_specimen(&self, url: &str) -> Result<SpecimenPage> {
        let body = self.get_text(url).await?;
        parse_specimen(&body, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    #[tokio::test]
    async fn test_fetch_listing_from_server() {
        let mock_server = MockServer::start().await;

        let html = format!(
            r#"<html><body>
                <a class="vl" href="{0}/specimen/1">One</a>
                <a class="vl" href="/specimen/2">Two</a>
                <div class="pld">Page 1 of 4</div>
            </body></html>"#,
            mock_server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/hatch/13/Plecoptera/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(html.as_bytes()),
            )
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::with_timeout(5).unwrap();
        let url = format!("{}/hatch/13/Plecoptera/", mock_server.uri());
        let page = fetcher.fetch_listing(&url, true).await.unwrap();

        assert_eq!(page.page_ceiling, Some(4));
        assert_eq!(
            page.specimen_urls,
            vec![
                format!("{}/specimen/1", mock_server.uri()),
                format!("{}/specimen/2", mock_server.uri()),
            ]
        );
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::with_timeout(5).unwrap();
        let err = fetcher
            .get_text(&format!("{}/gone", mock_server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, ScanError::BadStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_get_bytes_returns_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/42.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let bytes = fetcher
            .get_bytes(&format!("{}/42.jpg", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }
}
