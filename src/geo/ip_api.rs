use crate::geo::{GeoError, Geolocator};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::net::IpAddr;
use url::Url;

/// Response body of an ip-api style JSON endpoint
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Geolocator backed by an ip-api compatible HTTP service
///
/// Sends `GET {endpoint}/{ip}` and reads the `city` field of a
/// `"status": "success"` response.
#[derive(Debug, Clone)]
pub struct IpApiGeolocator {
    client: Client,
    endpoint: Url,
}

impl IpApiGeolocator {
    pub fn new(client: Client, endpoint: &str) -> Result<Self, GeoError> {
        let endpoint = Url::parse(endpoint).map_err(|e| GeoError::Endpoint(e.to_string()))?;
        if endpoint.cannot_be_a_base() {
            return Err(GeoError::Endpoint(endpoint.to_string()));
        }
        Ok(Self { client, endpoint })
    }

    fn lookup_url(&self, ip: IpAddr) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&ip.to_string());
        }
        url
    }
}

#[async_trait]
impl Geolocator for IpApiGeolocator {
    async fn lookup(&self, ip: IpAddr) -> Result<Option<String>, GeoError> {
        let response: IpApiResponse = self
            .client
            .get(self.lookup_url(ip))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status != "success" {
            return Err(GeoError::Rejected {
                ip,
                message: response.message.unwrap_or(response.status),
            });
        }

        Ok(response.city.filter(|city| !city.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_lookup_url_appends_ip() {
        let geo = IpApiGeolocator::new(Client::new(), "http://ip-api.com/json/").unwrap();
        let ip: IpAddr = "8.8.8.8".parse().unwrap();
        assert_eq!(geo.lookup_url(ip).as_str(), "http://ip-api.com/json/8.8.8.8");
    }

    #[test]
    fn test_rejects_unusable_endpoint() {
        assert!(IpApiGeolocator::new(Client::new(), "not a url").is_err());
        assert!(IpApiGeolocator::new(Client::new(), "mailto:geo@example.com").is_err());
    }

    #[tokio::test]
    async fn test_lookup_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json/1.2.3.4"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": "success", "city": "Dublin"})),
            )
            .mount(&server)
            .await;

        let geo = IpApiGeolocator::new(Client::new(), &format!("{}/json", server.uri())).unwrap();
        let region = geo.lookup("1.2.3.4".parse().unwrap()).await.unwrap();
        assert_eq!(region.as_deref(), Some("Dublin"));
    }

    #[tokio::test]
    async fn test_lookup_failure_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json/10.0.0.1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"status": "fail", "message": "private range"}),
            ))
            .mount(&server)
            .await;

        let geo = IpApiGeolocator::new(Client::new(), &format!("{}/json", server.uri())).unwrap();
        let result = geo.lookup("10.0.0.1".parse().unwrap()).await;
        assert!(matches!(result, Err(GeoError::Rejected { .. })));
    }
}
