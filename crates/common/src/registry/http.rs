use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode};
use url::Url;

use super::{PinRequest, RegistryClient, RegistryError, RegistryStatus};
use crate::dataset::DatasetRef;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const PIN_PATH: &str = "/registry/pin";
const DATASET_PATH: &str = "/registry/dataset";

/// Registry reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpRegistryClient {
    remote: Url,
    client: Client,
}

impl HttpRegistryClient {
    pub fn new(remote: &Url) -> Result<Self, RegistryError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(default_headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.remote
    }

    async fn send(
        &self,
        request: RequestBuilder,
        reference: &DatasetRef,
    ) -> Result<reqwest::Response, RegistryError> {
        let response = request.send().await?;
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(RegistryError::NotFound(reference.to_string())),
            status => Err(RegistryError::Status(
                status.as_u16(),
                response.text().await.unwrap_or_default(),
            )),
        }
    }
}

#[async_trait]
impl RegistryClient for HttpRegistryClient {
    async fn pin(&self, reference: &DatasetRef, addrs: &[String]) -> Result<(), RegistryError> {
        let url = self.remote.join(PIN_PATH)?;
        let body = PinRequest {
            reference: reference.clone(),
            addrs: addrs.to_vec(),
        };
        match self.send(self.client.post(url).json(&body), reference).await {
            Err(RegistryError::Status(501, _)) => Err(RegistryError::PinningNotSupported),
            result => result.map(|_| ()),
        }
    }

    async fn publish(&self, reference: &DatasetRef) -> Result<(), RegistryError> {
        let url = self.remote.join(DATASET_PATH)?;
        self.send(self.client.post(url).json(reference), reference)
            .await?;
        Ok(())
    }

    async fn unpublish(&self, reference: &DatasetRef) -> Result<(), RegistryError> {
        let url = self.remote.join(DATASET_PATH)?;
        self.send(self.client.delete(url).json(reference), reference)
            .await?;
        Ok(())
    }

    async fn status(&self, reference: &DatasetRef) -> Result<RegistryStatus, RegistryError> {
        let url = self.remote.join(DATASET_PATH)?;
        let request = self
            .client
            .get(url)
            .query(&[("ref", reference.to_string())]);
        match self.send(request, reference).await {
            Ok(response) => Ok(response.json().await?),
            Err(RegistryError::NotFound(_)) => Ok(RegistryStatus::default()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};

    use super::*;

    async fn serve(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{}", addr)).unwrap()
    }

    fn reference() -> DatasetRef {
        DatasetRef::new("b5", "precip").with_path("/map/abc")
    }

    #[tokio::test]
    async fn test_indexing_only_registry() {
        let router = Router::new()
            .route(
                PIN_PATH,
                post(|| async { StatusCode::NOT_IMPLEMENTED }),
            )
            .route(
                DATASET_PATH,
                post(|Json(r): Json<DatasetRef>| async move {
                    assert_eq!(r.name, "precip");
                    StatusCode::OK
                })
                .delete(|| async { StatusCode::NOT_FOUND })
                .get(|Query(q): Query<HashMap<String, String>>| async move {
                    Json(RegistryStatus {
                        published: q.get("ref").map(String::as_str) == Some("b5/precip@/map/abc"),
                    })
                }),
            );
        let client = HttpRegistryClient::new(&serve(router).await).unwrap();

        assert!(matches!(
            client.pin(&reference(), &["/ip4/127.0.0.1/tcp/1".to_string()]).await,
            Err(RegistryError::PinningNotSupported)
        ));
        client.publish(&reference()).await.unwrap();
        assert!(matches!(
            client.unpublish(&reference()).await,
            Err(RegistryError::NotFound(_))
        ));
        assert!(client.status(&reference()).await.unwrap().published);
    }

    #[tokio::test]
    async fn test_pin_sends_addresses() {
        let router = Router::new().route(
            PIN_PATH,
            post(|Json(req): Json<PinRequest>| async move {
                if req.addrs.len() == 2 && req.reference.path == "/map/abc" {
                    StatusCode::OK
                } else {
                    StatusCode::BAD_REQUEST
                }
            }),
        );
        let client = HttpRegistryClient::new(&serve(router).await).unwrap();

        let addrs = vec![
            "/ip4/127.0.0.1/tcp/1/p2p/a".to_string(),
            "/ip4/10.0.0.2/tcp/1/p2p/a".to_string(),
        ];
        client.pin(&reference(), &addrs).await.unwrap();
        assert!(matches!(
            client.pin(&reference(), &addrs[..1]).await,
            Err(RegistryError::Status(400, _))
        ));
    }

    #[tokio::test]
    async fn test_server_errors_keep_body() {
        let router = Router::new().route(
            DATASET_PATH,
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "registry on fire") }),
        );
        let client = HttpRegistryClient::new(&serve(router).await).unwrap();

        match client.publish(&reference()).await {
            Err(RegistryError::Status(500, body)) => assert_eq!(body, "registry on fire"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_dataset_is_unpublished() {
        let client = HttpRegistryClient::new(&serve(Router::new()).await).unwrap();
        assert!(!client.status(&reference()).await.unwrap().published);
    }
}
