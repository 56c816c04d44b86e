//! Publication of the API description and explorer.

use axum::body::Bytes;
use axum::http::header;
use axum::response::{IntoResponse, Redirect};
use axum::routing::get;
use axum::Router;
use utoipa::openapi::OpenApi;

use crate::config::ResolvedConfig;
use crate::docs::document::ApiDocument;
use crate::docs::explorer::{self, ExplorerConfig};

/// Explorer base path.
pub const DOCS_PATH: &str = "/docs";

/// Where the JSON document is served.
pub const DOCUMENT_PATH: &str = "/docs-json";

/// Explorer bootstrap script.
pub const INITIALIZER_PATH: &str = "/docs/swagger-initializer.js";

/// OAuth2 redirect page, relative to the service's domain URL.
pub const OAUTH2_REDIRECT_PATH: &str = "/docs/oauth2-redirect.html";

/// Renders the document and explorer once and serves the results.
#[derive(Debug, Clone)]
pub struct DocumentPublisher {
    document: ApiDocument,
    explorer: ExplorerConfig,
    index: Bytes,
    initializer: Bytes,
    redirect: Bytes,
}

impl DocumentPublisher {
    /// Build every published artifact for `config`.
    pub fn build(config: &ResolvedConfig, handler_docs: OpenApi) -> Result<Self, serde_json::Error> {
        let document = ApiDocument::build(config, handler_docs)?;
        let explorer = ExplorerConfig::from_config(config);
        let initializer = explorer::render_initializer(&explorer)?;

        Ok(Self {
            index: Bytes::from(explorer::render_index(
                &config.docs.title,
                &config.docs.asset_base_url,
            )),
            initializer: Bytes::from(initializer),
            redirect: Bytes::from(explorer::render_oauth2_redirect(
                &config.docs.asset_base_url,
            )),
            document,
            explorer,
        })
    }

    pub fn document(&self) -> &ApiDocument {
        &self.document
    }

    pub fn explorer(&self) -> &ExplorerConfig {
        &self.explorer
    }

    /// Routes serving the published artifacts.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let document = self.document.rendered();
        let index = self.index.clone();
        let initializer = self.initializer.clone();
        let redirect = self.redirect.clone();

        Router::new()
            .route(
                DOCUMENT_PATH,
                get(move || serve(document.clone(), "application/json")),
            )
            .route(
                DOCS_PATH,
                get(|| async { Redirect::permanent("/docs/") }),
            )
            .route(
                "/docs/",
                get({
                    let index = index.clone();
                    move || serve(index.clone(), "text/html; charset=utf-8")
                }),
            )
            .route(
                "/docs/index.html",
                get(move || serve(index.clone(), "text/html; charset=utf-8")),
            )
            .route(
                INITIALIZER_PATH,
                get(move || serve(initializer.clone(), "application/javascript; charset=utf-8")),
            )
            .route(
                OAUTH2_REDIRECT_PATH,
                get(move || serve(redirect.clone(), "text/html; charset=utf-8")),
            )
    }
}

async fn serve(body: Bytes, content_type: &'static str) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, content_type)], body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn publisher() -> DocumentPublisher {
        let config = ResolvedConfig::fixture("https://api.example.com");
        DocumentPublisher::build(&config, OpenApi::default()).unwrap()
    }

    async fn get(router: Router, uri: &str) -> axum::response::Response {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn serves_rendered_document() {
        let publisher = publisher();
        let response = get(publisher.router::<()>(), DOCUMENT_PATH).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, publisher.document().rendered());
    }

    #[tokio::test]
    async fn docs_path_redirects_to_explorer() {
        let response = get(publisher().router::<()>(), DOCS_PATH).await;
        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/docs/");
    }

    #[tokio::test]
    async fn initializer_points_at_redirect_page() {
        let response = get(publisher().router::<()>(), INITIALIZER_PATH).await;
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let script = String::from_utf8(body.to_vec()).unwrap();

        assert!(script.contains("https://api.example.com/docs/oauth2-redirect.html"));
        assert!(script.contains("\"clientId\": \"starter-docs\""));
        assert!(!script.contains("additionalQueryStringParams"));
    }
}
