//! API description built from the resolved configuration.

use axum::body::Bytes;
use utoipa::openapi::external_docs::ExternalDocsBuilder;
use utoipa::openapi::security::{AuthorizationCode, Flow, OAuth2, Scopes, SecurityScheme};
use utoipa::openapi::server::ServerBuilder;
use utoipa::openapi::{ComponentsBuilder, InfoBuilder, OpenApi, OpenApiBuilder};

use crate::config::ResolvedConfig;

/// Base path advertised as the document's server.
pub const SERVER_BASE_PATH: &str = "/docs";

/// Name of the OAuth2 security scheme.
///
/// The scheme is only declared; no operation requires it unless its own
/// path docs say so.
pub const OAUTH2_SCHEME: &str = "oauth2";

/// The published API description of one generation.
///
/// The JSON rendering happens once, so every request for the document is
/// answered with the same bytes.
#[derive(Debug, Clone)]
pub struct ApiDocument {
    openapi: OpenApi,
    rendered: Bytes,
}

impl ApiDocument {
    /// Build the document from config and merge the handler graph's paths into it.
    pub fn build(config: &ResolvedConfig, handler_docs: OpenApi) -> Result<Self, serde_json::Error> {
        let info = InfoBuilder::new()
            .title(config.docs.title.clone())
            .description(Some(config.docs.description.clone()))
            .version(config.version.clone())
            .build();

        let external_docs = ExternalDocsBuilder::new()
            .url(config.docs.external_doc_url.clone())
            .description(Some(config.docs.external_doc_label.clone()))
            .build();

        let oauth2 = OAuth2::new([Flow::AuthorizationCode(AuthorizationCode::new(
            config.openid.authorization_endpoint.clone(),
            config.openid.token_endpoint.clone(),
            Scopes::from_iter([
                ("openid", "OpenID Connect"),
                ("profile", "User profile"),
                ("email", "User email"),
            ]),
        ))]);

        let components = ComponentsBuilder::new()
            .security_scheme(OAUTH2_SCHEME, SecurityScheme::OAuth2(oauth2))
            .build();

        let mut openapi = OpenApiBuilder::new()
            .info(info)
            .external_docs(Some(external_docs))
            .servers(Some(vec![ServerBuilder::new().url(SERVER_BASE_PATH).build()]))
            .components(Some(components))
            .build();
        openapi.merge(handler_docs);

        let rendered = Bytes::from(openapi.to_pretty_json()?);

        Ok(Self { openapi, rendered })
    }

    pub fn openapi(&self) -> &OpenApi {
        &self.openapi
    }

    pub fn version(&self) -> &str {
        &self.openapi.info.version
    }

    /// The JSON rendering served to clients.
    pub fn rendered(&self) -> Bytes {
        self.rendered.clone()
    }
}
