//! Interactive API explorer (Swagger UI) configuration and pages.
//!
//! The explorer's scripts are loaded from `docs.asset_base_url`; only the
//! initializer and the OAuth2 redirect page are served by the service, so no
//! inline script is needed under the security header set.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::ResolvedConfig;
use crate::docs::publisher::{DOCUMENT_PATH, INITIALIZER_PATH, OAUTH2_REDIRECT_PATH};

/// OAuth client parameters handed to the explorer's `initOAuth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub app_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_query_string_params: Option<BTreeMap<String, String>>,
}

/// Everything the explorer needs to start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerConfig {
    pub url: String,
    pub oauth2_redirect_url: String,
    pub oauth: OAuthClientConfig,
}

impl ExplorerConfig {
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self {
            url: DOCUMENT_PATH.to_string(),
            oauth2_redirect_url: format!("{}{}", config.server.base_url(), OAUTH2_REDIRECT_PATH),
            oauth: OAuthClientConfig {
                client_id: config.auth.client_id.clone(),
                app_name: config.docs.app_name.clone(),
                additional_query_string_params: config.auth.additional_query_string_params.clone(),
            },
        }
    }
}

/// Explorer landing page.
pub fn render_index(title: &str, asset_base_url: &str) -> String {
    let assets = asset_base_url.trim_end_matches('/');
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <link rel="stylesheet" href="{assets}/swagger-ui.css">
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="{assets}/swagger-ui-bundle.js"></script>
  <script src="{assets}/swagger-ui-standalone-preset.js"></script>
  <script src="{INITIALIZER_PATH}"></script>
</body>
</html>
"#,
        title = escape_html(title),
    )
}

/// Script that boots the explorer with `config`.
pub fn render_initializer(config: &ExplorerConfig) -> Result<String, serde_json::Error> {
    let config = serde_json::to_string_pretty(config)?;
    Ok(format!(
        r##"window.onload = function () {{
  const {{ oauth, ...options }} = {config};
  window.ui = SwaggerUIBundle(Object.assign(options, {{
    dom_id: "#swagger-ui",
    deepLinking: true,
    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
    layout: "StandaloneLayout"
  }}));
  window.ui.initOAuth(oauth);
}};
"##
    ))
}

/// Page the OAuth2 provider redirects back to.
pub fn render_oauth2_redirect(asset_base_url: &str) -> String {
    let assets = asset_base_url.trim_end_matches('/');
    format!(
        r#"<!DOCTYPE html>
<html lang="en-US">
<head>
  <title>API Explorer: OAuth2 Redirect</title>
</head>
<body>
  <script src="{assets}/oauth2-redirect.js"></script>
</body>
</html>
"#
    )
}

fn escape_html(text: &str) -> String {
    text.chars()
        .fold(String::with_capacity(text.len()), |mut out, c| {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#39;"),
                c => out.push(c),
            }
            out
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oauth_config_omits_absent_query_params() {
        let oauth = OAuthClientConfig {
            client_id: "abc".into(),
            app_name: "Starter API".into(),
            additional_query_string_params: None,
        };
        let json = serde_json::to_value(&oauth).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"clientId": "abc", "appName": "Starter API"})
        );
    }

    #[test]
    fn oauth_config_keeps_present_query_params() {
        let oauth = OAuthClientConfig {
            client_id: "abc".into(),
            app_name: "Starter API".into(),
            additional_query_string_params: Some(BTreeMap::from([(
                "nonce".to_string(),
                "132456".to_string(),
            )])),
        };
        let json = serde_json::to_value(&oauth).unwrap();
        assert_eq!(json["additionalQueryStringParams"]["nonce"], "132456");
    }

    #[test]
    fn index_escapes_title_and_loads_initializer() {
        let html = render_index("A <b> & co", "https://unpkg.com/swagger-ui-dist@5/");
        assert!(html.contains("<title>A &lt;b&gt; &amp; co</title>"));
        assert!(html.contains("https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"));
        assert!(html.contains(r#"<script src="/docs/swagger-initializer.js"></script>"#));
    }
}
