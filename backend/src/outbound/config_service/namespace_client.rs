//! Config-service adapter for the [`NamespaceLookup`] port.

use async_trait::async_trait;
use reqwest::Url;

use super::rest_client::{RestClient, RestError};
use crate::domain::NamespaceRef;
use crate::domain::ports::{NamespaceInfo, NamespaceLookup, NamespaceLookupError};
use crate::settings::ConfigServiceSettings;

const API_BASE: [&str; 2] = ["openapi", "v1"];

/// Looks namespaces up through the config service's open API.
#[derive(Debug, Clone)]
pub struct HttpNamespaceLookup {
    rest: RestClient,
    base: Url,
    token: String,
}

impl HttpNamespaceLookup {
    /// Adapter for the endpoint described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceLookupError::InvalidEndpoint`] when scheme and
    /// hostname do not form a base URL.
    pub fn new(
        rest: RestClient,
        settings: &ConfigServiceSettings,
    ) -> Result<Self, NamespaceLookupError> {
        let base = settings
            .base_url()
            .map_err(|err| NamespaceLookupError::invalid_endpoint(err.to_string()))?;
        Ok(Self::with_base(rest, base, settings.token.clone()))
    }

    /// Adapter for an already parsed base URL.
    pub fn with_base(rest: RestClient, base: Url, token: impl Into<String>) -> Self {
        Self {
            rest,
            base,
            token: token.into(),
        }
    }

    /// `openapi/v1/envs/{env}/apps/{app}/clusters/{cluster}/namespaces/{ns}/`
    /// below the base URL, with every segment percent-encoded.
    fn namespace_url(&self, namespace: &NamespaceRef) -> Result<Url, NamespaceLookupError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                NamespaceLookupError::invalid_endpoint(format!("{} cannot be a base", self.base))
            })?
            .pop_if_empty()
            .extend(API_BASE)
            .extend([
                "envs",
                namespace.env.as_str(),
                "apps",
                namespace.app_id.as_str(),
                "clusters",
                namespace.cluster_name.as_str(),
                "namespaces",
                namespace.namespace_name.as_str(),
                "",
            ]);
        Ok(url)
    }
}

#[async_trait]
impl NamespaceLookup for HttpNamespaceLookup {
    async fn namespace_info(
        &self,
        namespace: &NamespaceRef,
    ) -> Result<NamespaceInfo, NamespaceLookupError> {
        let url = self.namespace_url(namespace)?;
        self.rest
            .post_json(url, &self.token, namespace)
            .await
            .map_err(map_rest_error)
    }
}

fn map_rest_error(error: RestError) -> NamespaceLookupError {
    match &error {
        RestError::Status { status, .. } => {
            NamespaceLookupError::status(status.as_u16(), error.to_string())
        }
        RestError::Decode { .. } => NamespaceLookupError::decode(error.to_string()),
        RestError::Encode { .. } | RestError::Transport { .. } => {
            NamespaceLookupError::transport(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    fn namespace(env: &str) -> NamespaceRef {
        NamespaceRef {
            app_id: "billing".into(),
            env: env.into(),
            cluster_name: "default".into(),
            namespace_name: "application".into(),
        }
    }

    fn lookup(base: &str) -> HttpNamespaceLookup {
        let rest = RestClient::with_timeout(Duration::from_secs(5)).expect("client builds");
        HttpNamespaceLookup::with_base(rest, Url::parse(base).expect("base url"), "secret")
    }

    #[test]
    fn builds_namespace_path_with_trailing_slash() {
        let url = lookup("http://apollo.internal:8070/")
            .namespace_url(&namespace("dev"))
            .expect("url builds");
        assert_eq!(
            url.as_str(),
            "http://apollo.internal:8070/openapi/v1/envs/dev/apps/billing/clusters/default/namespaces/application/"
        );
    }

    #[test]
    fn encodes_segments() {
        let url = lookup("http://apollo.internal/")
            .namespace_url(&namespace("qa/eu west"))
            .expect("url builds");
        assert!(url.path().starts_with("/openapi/v1/envs/qa%2Feu%20west/apps/"));
    }

    #[test]
    fn settings_with_unusable_host_are_rejected() {
        let settings = ConfigServiceSettings {
            scheme: "http".into(),
            hostname: "bad host".into(),
            token: "t".into(),
        };
        let rest = RestClient::new().expect("client builds");
        let err = HttpNamespaceLookup::new(rest, &settings).expect_err("invalid endpoint");
        assert!(matches!(err, NamespaceLookupError::InvalidEndpoint { .. }));
    }

    #[tokio::test]
    async fn posts_namespace_and_decodes_info() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(Method::POST)
                .path("/openapi/v1/envs/dev/apps/billing/clusters/default/namespaces/application/")
                .header("Authorization", "secret")
                .json_body(json!({
                    "app_id": "billing",
                    "env": "dev",
                    "cluster_name": "default",
                    "namespace_name": "application"
                }));
            then.status(200)
                .json_body(json!({"namespaceName": "application", "format": "properties"}));
        });

        let info = lookup(&server.base_url())
            .namespace_info(&namespace("dev"))
            .await
            .expect("lookup succeeds");

        mock.assert();
        assert_eq!(info.get("format"), Some(&json!("properties")));
    }

    #[tokio::test]
    async fn rejected_lookup_keeps_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(Method::POST);
            then.status(404).body("{\"message\":\"namespace not found\"}");
        });

        let err = lookup(&server.base_url())
            .namespace_info(&namespace("dev"))
            .await
            .expect_err("404 fails");

        match err {
            NamespaceLookupError::Status { status, message } => {
                assert_eq!(status, 404);
                assert!(message.starts_with("Invalid http 404 when rest "));
                assert!(message.ends_with("{\"message\":\"namespace not found\"}"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
