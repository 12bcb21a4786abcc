//! Resolving providers and environment services by registry id

use base64::{engine::general_purpose::STANDARD, Engine};
use cloud_core::Environment;
use secrecy::ExposeSecret;
use secrets::{
    create_environment_service, create_secrets_provider, default_environment_providers,
    default_secret_providers, EnvironmentService, SecretsClient, SecretsConfig, SecretsError,
    SecretsProvider, ENV_PROVIDER, GOOGLE_SECRETS_MANAGER, GOOGLE_SECRETS_MANAGER_CACHED,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gcp_env(server: &MockServer, extra: &[(&str, &str)]) -> Environment {
    let uri = server.uri();
    let mut values = vec![
        ("GCP_PROJECT", "registry-project"),
        ("GCP_ACCESS_TOKEN", "token"),
        ("GCP_SECRET_MANAGER_ENDPOINT", uri.as_str()),
    ];
    values.extend_from_slice(extra);
    Environment::from_map(values)
}

async fn mount_secret(server: &MockServer, id: &str, value: &[u8], expected_reads: u64) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/v1/projects/registry-project/secrets/{id}/versions/latest:access"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payload": {
                "data": STANDARD.encode(value),
                "dataCrc32c": crc32c::crc32c(value).to_string(),
            }
        })))
        .expect(expected_reads)
        .mount(server)
        .await;
}

#[test]
fn test_default_registries() {
    let secrets = default_secret_providers();
    assert_eq!(secrets.ids(), vec![ENV_PROVIDER, GOOGLE_SECRETS_MANAGER]);

    let environments = default_environment_providers();
    assert_eq!(
        environments.ids(),
        vec![GOOGLE_SECRETS_MANAGER, GOOGLE_SECRETS_MANAGER_CACHED]
    );
}

#[tokio::test]
async fn test_unknown_provider_id() {
    let registry = default_secret_providers();
    let env = Environment::from_map(Vec::<(&str, &str)>::new());

    let err = create_secrets_provider(&registry, "vault", &env)
        .await
        .err()
        .unwrap();

    assert!(matches!(err, SecretsError::ProviderUnavailable(msg) if msg.contains("vault")));
}

#[tokio::test]
async fn test_gcp_provider_requires_project() {
    let registry = default_secret_providers();
    let env = Environment::from_map([("GCP_ACCESS_TOKEN", "token")]);

    let err = create_secrets_provider(&registry, GOOGLE_SECRETS_MANAGER, &env)
        .await
        .err()
        .unwrap();

    assert!(matches!(err, SecretsError::Config(_)));
}

#[tokio::test]
async fn test_gcp_provider_from_registry() {
    let server = MockServer::start().await;
    mount_secret(&server, "greeting", b"hello", 1).await;

    let registry = default_secret_providers();
    let env = gcp_env(&server, &[]);
    let provider = create_secrets_provider(&registry, GOOGLE_SECRETS_MANAGER, &env)
        .await
        .unwrap();

    assert_eq!(provider.name(), "gcp-secret-manager");
    let value = provider.get_secret("greeting").await.unwrap().unwrap();
    assert_eq!(value.expose_secret(), "hello");
}

#[tokio::test]
async fn test_environment_service_uses_prefix() {
    let server = MockServer::start().await;
    mount_secret(&server, "BILLING_DB_PASSWORD", b"pw", 1).await;

    let registry = default_environment_providers();
    let env = gcp_env(&server, &[("PREFIX", "billing")]);
    let service = create_environment_service(&registry, GOOGLE_SECRETS_MANAGER, &env)
        .await
        .unwrap();

    let value = service.get("db-password").await.unwrap();
    assert_eq!(value.expose_secret(), "pw");
}

#[tokio::test]
async fn test_cached_environment_service_reads_once() {
    let server = MockServer::start().await;
    mount_secret(&server, "API_TOKEN", b"cached", 1).await;

    let registry = default_environment_providers();
    let service = create_environment_service(
        &registry,
        GOOGLE_SECRETS_MANAGER_CACHED,
        &gcp_env(&server, &[]),
    )
    .await
    .unwrap();

    for _ in 0..3 {
        assert_eq!(service.get("api_token").await.unwrap().expose_secret(), "cached");
    }
}

#[tokio::test]
async fn test_client_with_registry_provider() {
    let server = MockServer::start().await;
    mount_secret(&server, "CLIENT_SECRET", b"from-gcp", 1).await;

    let env = gcp_env(&server, &[("SECRETS_PROVIDER", "gcp-secrets")]);
    let registry = default_secret_providers();
    let client = SecretsClient::new(SecretsConfig::from_env(&env), &registry, &env).await;

    assert!(client.has_primary_provider());
    assert_eq!(client.get_secret_value("CLIENT_SECRET").await.unwrap(), "from-gcp");
    // Cache is on by default
    assert_eq!(client.get_secret_value("CLIENT_SECRET").await.unwrap(), "from-gcp");
}

#[tokio::test]
async fn test_client_falls_back_when_provider_cannot_start() {
    std::env::set_var("TEST_REGISTRY_FALLBACK", "env_value");

    let env = Environment::from_map([("SECRETS_PROVIDER", "gcp-secrets")]);
    let registry = default_secret_providers();
    let client = SecretsClient::new(SecretsConfig::from_env(&env), &registry, &env).await;

    assert!(!client.has_primary_provider());
    assert_eq!(
        client.get_secret_value("TEST_REGISTRY_FALLBACK").await.unwrap(),
        "env_value"
    );

    std::env::remove_var("TEST_REGISTRY_FALLBACK");
}
