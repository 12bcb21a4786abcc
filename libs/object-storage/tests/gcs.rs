//! Google Cloud Storage provider against a mock JSON API

use std::collections::HashMap;

use bytes::Bytes;
use cloud_core::gcp::GcpCredentials;
use cloud_core::Environment;
use object_storage::providers::GoogleCloudStorage;
use object_storage::{
    create_object_storage, default_object_storage_providers, GoogleCloudStorageConfig,
    ObjectStorage, ObjectStorageManager, StorageError, StoredPrefix, GOOGLE_CLOUD_STORAGE,
};
use serde_json::json;
use wiremock::matchers::{body_bytes, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT: &str = "storage-project";
const TOKEN: &str = "storage-token";

fn storage(server: &MockServer) -> GoogleCloudStorage {
    let config = GoogleCloudStorageConfig::new(PROJECT, GcpCredentials::with_token(TOKEN))
        .with_endpoint(server.uri());
    GoogleCloudStorage::new(config).unwrap()
}

fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

async fn mount_bucket(server: &MockServer, name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/storage/v1/b/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "storage#bucket",
            "name": name,
            "labels": { "env": "test" }
        })))
        .mount(server)
        .await;
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({
        "error": { "code": 404, "message": "The specified bucket does not exist." }
    }))
}

#[tokio::test]
async fn test_bucket_exists_and_get_item() {
    let server = MockServer::start().await;
    mount_bucket(&server, "media").await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b/missing"))
        .respond_with(not_found())
        .mount(&server)
        .await;

    let gcs = storage(&server);

    assert!(gcs.exists("media").await.unwrap());
    assert!(!gcs.exists("missing").await.unwrap());

    let area = gcs.get_item("media").await.unwrap().unwrap();
    assert_eq!(area.name, "media");
    assert_eq!(area.tags, tags(&[("env", "test")]));
    assert!(gcs.get_item("missing").await.unwrap().is_none());

    assert_eq!(gcs.get("media").await.unwrap().unwrap().bucket(), "media");
    assert!(gcs.get("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_buckets_follows_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b"))
        .and(query_param("project", PROJECT))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "name": "third" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b"))
        .and(query_param("project", PROJECT))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "name": "first", "labels": { "team": "data" } },
                { "name": "second" }
            ],
            "nextPageToken": "page-2"
        })))
        .mount(&server)
        .await;

    let areas = storage(&server).list().await.unwrap();
    let names: Vec<&str> = areas.iter().map(|a| a.name.as_str()).collect();

    assert_eq!(names, vec!["first", "second", "third"]);
    assert_eq!(areas[0].tags, tags(&[("team", "data")]));
    assert!(areas[1].tags.is_empty());
}

#[tokio::test]
async fn test_create_bucket_sanitizes_labels() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/b"))
        .and(query_param("project", PROJECT))
        .and(body_json(json!({
            "name": "reports",
            "labels": { "team": "finance" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "reports" })))
        .expect(1)
        .mount(&server)
        .await;

    let bucket = storage(&server)
        .create(
            "reports",
            false,
            &tags(&[("Team", "Finance"), ("cost.center", "42")]),
        )
        .await
        .unwrap();

    assert_eq!(bucket.bucket(), "reports");
}

#[tokio::test]
async fn test_create_public_bucket() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/b"))
        .and(query_param("predefinedAcl", "publicRead"))
        .and(query_param("predefinedDefaultObjectAcl", "publicRead"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "site" })))
        .expect(1)
        .mount(&server)
        .await;

    storage(&server)
        .create("site", true, &HashMap::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_create_existing_bucket_conflicts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/b"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": { "code": 409, "message": "You already own this bucket." }
        })))
        .mount(&server)
        .await;

    let err = storage(&server)
        .create("taken", false, &HashMap::new())
        .await
        .err()
        .unwrap();

    assert!(matches!(err, StorageError::AlreadyExists(name) if name == "taken"));
}

#[tokio::test]
async fn test_delete_bucket() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/storage/v1/b/old"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/storage/v1/b/gone"))
        .respond_with(not_found())
        .mount(&server)
        .await;

    let gcs = storage(&server);

    gcs.delete("old").await.unwrap();
    assert!(matches!(
        gcs.delete("gone").await,
        Err(StorageError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_upload_then_tags_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/storage/v1/b/media/o"))
        .and(query_param("uploadType", "media"))
        .and(query_param("name", "docs/readme.md"))
        .and(body_bytes(b"# hello".to_vec()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "docs/readme.md" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/storage/v1/b/media/o/docs%2Freadme.md"))
        .and(body_json(json!({ "metadata": { "kind": "doc" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "docs/readme.md" })))
        .expect(1)
        .mount(&server)
        .await;

    storage(&server)
        .bucket("media")
        .upload(
            "docs/readme.md",
            Bytes::from_static(b"# hello"),
            &tags(&[("Kind", "DOC"), ("bad tag", "x")]),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_upload_without_tags_skips_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/storage/v1/b/media/o"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "a.bin" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    storage(&server)
        .bucket("media")
        .upload("a.bin", Bytes::from_static(&[1, 2, 3]), &HashMap::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_object_exists_download_delete() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b/media/o/report.csv"))
        .and(query_param("alt", "media"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"a,b\n1,2\n".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b/media/o/report.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "report.csv", "size": "8"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b/media/o/missing.csv"))
        .respond_with(not_found())
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/storage/v1/b/media/o/report.csv"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let bucket = storage(&server).bucket("media");

    assert!(bucket.exists("report.csv").await.unwrap());
    assert!(!bucket.exists("missing.csv").await.unwrap());
    assert_eq!(
        bucket.download("report.csv").await.unwrap(),
        Bytes::from_static(b"a,b\n1,2\n")
    );
    assert!(matches!(
        bucket.download("missing.csv").await,
        Err(StorageError::NotFound(what)) if what == "gs://media/missing.csv"
    ));
    bucket.delete("report.csv").await.unwrap();
}

#[tokio::test]
async fn test_list_objects_and_prefixes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b/media/o"))
        .and(query_param("prefix", "2024/"))
        .and(query_param("delimiter", "/"))
        .and(query_param("pageToken", "next"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "prefixes": ["2024/02/"]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b/media/o"))
        .and(query_param("prefix", "2024/"))
        .and(query_param("delimiter", "/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "name": "2024/summary.txt",
                "size": "12",
                "md5Hash": "1B2M2Y8AsgTpgAmY7PhCfg==",
                "metadata": { "owner": "ops" }
            }],
            "prefixes": ["2024/01/"],
            "nextPageToken": "next"
        })))
        .mount(&server)
        .await;

    let (objects, prefixes) = storage(&server)
        .bucket("media")
        .list("2024/")
        .await
        .unwrap();

    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].key, "2024/summary.txt");
    assert_eq!(objects[0].size, 12);
    assert_eq!(objects[0].md5, "1B2M2Y8AsgTpgAmY7PhCfg==");
    assert_eq!(objects[0].tags, tags(&[("owner", "ops")]));
    assert_eq!(
        prefixes,
        vec![
            StoredPrefix { key: "2024/01/".to_string() },
            StoredPrefix { key: "2024/02/".to_string() },
        ]
    );
}

#[tokio::test]
async fn test_permission_denied_is_not_treated_as_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b/locked/o/secret.txt"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "does not have storage.objects.get access" }
        })))
        .mount(&server)
        .await;

    let err = storage(&server)
        .bucket("locked")
        .exists("secret.txt")
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_factory_from_environment() {
    let server = MockServer::start().await;
    mount_bucket(&server, "media").await;

    let uri = server.uri();
    let env = Environment::from_map([
        ("GCP_PROJECT", PROJECT),
        ("GCP_ACCESS_TOKEN", TOKEN),
        ("GCP_STORAGE_ENDPOINT", uri.as_str()),
    ]);
    let registry = default_object_storage_providers();

    let manager = create_object_storage(&registry, GOOGLE_CLOUD_STORAGE, &env)
        .await
        .unwrap();
    assert_eq!(manager.name(), "gcp-storage");
    assert!(manager.exists("media").await.unwrap());

    let err = create_object_storage(&registry, "s3", &env)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, StorageError::ProviderUnavailable(msg) if msg.contains("s3")));
}

#[tokio::test]
async fn test_unauthorized_refreshes_metadata_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/computeMetadata/v1/instance/service-accounts/default/token"))
        .and(header("Metadata-Flavor", "Google"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "minted",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b/media"))
        .and(header("authorization", "Bearer minted"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let credentials = GcpCredentials {
        access_token: None,
        metadata_host: server.address().to_string(),
    };
    let config = GoogleCloudStorageConfig::new(PROJECT, credentials).with_endpoint(server.uri());
    let gcs = GoogleCloudStorage::new(config).unwrap();

    for _ in 0..2 {
        assert!(matches!(
            gcs.get_item("media").await,
            Err(StorageError::AuthenticationFailed(_))
        ));
    }
}
