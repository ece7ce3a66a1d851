use std::io::Cursor;
use std::sync::Arc;

use langforge::client::Client;
use langforge::construct::{Keyword, LanguageSpecification, Operator, SyntaxRule};
use langforge::error::LangforgeError;
use langforge::persist::PersistenceMode;
use langforge::primitive::{Associativity, LanguageType, RuleType};
use langforge::protocol::{ErrorBody, GenerateOptions};
use langforge::remote::HttpCollaborator;
use langforge::server::{router, WELCOME};
use langforge::workshop::Workshop;
use pretty_assertions::assert_eq;
use tokio::net::TcpListener;

fn mini() -> LanguageSpecification {
    LanguageSpecification::new("Mini")
        .with_keyword(Keyword::new("if"))
        .with_operator(Operator::new("+", 1, Associativity::Left))
        .with_syntax_rule(SyntaxRule::new(RuleType::Expression, "a + b", "+"))
}

async fn spawn_server() -> String {
    let workshop = Arc::new(Workshop::open(&PersistenceMode::InMemory).expect("workshop"));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("address");
    tokio::spawn(async move {
        axum::serve(listener, router(workshop)).await.expect("serve");
    });
    format!("http://{address}")
}

fn client(base: &str) -> Client<HttpCollaborator> {
    Client::new(HttpCollaborator::new(reqwest::Client::new(), base).expect("collaborator"))
}

#[tokio::test]
async fn welcome_names_the_service() {
    let base = spawn_server().await;
    let body: serde_json::Value = reqwest::get(&base)
        .await
        .expect("get")
        .json()
        .await
        .expect("json");
    assert_eq!(body["message"], WELCOME);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn full_lifecycle_over_http() {
    let base = spawn_server().await;
    let client = client(&base);
    let spec = mini().with_description("tiny");

    client.save(&spec).await.expect("save");
    assert_eq!(client.fetch("Mini").await.expect("fetch"), spec);

    let listed = client.list().await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].description, "tiny");
    assert_eq!(listed[0].language_type, LanguageType::Interpreted);

    let renamed = spec.with_name("Mini Two");
    client.update("Mini", &renamed).await.expect("update");
    assert!(matches!(client.fetch("Mini").await, Err(LangforgeError::NotFound(_))));
    assert_eq!(client.fetch("Mini Two").await.expect("fetch"), renamed);

    let result = client
        .generate(&renamed, GenerateOptions::default())
        .await
        .expect("generate");
    assert_eq!(result.language_name, "Mini Two");
    assert!(!result.files_generated.is_empty());

    let archive = client.download("Mini Two").await.expect("download");
    assert_eq!(archive.file_name, "Mini Two.zip");
    let zip = zip::ZipArchive::new(Cursor::new(archive.bytes)).expect("zip");
    assert_eq!(zip.len(), result.files_generated.len());
    assert!(zip.file_names().all(|name| name.starts_with("mini_two/")));

    client.delete("Mini Two").await.expect("delete");
    assert!(matches!(
        client.delete("Mini Two").await,
        Err(LangforgeError::NotFound(_))
    ));
}

#[tokio::test]
async fn download_sets_attachment_headers() {
    let base = spawn_server().await;
    let client = client(&base);
    client
        .generate(&mini(), GenerateOptions::default())
        .await
        .expect("generate");
    let response = reqwest::get(format!("{base}/api/download/Mini"))
        .await
        .expect("get");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/zip");
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=Mini.zip"
    );
}

#[tokio::test]
async fn missing_archive_is_not_found() {
    let base = spawn_server().await;
    let client = client(&base);
    assert!(matches!(
        client.download("Nothing").await,
        Err(LangforgeError::NotFound(_))
    ));
}

#[tokio::test]
async fn server_rejects_invalid_specifications_itself() {
    let base = spawn_server().await;
    let http = reqwest::Client::new();
    let duplicate = mini().with_keyword(Keyword::new("if"));
    let response = http
        .post(format!("{base}/api/languages"))
        .json(&duplicate)
        .send()
        .await
        .expect("post");
    assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = response.json().await.expect("json");
    assert_eq!(body["code"], "StructuralViolation");
    assert_eq!(body["violations"][0]["code"], "DuplicateKeyword");
    assert_eq!(body["violations"][0]["severity"], "blocking");

    // advisory findings pass storage but not generation
    let advisory = mini().with_syntax_rule(SyntaxRule::new(RuleType::Statement, "s", "ghost"));
    let response = http
        .post(format!("{base}/api/generate"))
        .json(&serde_json::json!({ "specification": advisory, "include_examples": false }))
        .send()
        .await
        .expect("post");
    assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
    let body: ErrorBody = response.json().await.expect("error body");
    assert_eq!(body.code, "StructuralViolation");
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("address");
    drop(listener);
    let client = client(&format!("http://{address}"));
    assert!(matches!(client.list().await, Err(LangforgeError::Transport(_))));
}

#[tokio::test]
async fn rename_onto_an_existing_language_conflicts() {
    let base = spawn_server().await;
    let client = client(&base);
    client.save(&mini()).await.expect("save mini");
    client.save(&mini().with_name("Maxi")).await.expect("save maxi");
    match client.update("Mini", &mini().with_name("Maxi")).await {
        Err(LangforgeError::Collaborator { code, .. }) => assert_eq!(code, 409),
        other => panic!("expected a conflict, got {other:?}"),
    }
    assert_eq!(client.list().await.expect("list").len(), 2);
}
