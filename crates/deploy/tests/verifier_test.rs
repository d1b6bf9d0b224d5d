//! [`EtherscanVerifier`] against an explorer API served over HTTP.

use std::{collections::HashMap, path::PathBuf, time::Duration};

use alloy_core::primitives::{Address, Bytes};
use graphrica_deploy::{EtherscanVerifier, ExplorerConfig, VerificationRequest, Verifier};
use serde_json::json;
use tempdir::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, method, path, query_param},
};

const GUID: &str = "ezq878u486pzijkvvmerl6a9mzwhv6sefgvqi5tkwceejc7tvn";

/// A Hardhat artifact with its `.dbg.json` and build info.
fn hardhat_fixture() -> (TempDir, PathBuf) {
    let dir = TempDir::new("artifacts").unwrap();
    let contract_dir = dir.path().join("contracts/Publication.sol");
    let build_info_dir = dir.path().join("build-info");
    std::fs::create_dir_all(&contract_dir).unwrap();
    std::fs::create_dir_all(&build_info_dir).unwrap();

    let artifact = contract_dir.join("Publication.json");
    std::fs::write(&artifact, "{}").unwrap();
    std::fs::write(
        contract_dir.join("Publication.dbg.json"),
        json!({"_format": "hh-sol-dbg-1", "buildInfo": "../../build-info/abc.json"}).to_string(),
    )
    .unwrap();
    std::fs::write(
        build_info_dir.join("abc.json"),
        json!({
            "solcLongVersion": "0.8.4+commit.c7e474f2",
            "input": {
                "language": "Solidity",
                "sources": {"contracts/Publication.sol": {"content": "contract Publication {}"}}
            }
        })
        .to_string(),
    )
    .unwrap();

    (dir, artifact)
}

fn request(artifact_path: PathBuf) -> VerificationRequest {
    VerificationRequest {
        name: "Publication".to_string(),
        fully_qualified_name: "contracts/Publication.sol:Publication".to_string(),
        address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap(),
        constructor_args: vec![],
        encoded_args: Bytes::from_static(&[0xab, 0xcd]),
        artifact_path,
    }
}

fn verifier(server: &MockServer, max_polls: usize) -> EtherscanVerifier {
    EtherscanVerifier::new(
        Some(ExplorerConfig {
            api_url: format!("{}/api", server.uri()).parse().unwrap(),
            api_key: "key".to_string(),
        }),
        Some(5),
    )
    .unwrap()
    .status_polling(Duration::from_millis(10), max_polls)
}

fn api(status: &str, result: &str) -> ResponseTemplate {
    let message = if status == "1" { "OK" } else { "NOTOK" };
    ResponseTemplate::new(200).set_body_json(json!({
        "status": status,
        "message": message,
        "result": result
    }))
}

async fn mount_submission(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api"))
        .and(query_param("chainid", "5"))
        .and(body_string_contains("action=verifysourcecode"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_submission_polled_until_verified() {
    let server = MockServer::start().await;
    mount_submission(&server, api("1", GUID)).await;
    Mock::given(method("GET"))
        .and(query_param("action", "checkverifystatus"))
        .and(query_param("guid", GUID))
        .respond_with(api("0", "Pending in queue"))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("action", "checkverifystatus"))
        .and(query_param("guid", GUID))
        .respond_with(api("1", "Pass - Verified"))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, artifact) = hardhat_fixture();
    verifier(&server, 5)
        .verify(&request(artifact))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let form: HashMap<String, String> = url::form_urlencoded::parse(&requests[0].body)
        .into_owned()
        .collect();
    assert_eq!(form["apikey"], "key");
    assert_eq!(form["codeformat"], "solidity-standard-json-input");
    assert_eq!(form["contractname"], "contracts/Publication.sol:Publication");
    assert_eq!(form["compilerversion"], "v0.8.4+commit.c7e474f2");
    assert_eq!(form["constructorArguements"], "abcd");
    assert_eq!(
        form["contractaddress"].parse::<Address>().unwrap(),
        "0x5FbDB2315678afecb367f032d93F642f64180aa3"
            .parse::<Address>()
            .unwrap()
    );
    let source: serde_json::Value = serde_json::from_str(&form["sourceCode"]).unwrap();
    assert_eq!(source["language"], "Solidity");
}

#[tokio::test]
async fn test_already_verified_skips_polling() {
    let server = MockServer::start().await;
    mount_submission(&server, api("0", "Contract source code already verified")).await;
    Mock::given(method("GET"))
        .respond_with(api("0", "Pending in queue"))
        .expect(0)
        .mount(&server)
        .await;

    let (_dir, artifact) = hardhat_fixture();
    verifier(&server, 5)
        .verify(&request(artifact))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_rejected_submission_fails() {
    let server = MockServer::start().await;
    mount_submission(&server, api("0", "Invalid API Key")).await;

    let (_dir, artifact) = hardhat_fixture();
    let err = verifier(&server, 5)
        .verify(&request(artifact))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Invalid API Key"), "{err:#}");
}

#[tokio::test]
async fn test_failed_verification_stops_polling() {
    let server = MockServer::start().await;
    mount_submission(&server, api("1", GUID)).await;
    Mock::given(method("GET"))
        .and(query_param("guid", GUID))
        .respond_with(api("0", "Fail - Unable to verify"))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, artifact) = hardhat_fixture();
    let err = verifier(&server, 5)
        .verify(&request(artifact))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Fail - Unable to verify"), "{err:#}");
}

#[tokio::test]
async fn test_status_polling_is_bounded() {
    let server = MockServer::start().await;
    mount_submission(&server, api("1", GUID)).await;
    Mock::given(method("GET"))
        .and(query_param("guid", GUID))
        .respond_with(api("0", "Pending in queue"))
        .expect(4)
        .mount(&server)
        .await;

    let (_dir, artifact) = hardhat_fixture();
    let err = verifier(&server, 3)
        .verify(&request(artifact))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("still pending"), "{err:#}");
}
