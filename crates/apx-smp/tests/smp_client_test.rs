//! Contract tests for SmpClient against a simulated SMP.
//!
//! wiremock stands in for the SMP; the client is pointed at it through
//! `SmpConfig::smp_override`, keeping the SML-derived request path.
//!
//! | Scenario | Test |
//! |----------|------|
//! | plain / gzip / deflate bodies | `fetch_*` |
//! | non-success status, refused connection | `lookup_*_is_lookup_error` |
//! | non-success status with truncated body | `lookup_status_with_unreadable_body_*` |
//! | bad XML | `malformed_metadata_*` |
//! | endpoint + certificate selection | `resolve_*`, `endpoint_*` |

use std::io::Write;

use apx_core::certificate::test_support::self_signed;
use apx_core::{DocumentTypeId, ParticipantId, ProcessId};
use apx_smp::{MalformedMetadataError, ResolutionError, SmpClient, SmpConfig};
use base64::Engine;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIXTURE: &str = include_str!("fixtures/signed_service_metadata.xml");

const LOOKUP_PATH: &str = "/iso6523-actorid-upis%3A%3A9908%3A810017902/services/busdox-docid-qns%3A%3Aurn%3Aoasis%3Anames%3Aspecification%3Aubl%3Aschema%3Axsd%3AInvoice-2%3A%3AInvoice%23%23urn%3Awww.cenbii.eu%3Atransaction%3Abiicoretrdm010%3Aver1.0%3A%23urn%3Awww.peppol.eu%3Abis%3Apeppol4a%3Aver1.0%3A%3A2.0";

fn recipient() -> ParticipantId {
    ParticipantId::new("iso6523-actorid-upis", "9908:810017902").unwrap()
}

fn invoice() -> DocumentTypeId {
    "busdox-docid-qns::urn:oasis:names:specification:ubl:schema:xsd:Invoice-2::Invoice##urn:www.cenbii.eu:transaction:biicoretrdm010:ver1.0:#urn:www.peppol.eu:bis:peppol4a:ver1.0::2.0"
        .parse()
        .unwrap()
}

fn bii05() -> ProcessId {
    ProcessId::new("cenbii-procid-ubl", "urn:www.cenbii.eu:profile:bii05:ver1.0").unwrap()
}

fn client_for(server: &MockServer) -> SmpClient {
    SmpClient::new(SmpConfig::local_mock(&server.uri()).unwrap()).unwrap()
}

async fn serve(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(LOOKUP_PATH))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

/// Fixture with the bii05 certificate swapped for a real one.
fn fixture_with_real_certificate(common_name: &str) -> String {
    let (_, cert) = self_signed(Some(common_name)).unwrap();
    let b64 = base64::engine::general_purpose::STANDARD.encode(cert.to_der().unwrap());
    FIXTURE.replace("Y2VydGlmaWNhdGUtZm9yLXByb2N1cmVtZW50", &b64)
}

// ── retrieval ────────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_plain_body_on_derived_path() {
    let server = MockServer::start().await;
    serve(&server, ResponseTemplate::new(200).set_body_string(FIXTURE)).await;

    let xml = client_for(&server)
        .fetch_metadata(&recipient(), &invoice())
        .await
        .unwrap();
    assert_eq!(xml, FIXTURE);
}

#[tokio::test]
async fn fetch_decodes_gzip() {
    let server = MockServer::start().await;
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(FIXTURE.as_bytes()).unwrap();
    serve(
        &server,
        ResponseTemplate::new(200)
            .insert_header("Content-Encoding", "gzip")
            .set_body_bytes(enc.finish().unwrap()),
    )
    .await;

    let md = client_for(&server).lookup(&recipient(), &invoice()).await.unwrap();
    assert_eq!(md.processes.len(), 2);
}

#[tokio::test]
async fn fetch_decodes_deflate() {
    let server = MockServer::start().await;
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(FIXTURE.as_bytes()).unwrap();
    serve(
        &server,
        ResponseTemplate::new(200)
            .insert_header("Content-Encoding", "deflate")
            .set_body_bytes(enc.finish().unwrap()),
    )
    .await;

    let xml = client_for(&server)
        .fetch_metadata(&recipient(), &invoice())
        .await
        .unwrap();
    assert_eq!(xml, FIXTURE);
}

// ── failures ─────────────────────────────────────────────────────────

#[tokio::test]
async fn lookup_status_404_is_lookup_error() {
    let server = MockServer::start().await;
    serve(&server, ResponseTemplate::new(404).set_body_string("no such participant")).await;

    match client_for(&server).lookup(&recipient(), &invoice()).await.unwrap_err() {
        ResolutionError::LookupStatus { status, body, url } => {
            assert_eq!(status, 404);
            assert_eq!(body, "no such participant");
            assert!(url.ends_with(LOOKUP_PATH));
        }
        other => panic!("expected LookupStatus, got: {other:?}"),
    }
}

#[tokio::test]
async fn lookup_status_with_unreadable_body_keeps_read_error() {
    // Promises 100 body bytes, sends 5, then closes.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 100\r\n\r\nshort")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let client =
        SmpClient::new(SmpConfig::local_mock(&format!("http://{addr}")).unwrap()).unwrap();
    match client.lookup(&recipient(), &invoice()).await.unwrap_err() {
        ResolutionError::LookupStatusBody { status, url, .. } => {
            assert_eq!(status, 503);
            assert!(url.ends_with(LOOKUP_PATH));
        }
        other => panic!("expected LookupStatusBody, got: {other:?}"),
    }
}

#[tokio::test]
async fn lookup_connection_refused_is_lookup_error() {
    let client = SmpClient::new(SmpConfig::local_mock("http://127.0.0.1:1").unwrap()).unwrap();
    let err = client.fetch_metadata(&recipient(), &invoice()).await.unwrap_err();
    assert!(matches!(err, ResolutionError::Lookup { .. }), "got: {err:?}");
}

#[tokio::test]
async fn malformed_metadata_is_distinct_from_lookup_failure() {
    let server = MockServer::start().await;
    serve(&server, ResponseTemplate::new(200).set_body_string("<html>maintenance</html>")).await;

    match client_for(&server).lookup(&recipient(), &invoice()).await.unwrap_err() {
        ResolutionError::MalformedMetadata { source, .. } => {
            assert!(matches!(source, MalformedMetadataError::UnexpectedRoot { .. }));
        }
        other => panic!("expected MalformedMetadata, got: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_metadata_on_empty_body() {
    let server = MockServer::start().await;
    serve(&server, ResponseTemplate::new(200)).await;

    let err = client_for(&server).lookup(&recipient(), &invoice()).await.unwrap_err();
    assert!(matches!(
        err,
        ResolutionError::MalformedMetadata { source: MalformedMetadataError::Xml(_), .. }
    ));
}

// ── selection ────────────────────────────────────────────────────────

#[tokio::test]
async fn endpoint_address_is_first_of_first() {
    let server = MockServer::start().await;
    serve(&server, ResponseTemplate::new(200).set_body_string(FIXTURE)).await;

    let address = client_for(&server)
        .endpoint_address(&recipient(), &invoice())
        .await
        .unwrap();
    assert_eq!(address.as_str(), "https://ap.example.no/as2");
}

#[tokio::test]
async fn endpoint_certificate_not_found_is_none() {
    let server = MockServer::start().await;
    serve(&server, ResponseTemplate::new(200).set_body_string(FIXTURE)).await;

    let unknown = ProcessId::new("cenbii-procid-ubl", "urn:nobody").unwrap();
    let cert = client_for(&server)
        .endpoint_certificate(&recipient(), &invoice(), &unknown)
        .await
        .unwrap();
    assert!(cert.is_none());
}

#[tokio::test]
async fn resolve_combines_address_and_filtered_certificate() {
    let server = MockServer::start().await;
    serve(
        &server,
        ResponseTemplate::new(200).set_body_string(fixture_with_real_certificate("APP_1000000009")),
    )
    .await;

    let record = client_for(&server)
        .resolve(&recipient(), &invoice(), &bii05())
        .await
        .unwrap();
    // Address ignores the process; certificate honours it.
    assert_eq!(record.address.as_str(), "https://ap.example.no/as2");
    assert_eq!(record.transport_profile, "busdox-transport-as2-ver1p0");
    assert_eq!(record.common_name, "APP_1000000009");
    assert_eq!(record.system_identifier().unwrap().as_str(), "APP_1000000009");
    assert_eq!(record.certificate_fingerprint().len(), 95);
}

#[tokio::test]
async fn resolve_without_matching_process_fails() {
    let server = MockServer::start().await;
    serve(&server, ResponseTemplate::new(200).set_body_string(FIXTURE)).await;

    let unknown = ProcessId::new("cenbii-procid-ubl", "urn:nobody").unwrap();
    let err = client_for(&server)
        .resolve(&recipient(), &invoice(), &unknown)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolutionError::NoMatchingProcess { .. }), "got: {err:?}");
}

#[tokio::test]
async fn resolve_with_undecodable_certificate_fails() {
    let server = MockServer::start().await;
    serve(&server, ResponseTemplate::new(200).set_body_string(FIXTURE)).await;

    // The fixture certificates are placeholders, not DER.
    let err = client_for(&server)
        .resolve(&recipient(), &invoice(), &bii05())
        .await
        .unwrap_err();
    assert!(matches!(err, ResolutionError::Certificate { .. }), "got: {err:?}");
}
