// tests/verify_probe.rs
//
// Exercises the concrete HTTP verifier against local sockets, so the probe's
// request construction, status handling, timeout, and network-failure paths
// are all pinned by tests rather than stubbed out.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use masterlist::models::server::Endpoint;
use masterlist::verify::{ChallengeSource, HttpVerifier, ServerVerifier};

struct FixedChallenge(u32);

impl ChallengeSource for FixedChallenge {
    fn next_challenge(&self) -> u32 {
        self.0
    }
}

fn verifier(challenge: u32, timeout: Duration) -> HttpVerifier {
    HttpVerifier::new(
        Box::new(FixedChallenge(challenge)),
        "master.test".to_string(),
        "1.2.3".to_string(),
        timeout,
    )
}

fn endpoint_of(addr: SocketAddr) -> Endpoint {
    Endpoint::new(addr.ip(), addr.port())
}

/// Accepts one connection, reads the full request head, answers with the
/// given canned response, and hands the captured request back.
fn respond_once(listener: TcpListener, response: String) -> JoinHandle<String> {
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();
        String::from_utf8_lossy(&request).into_owned()
    })
}

fn ok_response(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

#[tokio::test]
async fn probe_accepts_a_server_that_echoes_the_challenge() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = respond_once(listener, ok_response(r#"{"challenge": 777}"#));

    let verified = verifier(777, Duration::from_secs(2))
        .verify(&endpoint_of(addr))
        .await;
    assert!(verified);

    // The probe must hit /connect with the directory's identity and the
    // challenge in the query string.
    let request = server.await.unwrap();
    assert!(request.starts_with("POST /connect?"), "got: {}", request);
    assert!(request.contains("master=master.test"));
    assert!(request.contains("version=1.2.3"));
    assert!(request.contains("challenge=777"));
}

#[tokio::test]
async fn probe_rejects_a_non_200_response() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = r#"{"challenge": 777}"#;
    // Right challenge, wrong status: still a failure.
    let response = format!(
        "HTTP/1.1 500 Internal Server Error\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let server = respond_once(listener, response);

    let verified = verifier(777, Duration::from_secs(2))
        .verify(&endpoint_of(addr))
        .await;
    assert!(!verified);
    server.await.unwrap();
}

#[tokio::test]
async fn probe_rejects_a_wrong_challenge_echo() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = respond_once(listener, ok_response(r#"{"challenge": 778}"#));

    let verified = verifier(777, Duration::from_secs(2))
        .verify(&endpoint_of(addr))
        .await;
    assert!(!verified);
    server.await.unwrap();
}

#[tokio::test]
async fn probe_rejects_an_unreachable_endpoint() {
    // Bind to learn a free port, then free it so the connect is refused.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let verified = verifier(777, Duration::from_secs(2))
        .verify(&endpoint_of(addr))
        .await;
    assert!(!verified);
}

#[tokio::test]
async fn probe_times_out_on_a_silent_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept and read, then never answer.
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut chunk = [0u8; 1024];
        let _ = stream.read(&mut chunk).await;
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let verified = verifier(777, Duration::from_millis(200))
        .verify(&endpoint_of(addr))
        .await;
    assert!(!verified);
    server.abort();
}
