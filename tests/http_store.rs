use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use treesync::config::RemoteSection;
use treesync::errors::TreesyncError;
use treesync::sync::{HttpRemoteStore, RemoteStore};

/// What the test server saw for one request.
#[derive(Debug)]
struct Received {
    request_line: String,
    headers: Vec<String>,
    body: Vec<u8>,
}

/// Serve every connection with `status`, reporting each request.
async fn serve(status: &'static str) -> (String, mpsc::UnboundedReceiver<Received>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                let head_end = loop {
                    let n = stream.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        return;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                        break pos;
                    }
                };

                let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
                let mut lines = head.split("\r\n").map(str::to_string);
                let request_line = lines.next().unwrap_or_default();
                let headers: Vec<String> = lines.collect();
                let len = headers
                    .iter()
                    .find_map(|h| {
                        let (k, v) = h.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length")
                            .then(|| v.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);

                let mut body = buf[head_end + 4..].to_vec();
                while body.len() < len {
                    let n = stream.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    body.extend_from_slice(&chunk[..n]);
                }

                let _ = tx.send(Received {
                    request_line,
                    headers,
                    body,
                });
                let response =
                    format!("HTTP/1.1 {status}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    (format!("http://{addr}/"), rx)
}

fn remote(endpoint: &str) -> RemoteSection {
    RemoteSection {
        endpoint: endpoint.to_string(),
        timeout_secs: 5,
        username: None,
        password: None,
    }
}

#[tokio::test]
async fn put_sends_body_to_url() {
    let (endpoint, mut seen) = serve("201 Created").await;
    let store = HttpRemoteStore::new(&remote(&endpoint)).unwrap();

    store
        .put(format!("{endpoint}sub/a.txt"), b"alpha".to_vec())
        .await
        .unwrap();

    let req = seen.recv().await.unwrap();
    assert_eq!(req.request_line, "PUT /sub/a.txt HTTP/1.1");
    assert_eq!(req.body, b"alpha");
}

#[tokio::test]
async fn delete_hits_url() {
    let (endpoint, mut seen) = serve("204 No Content").await;
    let store = HttpRemoteStore::new(&remote(&endpoint)).unwrap();

    store.delete(format!("{endpoint}old.txt")).await.unwrap();

    let req = seen.recv().await.unwrap();
    assert_eq!(req.request_line, "DELETE /old.txt HTTP/1.1");
}

#[tokio::test]
async fn credentials_are_sent_as_basic_auth() {
    let (endpoint, mut seen) = serve("200 OK").await;
    let mut section = remote(&endpoint);
    section.username = Some("admin".to_string());
    section.password = Some("admin".to_string());
    let store = HttpRemoteStore::new(&section).unwrap();

    store.put(format!("{endpoint}a.txt"), Vec::new()).await.unwrap();

    let req = seen.recv().await.unwrap();
    // base64("admin:admin")
    assert!(
        req.headers
            .iter()
            .any(|h| h.eq_ignore_ascii_case("authorization: Basic YWRtaW46YWRtaW4=")),
        "headers: {:?}",
        req.headers
    );
}

#[tokio::test]
async fn error_status_is_a_failure() {
    let (endpoint, _seen) = serve("500 Internal Server Error").await;
    let store = HttpRemoteStore::new(&remote(&endpoint)).unwrap();

    let err = store
        .put(format!("{endpoint}a.txt"), b"alpha".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, TreesyncError::Http(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_server_is_a_failure() {
    // Bind then drop, so nothing listens on the port.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = HttpRemoteStore::new(&remote("http://127.0.0.1/")).unwrap();
    let res = tokio::time::timeout(
        Duration::from_secs(10),
        store.delete(format!("http://{addr}/a.txt")),
    )
    .await
    .expect("request should fail within its timeout");

    assert!(matches!(res, Err(TreesyncError::Http(_))));
}
