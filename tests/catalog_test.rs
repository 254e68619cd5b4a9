//! Tests for the Komga catalog client against a local HTTP responder.

use shuuroku::catalog::{Catalog, KomgaCatalog};
use shuuroku::error::{Error, Result};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves canned responses keyed by path prefix and records every request head.
async fn serve(routes: Vec<(&'static str, u16, &'static str)>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut buffer = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buffer.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => buffer.extend_from_slice(&chunk[..n]),
                }
            }
            let head = String::from_utf8_lossy(&buffer).to_string();
            let target = head.split_whitespace().nth(1).unwrap_or("").to_string();
            log.lock().unwrap().push(head);

            let (status, body) = routes
                .iter()
                .find(|(prefix, _, _)| target.starts_with(prefix))
                .map(|(_, status, body)| (*status, *body))
                .unwrap_or((404, "{}"));
            let response = format!(
                "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{}", address), seen)
}

#[tokio::test]
async fn test_search_series_escapes_and_authenticates() -> Result<()> {
    let (base_url, seen) = serve(vec![(
        "/api/v1/series?",
        200,
        r#"{"content":[{"id":"0A1","name":"Foo (Bar)","booksCount":3}],"totalElements":1}"#,
    )])
    .await;

    let catalog = KomgaCatalog::with_base_url(base_url, "reader", "'secret'")?;
    let candidates = catalog.search_series("Foo (Bar)").await?;
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, "0A1");

    let requests = seen.lock().unwrap();
    let head = &requests[0];
    assert!(head.starts_with("GET /api/v1/series?search_regex="));
    // Regex metacharacters are escaped before the query is URL encoded.
    assert!(head.contains("Foo+%5C%28Bar%5C%29%2CTITLE"));
    // reader:secret, with the shell quotes stripped
    assert!(head.contains("Basic cmVhZGVyOnNlY3JldA=="));
    Ok(())
}

#[tokio::test]
async fn test_series_volumes_reads_declared_numbers() -> Result<()> {
    let (base_url, seen) = serve(vec![(
        "/api/v1/series/0A1/books",
        200,
        r#"{"content":[
            {"id":"b1","metadata":{"number":"1","title":"Vol. 1"}},
            {"id":"b2","metadata":{"number":"2-3","title":"Vol. 2-3"}}
        ]}"#,
    )])
    .await;

    let catalog = KomgaCatalog::with_base_url(base_url, "reader", "secret")?;
    let volumes = catalog.series_volumes("0A1", 1000).await?;
    assert_eq!(volumes.len(), 2);
    assert_eq!(volumes[1].number, "2-3");
    assert_eq!(volumes[1].title, "Vol. 2-3");

    let requests = seen.lock().unwrap();
    assert!(requests[0].starts_with("GET /api/v1/series/0A1/books?size=400 "));
    Ok(())
}

#[tokio::test]
async fn test_non_success_status_is_remote_unavailable() -> Result<()> {
    let (base_url, _) = serve(vec![("/api/v1/series", 401, "{}")]).await;

    let catalog = KomgaCatalog::with_base_url(base_url, "reader", "wrong")?;
    match catalog.search_series("Foo").await {
        Err(e @ Error::RemoteUnavailable { status: 401, .. }) => assert!(e.is_fatal()),
        other => panic!("expected RemoteUnavailable, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_malformed_payload_is_fatal() -> Result<()> {
    let (base_url, _) = serve(vec![("/api/v1/series", 200, "not json")]).await;

    let catalog = KomgaCatalog::with_base_url(base_url, "reader", "secret")?;
    match catalog.search_series("Foo").await {
        Err(e @ Error::Json(_)) => assert!(e.is_fatal()),
        other => panic!("expected Json error, got {:?}", other),
    }
    Ok(())
}
