//! Shared fixtures for the integration tests
//!
//! [`TestServer`] is a small in-process HTTP server that answers every path
//! with a scripted body and counts the requests it served.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use tokio::net::TcpListener;
use url::Url;

/// What the server answers with
#[derive(Debug, Clone)]
struct Script {
    status: StatusCode,
    body: Vec<u8>,
    delay: Duration,
}

/// In-memory HTTP fixture server
#[derive(Clone)]
pub struct TestServer {
    script: Arc<Mutex<Script>>,
    hits: Arc<AtomicUsize>,
    base: Url,
}

impl TestServer {
    /// Start a server answering `200 OK` with `body`
    ///
    /// Must be called from within a Tokio runtime; the server task lives on
    /// that runtime.
    pub async fn start(body: &str) -> Self {
        let script = Arc::new(Mutex::new(Script {
            status: StatusCode::OK,
            body: body.as_bytes().to_vec(),
            delay: Duration::ZERO,
        }));
        let hits = Arc::new(AtomicUsize::new(0));

        let app = Router::new().fallback({
            let script = Arc::clone(&script);
            let hits = Arc::clone(&hits);
            move || {
                let script = Arc::clone(&script);
                let hits = Arc::clone(&hits);
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    let current = script.lock().unwrap().clone();
                    if current.delay != Duration::ZERO {
                        tokio::time::sleep(current.delay).await;
                    }
                    (current.status, current.body)
                }
            }
        });

        let listener = std::net::TcpListener::bind("127.0.0.1:0")
            .expect("failed to bind local fixture server");
        listener
            .set_nonblocking(true)
            .expect("failed to set nonblocking on fixture listener");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let listener = TcpListener::from_std(listener)
                .expect("failed to convert fixture listener to tokio listener");
            axum::serve(listener, app).await.unwrap();
        });

        let base = Url::parse(&format!("http://{}/", addr)).unwrap();
        Self { script, hits, base }
    }

    /// URL of `path` on this server
    pub fn url(&self, path: &str) -> Url {
        self.base.join(path.trim_start_matches('/')).unwrap()
    }

    /// Number of requests served so far
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Replace the response body
    pub fn set_body(&self, body: &str) {
        self.script.lock().unwrap().body = body.as_bytes().to_vec();
    }

    /// Replace the response status
    pub fn set_status(&self, status: StatusCode) {
        self.script.lock().unwrap().status = status;
    }

    /// Delay every response
    pub fn set_delay(&self, delay: Duration) {
        self.script.lock().unwrap().delay = delay;
    }
}

/// Start a listener that accepts connections and closes them immediately
///
/// Returns the URL to request and the number of connections accepted.
pub async fn start_dropping_server() -> (Url, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            drop(socket);
        }
    });

    let url = Url::parse(&format!("http://{}/download", addr)).unwrap();
    (url, accepted)
}
