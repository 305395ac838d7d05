//! Scripted HTTP backend for integration tests, built on `tiny_http`.
//!
//! A [`MockServer`] is started with a fixed script of responses; it serves
//! exactly that many requests, recording each, then shuts down. Tests call
//! [`MockServer::finish`] to join the server thread and assert on what the
//! client actually sent.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tiny_http::{Header, Response, Server};

/// One request as the server saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_str(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// One canned response in the script.
#[derive(Debug, Clone)]
pub struct Scripted {
    pub status: u16,
    pub body: String,
}

impl Scripted {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

pub struct MockServer {
    base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Bind to an ephemeral port and serve the script in order.
    pub fn start(script: Vec<Scripted>) -> Self {
        let server = Server::http("127.0.0.1:0").expect("bind mock server");
        let addr = server
            .server_addr()
            .to_ip()
            .expect("mock server has an IP address");
        let requests: Arc<Mutex<Vec<Recorded>>> = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&requests);
        let handle = std::thread::spawn(move || {
            for scripted in script {
                let mut request = match server.recv() {
                    Ok(request) => request,
                    Err(_) => return,
                };

                let headers = request
                    .headers()
                    .iter()
                    .map(|h| (h.field.to_string(), h.value.to_string()))
                    .collect();
                let mut body = Vec::new();
                let _ = request.as_reader().read_to_end(&mut body);
                seen.lock().unwrap().push(Recorded {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    headers,
                    body,
                });

                let response = Response::from_string(scripted.body.clone())
                    .with_status_code(scripted.status)
                    .with_header(
                        Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                            .unwrap(),
                    );
                let _ = request.respond(response);
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
            handle,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Wait for the script to be fully consumed and return the recorded
    /// requests in arrival order.
    pub fn finish(self) -> Vec<Recorded> {
        self.handle.join().expect("mock server thread");
        let requests = self.requests.lock().unwrap();
        requests.clone()
    }
}
