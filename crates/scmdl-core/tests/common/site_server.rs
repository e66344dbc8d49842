//! Minimal HTTP/1.1 server imitating the soundtrack site for integration tests.
//!
//! Serves fixed routes (path -> status, content type, body), answers one
//! request per connection and records the path and `Referer` of every GET.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const GAME_ID: u32 = 5609;

#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Route {
    pub fn html(body: &str) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=UTF-8",
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn binary(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: "application/octet-stream",
            body,
        }
    }

    pub fn json(body: &str) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub path: String,
    pub referer: Option<String>,
}

pub struct SiteServer {
    pub base_url: String,
    hits: Arc<Mutex<Vec<Hit>>>,
}

impl SiteServer {
    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().unwrap().clone()
    }

    pub fn hits_for(&self, path: &str) -> usize {
        self.hits().iter().filter(|h| h.path == path).count()
    }
}

/// Fake BRSTM payload, large enough to pass the error-page check.
pub fn brstm_body(seed: u8) -> Vec<u8> {
    let mut body = b"RSTM\xfe\xff\x01\x00".to_vec();
    body.extend((0u8..=255).cycle().skip(seed as usize).take(4096));
    body
}

/// Game listing page with an official section and a remix section.
pub fn game_page(official: &[(u32, &str)], remixes: &[(u32, &str)]) -> String {
    let row = |(id, name): &(u32, &str)| {
        format!(
            "<tr id=\"s{id}\">\n  <td class=\"name\"><a href=\"/song/{id}\">{name}</a></td>\n</tr>\n"
        )
    };
    let mut html = String::from("<html><body><h2>Soundtrack</h2><table>\n");
    html.extend(official.iter().map(row));
    html.push_str("</table><h2>Remixes / Fanmade</h2><table>\n");
    html.extend(remixes.iter().map(row));
    html.push_str("</table></body></html>\n");
    html
}

/// Start the server on an ephemeral port. Runs until the process exits.
pub fn start(routes: HashMap<String, Route>) -> SiteServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes = Arc::new(routes);
    let hits = Arc::new(Mutex::new(Vec::new()));
    let server_hits = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let hits = Arc::clone(&server_hits);
            thread::spawn(move || handle(stream, &routes, &hits));
        }
    });
    SiteServer {
        base_url: format!("http://127.0.0.1:{}", port),
        hits,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    routes: &HashMap<String, Route>,
    hits: &Mutex<Vec<Hit>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let mut lines = request.lines();
    let mut first = lines.next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("");
    let path = first.next().unwrap_or("/").to_string();
    let referer = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("referer"))
        .map(|(_, v)| v.trim().to_string());

    if method.eq_ignore_ascii_case("GET") {
        hits.lock().unwrap().push(Hit {
            path: path.clone(),
            referer,
        });
    }

    let route = routes.get(&path).cloned().unwrap_or_else(|| Route::status(404));
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        route.status,
        reason(route.status),
        route.content_type,
        route.body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    if !method.eq_ignore_ascii_case("HEAD") {
        let _ = stream.write_all(&route.body);
    }
    let _ = stream.flush();
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
