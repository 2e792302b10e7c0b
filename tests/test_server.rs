use std::sync::Arc;
use std::time::Duration;

use httpfromtcp::http::request::Request;
use httpfromtcp::http::response::StatusCode;
use httpfromtcp::server::{BodyWriter, Handler, HandlerError, Server};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio::time::timeout;

struct Routes;

impl Handler for Routes {
    async fn call(&self, body: &mut BodyWriter, req: &Request) -> Result<(), HandlerError> {
        match req.target() {
            "/yourproblem" => Err(HandlerError::bad_request("Your problem is not my problem\n")),
            "/myproblem" => Err(HandlerError::new(
                StatusCode::InternalServerError,
                "Woopsie, my bad\n",
            )),
            "/chunked" => {
                body.write("streamed");
                body.set_trailer("X-Content-Length", "8");
                Ok(())
            }
            _ => {
                body.write("All good, frfr\n");
                Ok(())
            }
        }
    }
}

/// Blocks inside the handler until released, to observe in-flight requests.
struct Gate {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

impl Handler for Gate {
    async fn call(&self, body: &mut BodyWriter, _req: &Request) -> Result<(), HandlerError> {
        self.started.notify_one();
        self.release.notified().await;
        body.write("finished");
        Ok(())
    }
}

async fn send(server: &Server, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut raw = Vec::new();
    timeout(Duration::from_secs(5), stream.read_to_end(&mut raw))
        .await
        .expect("response within timeout")
        .unwrap();
    String::from_utf8(raw).unwrap()
}

#[tokio::test]
async fn test_serves_ok_response() {
    let server = Server::serve("127.0.0.1:0", Routes).await.unwrap();

    let resp = send(&server, b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;

    assert!(resp.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(resp.contains("content-length: 15\r\n"));
    assert!(resp.ends_with("\r\n\r\nAll good, frfr\n"));

    server.close();
    server.wait().await.unwrap();
}

#[tokio::test]
async fn test_your_problem_returns_400() {
    let server = Server::serve("127.0.0.1:0", Routes).await.unwrap();
    let message = "Your problem is not my problem\n";

    let resp = send(&server, b"GET /yourproblem HTTP/1.1\r\nHost: x\r\n\r\n").await;

    let status_line = resp.lines().next().unwrap();
    assert!(status_line.contains("400"));
    assert!(resp.contains(&format!("content-length: {}\r\n", message.len())));
    assert!(resp.ends_with(&format!("\r\n\r\n{}", message)));

    server.close();
}

#[tokio::test]
async fn test_my_problem_returns_500() {
    let server = Server::serve("127.0.0.1:0", Routes).await.unwrap();

    let resp = send(&server, b"GET /myproblem HTTP/1.1\r\n\r\n").await;

    assert!(resp.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    assert!(resp.ends_with("Woopsie, my bad\n"));

    server.close();
}

#[tokio::test]
async fn test_bad_request_line_returns_400() {
    let server = Server::serve("127.0.0.1:0", Routes).await.unwrap();

    let resp = send(&server, b"GET / HTTP/1.0\r\n").await;

    assert!(resp.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(resp.contains("unrecognized HTTP-version"));

    server.close();
}

#[tokio::test]
async fn test_chunked_route_sends_trailer() {
    let server = Server::serve("127.0.0.1:0", Routes).await.unwrap();

    let resp = send(&server, b"GET /chunked HTTP/1.1\r\n\r\n").await;

    assert!(resp.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(resp.contains("transfer-encoding: chunked\r\n"));
    assert!(resp.contains("trailer: x-content-length\r\n"));
    assert!(!resp.contains("\r\ncontent-length:"));
    assert!(resp.ends_with("\r\n\r\n8\r\nstreamed\r\n0\r\nx-content-length: 8\r\n\r\n"));

    server.close();
}

#[tokio::test]
async fn test_premature_close_does_not_hang() {
    let server = Server::serve("127.0.0.1:0", Routes).await.unwrap();

    let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
    stream.write_all(b"GET / HTTP/1.1\r\n").await.unwrap();
    stream.shutdown().await.unwrap();

    let mut raw = Vec::new();
    timeout(Duration::from_secs(5), stream.read_to_end(&mut raw))
        .await
        .expect("server answered instead of hanging")
        .unwrap();
    let resp = String::from_utf8(raw).unwrap();

    assert!(resp.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(resp.contains("incomplete request"));

    server.close();
}

#[tokio::test]
async fn test_handles_connections_concurrently() {
    let server = Arc::new(Server::serve("127.0.0.1:0", Routes).await.unwrap());

    let mut clients = Vec::new();
    for i in 0..16 {
        let server = Arc::clone(&server);
        clients.push(tokio::spawn(async move {
            let request = format!("GET /client/{} HTTP/1.1\r\nHost: x\r\n\r\n", i);
            send(&server, request.as_bytes()).await
        }));
    }

    for client in clients {
        let resp = client.await.unwrap();
        assert!(resp.starts_with("HTTP/1.1 200 OK\r\n"));
    }

    server.close();
}

#[tokio::test]
async fn test_bind_failure_is_reported() {
    let first = Server::serve("127.0.0.1:0", Routes).await.unwrap();

    let second = Server::serve(first.local_addr(), Routes).await;

    assert!(second.is_err());
    first.close();
}

#[tokio::test]
async fn test_close_stops_accepting() {
    let server = Server::serve("127.0.0.1:0", Routes).await.unwrap();
    let addr = server.local_addr();

    server.close();
    server.close();
    assert!(server.is_closed());
    timeout(Duration::from_secs(5), server.wait())
        .await
        .expect("accept loop exits after close")
        .unwrap();

    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_in_flight_request_completes_after_close() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let gate = Gate {
        started: Arc::clone(&started),
        release: Arc::clone(&release),
    };
    let server = Server::serve("127.0.0.1:0", gate).await.unwrap();

    let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
    stream.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
    started.notified().await;

    server.close();
    server.wait().await.unwrap();
    release.notify_one();

    let mut raw = Vec::new();
    timeout(Duration::from_secs(5), stream.read_to_end(&mut raw))
        .await
        .unwrap()
        .unwrap();
    let resp = String::from_utf8(raw).unwrap();

    assert!(resp.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(resp.ends_with("finished"));
}
