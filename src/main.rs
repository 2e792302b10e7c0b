use std::path::PathBuf;

use httpfromtcp::config::Config;
use httpfromtcp::http::request::Request;
use httpfromtcp::http::response::StatusCode;
use httpfromtcp::server::{BodyWriter, Handler, HandlerError, Server};
use tracing::{error, info};

const SUCCESS_HTML: &str = r#"<html>
  <head>
    <title>200 OK</title>
  </head>
  <body>
    <h1>Success!</h1>
    <p>Your request was an absolute banger.</p>
  </body>
</html>
"#;

/// Lines streamed by `/chunked`, enough to span more than one chunk.
const CHUNKED_LINES: usize = 100;

/// Demo routes.
struct Routes {
    video_path: PathBuf,
}

impl Handler for Routes {
    async fn call(&self, body: &mut BodyWriter, req: &Request) -> Result<(), HandlerError> {
        match req.target() {
            "/yourproblem" => Err(HandlerError::bad_request(
                "Your problem is not my problem\n",
            )),
            "/myproblem" => Err(HandlerError::new(
                StatusCode::InternalServerError,
                "Woopsie, my bad\n",
            )),
            "/video" if req.method() == "GET" => {
                let video = tokio::fs::read(&self.video_path).await.map_err(|e| {
                    error!(path = %self.video_path.display(), error = %e, "failed to read video");
                    HandlerError::new(StatusCode::InternalServerError, "video unavailable\n")
                })?;
                body.headers_mut().replace("Content-Type", "video/mp4");
                body.write(video);
                Ok(())
            }
            "/chunked" => {
                for i in 0..CHUNKED_LINES {
                    body.write(format!("chunked line {}\n", i));
                }
                let len = body.len().to_string();
                body.set_trailer("X-Content-Length", &len);
                Ok(())
            }
            _ => {
                body.headers_mut().replace("Content-Type", "text/html");
                body.write(SUCCESS_HTML);
                Ok(())
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let routes = Routes {
        video_path: PathBuf::from(&cfg.video_path),
    };

    let server = Server::serve(cfg.listen_addr.as_str(), routes).await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    server.close();
    server.wait().await?;
    info!("Server gracefully stopped");

    Ok(())
}
