use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span};

use crate::http::connection::Connection;
use crate::http::handler::Handler;

/// A running HTTP server.
///
/// The listening socket is owned by a background accept loop that spawns one
/// task per connection. [`Server::close`] stops accepting; connections that
/// are already being handled run to completion.
pub struct Server {
    local_addr: SocketAddr,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    accept_loop: JoinHandle<()>,
}

impl Server {
    /// Binds `addr` and starts accepting connections in the background.
    ///
    /// Fails immediately if the address cannot be bound.
    pub async fn serve<A, H>(addr: A, handler: H) -> anyhow::Result<Server>
    where
        A: ToSocketAddrs,
        H: Handler,
    {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Listening on {}", local_addr);

        let closed = Arc::new(AtomicBool::new(false));
        let shutdown = Arc::new(Notify::new());

        let accept_loop = tokio::spawn(accept_loop(
            listener,
            Arc::new(handler),
            Arc::clone(&closed),
            Arc::clone(&shutdown),
        ));

        Ok(Server {
            local_addr,
            closed,
            shutdown,
            accept_loop,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stops accepting new connections and closes the listening socket.
    /// Calling it again has no effect.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Closing server on {}", self.local_addr);
        self.shutdown.notify_one();
    }

    /// Waits for the accept loop to exit, which happens only after
    /// [`Server::close`].
    pub async fn wait(self) -> anyhow::Result<()> {
        self.accept_loop.await?;
        Ok(())
    }
}

async fn accept_loop<H: Handler>(
    listener: TcpListener,
    handler: Arc<H>,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
) {
    loop {
        let accepted = tokio::select! {
            biased;
            _ = shutdown.notified() => break,
            res = listener.accept() => res,
        };

        match accepted {
            Ok((socket, peer)) => {
                debug!("Accepted connection from {}", peer);

                let handler = Arc::clone(&handler);
                tokio::spawn(
                    async move {
                        let mut conn = Connection::new(socket, handler);
                        if let Err(e) = conn.run().await {
                            error!(error = %e, "connection error");
                        }
                    }
                    .instrument(info_span!("connection", %peer)),
                );
            }
            Err(e) => {
                if closed.load(Ordering::SeqCst) {
                    break;
                }
                error!(error = %e, "error accepting connection");
            }
        }
    }

    drop(listener);
    debug!("accept loop stopped");
}
