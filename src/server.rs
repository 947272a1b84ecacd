//! HTTP server and graceful shutdown.
//!
//! # Shutdown
//!
//! On SIGTERM (what Kubernetes sends before `terminationGracePeriodSeconds`
//! runs out) or Ctrl-C the server:
//! 1. stops calling `listener.accept()`, so no new connections are taken;
//! 2. lets every in-flight connection task run to completion;
//! 3. returns from [`Server::serve`], so `main` can exit cleanly.
//!
//! Keep the grace period longer than the slowest request.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::router::Router;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust
    /// use sieve::Server;
    ///
    /// assert!(Server::bind("0.0.0.0:3000").is_ok());
    /// assert!(Server::bind("not an address").is_err());
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        Ok(Self { addr: addr.parse()? })
    }

    /// Accepts connections and dispatches them through `router` until a
    /// shutdown signal arrives and the in-flight ones have drained.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        // Shared by every connection task; the routing table and compiled
        // schemas are never copied.
        let router = Arc::new(router);

        info!(addr = %self.addr, "sieve listening");

        // Tracks every connection task so shutdown can wait for them.
        let mut tasks = JoinSet::new();

        // Polled once per loop iteration, so it has to stay put in memory.
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check arms top to bottom: a pending shutdown wins over
                // connections still queued on the listener.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, peer) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    // tokio's AsyncRead/AsyncWrite adapted to hyper's IO traits
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on this connection, not once
                        // per connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { dispatch(&router, req).await }
                        });

                        // HTTP/1.1 or HTTP/2, whichever the client speaks.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(%peer, "connection error: {e}");
                        }
                    });
                }

                // reap finished tasks
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Drain before returning.
        while tasks.join_next().await.is_some() {}

        info!("sieve stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Buffers the body and hands the request to the router.
///
/// The error type is [`Infallible`]: a body that cannot be read or parsed
/// goes to the router's error stage like any other failure, so hyper never
/// sees an error.
async fn dispatch(
    router: &Router,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    // The validator needs the whole payload, so the body is collected up
    // front. Size limits belong to the reverse proxy.
    let response = match body.collect().await {
        Ok(collected) => router.dispatch(parts, collected.to_bytes()).await,
        Err(e) => {
            warn!("failed to read request body: {e}");
            router.reject(Error::Malformed(e.to_string()))
        }
    };

    Ok(response.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on SIGTERM or Ctrl-C. Only Ctrl-C exists off Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => { s.recv().await; }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    // Off Unix the SIGTERM arm never resolves.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
