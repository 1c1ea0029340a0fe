use anyhow::{Context, Result};
use async_trait::async_trait;
use essentials::{debug, info, warn};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::{TcpListener, TcpStream};

/// Serves a single accepted connection; owns the stream until it returns.
#[async_trait]
pub trait Handler {
    async fn handle(&self, stream: TcpStream);
}

/// Accept loop handing every connection to `H` on its own task.
pub struct Server<H: Handler + Send + Sync + 'static> {
    name: &'static str,
    addr: SocketAddr,
    handler: Arc<H>,
}

impl<H: Handler + Send + Sync + 'static> Server<H> {
    pub fn new(name: &'static str, addr: SocketAddr, handler: H) -> Self {
        Self {
            name,
            addr,
            handler: Arc::new(handler),
        }
    }

    /// Runs until the listener cannot be bound; failed accepts are logged and skipped.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("Failed to bind {} to address: {}", self.name, self.addr))?;
        info!(server = self.name, "Listening on: {}", self.addr);
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    // EMFILE and friends: back off briefly.
                    warn!(server = self.name, "Failed to accept connection: {}", err);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    continue;
                }
            };
            debug!(server = self.name, "Accepted connection from: {}", peer);
            let handler = self.handler.clone();
            tokio::spawn(async move {
                handler.handle(stream).await;
            });
        }
    }
}
