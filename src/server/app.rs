use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use essentials::{debug, error};
use tokio::sync::{mpsc, oneshot};

use crate::auth::Authenticator;
use crate::http::server::Server as HttpServer;
use crate::service::ExchangeRateService;

use super::handler::{ExchangeRatesHandler, SharedAuthenticator};
use super::health_check::HealthCheck;

/// A builder for a server.
pub struct ServerBuilder {
    service: ExchangeRateService,
    authenticator: SharedAuthenticator,
    host: IpAddr,
    app_port: u16,
    health_check_port: u16,
    read_timeout: Duration,
}

impl ServerBuilder {
    pub fn new(service: ExchangeRateService, authenticator: SharedAuthenticator) -> Self {
        Self {
            service,
            authenticator,
            host: IpAddr::from([127, 0, 0, 1]), // Default host (localhost)
            app_port: 80,
            health_check_port: 9000,
            read_timeout: Duration::from_secs(10),
        }
    }

    /// Set the host for the application service.
    /// The default host is 127.0.0.1
    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    /// Set the port for the application service.
    /// The default port is 80
    pub fn with_app_port(mut self, port: u16) -> Self {
        self.app_port = port;
        self
    }

    /// Set the port for the health check service.
    /// The default port is 9000
    pub fn with_health_check_port(mut self, port: u16) -> Self {
        self.health_check_port = port;
        self
    }

    /// Set how long a client may take to send its request head.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn build(self) -> Server {
        let handler = ExchangeRatesHandler::shared(self.service, self.authenticator)
            .with_read_timeout(self.read_timeout);
        Server {
            app: HttpServer::new("app", SocketAddr::new(self.host, self.app_port), handler),
            health_check: HttpServer::new(
                "health_check",
                SocketAddr::new(self.host, self.health_check_port),
                HealthCheck,
            ),
        }
    }
}

pub struct Server {
    pub app: HttpServer<ExchangeRatesHandler>,
    pub health_check: HttpServer<HealthCheck>,
}

impl Server {
    /// Start the server. Returns once either listener stops.
    pub async fn run(self) {
        debug!("Starting server");
        let (tx_app, rx_app) = oneshot::channel();
        let (tx_health, rx_health) = oneshot::channel();
        let (tx, mut rx) = mpsc::channel(2);
        let tx_2 = tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = self.app.run() => {
                    debug!("App stopped");
                    let _ = tx_health.send(());
                    if let Err(err) = result {
                        error!("App error: {:?}", err);
                    }
                }
                _ = rx_app => {}
            }
            let _ = tx.send(()).await;
        });
        tokio::spawn(async move {
            tokio::select! {
                result = self.health_check.run() => {
                    debug!("health_check stopped");
                    let _ = tx_app.send(());
                    if let Err(err) = result {
                        error!("health_check error: {:?}", err);
                    }
                }
                _ = rx_health => {}
            }
            let _ = tx_2.send(()).await;
        });
        rx.recv().await;
        debug!("Server stopped");
    }
}

/// Create a new server builder serving exchange rates to callers resolved by `authenticator`.
pub fn builder(
    service: ExchangeRateService,
    authenticator: impl Authenticator + Send + Sync + 'static,
) -> ServerBuilder {
    ServerBuilder::new(service, Arc::new(authenticator))
}
