pub mod api;

pub use api::{ router, RelayConfig, RelayState, CHAT_ROUTE };

use crate::cli::ServeArgs;
use std::error::Error;
use std::net::SocketAddr;
use std::time::Duration;
use log::{ info, warn, error };

pub struct Server {
    addr: String,
    state: RelayState,
    args: ServeArgs,
}

impl Server {
    pub fn new(args: ServeArgs) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let state = RelayState::new(RelayConfig {
            upstream_url: args.upstream_url.clone(),
            api_key: args.upstream_api_key.clone(),
            timeout: Duration::from_secs(args.upstream_timeout_secs),
            rate_limit_per_second: args.rate_limit_per_second,
        })?;

        if state.has_api_key() {
            info!("Relay configured with an upstream API key.");
        } else {
            warn!("Relay configured WITHOUT an upstream API key. Chat requests will fail.");
        }

        Ok(Self { addr: args.server_addr.clone(), state, args })
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;
        let app = router(self.state.clone());

        if self.args.enable_tls {
            let (cert_path, key_path) = match (&self.args.tls_cert_path, &self.args.tls_key_path) {
                (Some(cert), Some(key)) => (cert, key),
                (Some(_), None) | (None, Some(_)) => {
                    error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                    return Err("Missing TLS certificate or key path".into());
                }
                (None, None) => {
                    error!("--enable-tls was set but no certificate/key paths provided.");
                    return Err("TLS enabled without cert/key".into());
                }
            };
            info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);
            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                cert_path,
                key_path
            ).await?;

            info!("Relay listening on: https://{}{}", addr, CHAT_ROUTE);
            axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
        } else {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!("Relay listening on: http://{}{}", addr, CHAT_ROUTE);
            axum::serve(listener, app.into_make_service()).await?;
        }

        Ok(())
    }
}
