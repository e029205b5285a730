use blogd::{config::SiteConfig, proto, router, services, startup};

use anyhow::{Context, Result};
use blog_db::DbConfig;
use dotenv::dotenv;
use std::net::SocketAddr;
use tokio::{io::AsyncWriteExt, net::TcpListener};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = SiteConfig::from_env();
    let db_cfg = DbConfig::from_env();
    info!(
        target: "blogd",
        addr = %cfg.addr,
        engine = %cfg.search_engine,
        database = if db_cfg.is_configured() { "<set>" } else { "<none>" },
        "configuration loaded"
    );

    let addr = cfg.addr.clone();
    let site = startup::build_site(cfg, db_cfg).await?;
    let site = services::init(site)?;

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(target: "blogd", "listening on http://{addr}");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(target: "blogd", "accept failed: {e}");
                continue;
            }
        };
        tokio::spawn(async move {
            if let Err(err) = handle_conn(stream, site, peer).await {
                error!(target: "blogd", %peer, "connection error: {err:#}");
            }
        });
    }
}

async fn handle_conn(
    mut stream: tokio::net::TcpStream,
    site: &'static blogd::site::Site,
    peer: SocketAddr,
) -> Result<()> {
    // one request per connection
    let req = match proto::http::read_request(&mut stream).await {
        Ok(r) => r,
        Err(code) => {
            warn!(target: "blogd", %peer, status = code.as_u16(), "rejected request");
            stream.write_all(&proto::http::make_empty_response(code)).await?;
            return Ok(());
        }
    };
    let method = req.method.clone();
    let path = req.path.clone();
    let response = router::handle_with_peer(site, req, Some(peer))?;
    info!(target: "blogd::access", %peer, %method, %path, status = response.code.as_u16());
    stream.write_all(&response.into_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}
