use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use payment_gateway::bank::HttpBankClient;
use payment_gateway::config::AppConfig;
use payment_gateway::processor::PaymentProcessor;
use payment_gateway::repo::PaymentsRepository;
use payment_gateway::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = AppConfig::from_env()?;
    info!(bank_url = %config.bank_url, timeout_secs = config.bank_timeout.as_secs(), "configured provider endpoint");

    let repo = Arc::new(PaymentsRepository::new());
    let bank = Arc::new(HttpBankClient::new(config.bank_url.clone(), config.bank_timeout));
    let state = AppState { processor: PaymentProcessor::new(repo, bank) };

    let router = app::build_router(state);

    let addr = SocketAddr::new(config.host.parse()?, config.port);
    println!("starting payment-gateway on {addr}");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
