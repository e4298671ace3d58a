use bpwatch_receiver::{router, ReceiverState};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "bpwatch-receiver")]
#[command(about = "Development endpoint for delivered patient records", long_about = None)]
struct Cli {
    /// Address to bind
    #[arg(short, long, default_value = "127.0.0.1")]
    address: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bpwatch_receiver=info,tower_http=info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let addr = format!("{}:{}", cli.address, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Receiver listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(ReceiverState::default()))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Receiver shutting down");
        })
        .await?;
    Ok(())
}
