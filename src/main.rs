use doyen::CandidateBuilder;
use doyen::Result;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    // Initializing Logs
    init_observability();

    // Initializing Shutdown Signal
    let shutdown = CancellationToken::new();

    // Build the candidate
    let mut builder = CandidateBuilder::from_env()?;
    if let Some(path) = std::env::args().nth(1) {
        builder = builder.with_override_config(&path)?;
    }
    let (controller, _handle) = builder.shutdown_token(shutdown.clone()).build()?;

    info!("Application started. Waiting for CTRL+C signal...");
    // Listen on Shutdown Signal
    tokio::spawn(graceful_shutdown(shutdown));

    // Run the candidate until signal or connect exhaustion
    if let Err(e) = controller.run().await {
        error!("candidate stops: {:?}", e);
        return Err(e);
    }

    println!("Exiting program.");
    Ok(())
}

async fn graceful_shutdown(shutdown: CancellationToken) {
    let mut sigint = signal(SignalKind::interrupt()).unwrap();
    let mut sigterm = signal(SignalKind::terminate()).unwrap();
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }

    shutdown.cancel();
    info!("Shutdown completed");
}

fn init_observability() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
