use frost_predictor::{config::Config, model, server, Classifier};
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::from_env()?;
    tracing::info!("config: {:?}", cfg);

    let mdl = match model::load_model(&cfg.model_path) {
        Ok(m) => {
            tracing::info!(
                "loaded model {}; trees={} n_features={}",
                cfg.model_path.display(),
                m.trees.len(),
                m.n_features
            );
            Ok(Arc::new(m) as Arc<dyn Classifier>)
        }
        Err(e) => {
            // Keep serving so the page can show why nothing predicts.
            tracing::error!("{} ({}); all prediction endpoints are blocked", e, e.code());
            Err(e)
        }
    };

    let state = server::AppState::new(mdl, cfg.log_predictions);
    let app = server::router(state, cfg.max_upload_bytes);

    let addr = SocketAddr::new(cfg.bind_addr, cfg.port);
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
