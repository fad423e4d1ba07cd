use std::sync::Arc;

use tracing::info;

use tgf_core::{
    config::Config,
    ports::{ChatPlatform, Classifier},
    snapshot::SnapshotPlatform,
};
use tgf_gemini::{GeminiClassifier, GeminiSettings};

#[tokio::main]
async fn main() -> Result<(), tgf_core::Error> {
    tgf_core::logging::init("tgf")?;

    let cfg = Arc::new(Config::load()?);

    let classifier: Arc<dyn Classifier> =
        Arc::new(GeminiClassifier::new(GeminiSettings::from_config(&cfg))?);
    let platform: Arc<dyn ChatPlatform> = Arc::new(SnapshotPlatform::new(
        cfg.platform_snapshot_path.clone(),
        cfg.platform_folders_path.clone(),
    ));
    info!(
        snapshot = %cfg.platform_snapshot_path.display(),
        folders = %cfg.platform_folders_path.display(),
        "using file-backed platform"
    );

    tgf_telegram::router::run_polling(cfg, platform, classifier)
        .await
        .map_err(|e| tgf_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
