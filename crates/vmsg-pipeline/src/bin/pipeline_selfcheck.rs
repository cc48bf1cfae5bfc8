//! Environment self-check for the message pipeline.
//!
//! Verifies encoder availability, scratch directory access, and
//! storage configuration without touching any real media. Run it after
//! deployment or environment changes:
//!
//! ```bash
//! cargo run --bin pipeline-selfcheck
//! ```

use anyhow::Result;
use tracing::{info, warn};

use vmsg_media::{check_ffmpeg, check_ffprobe};
use vmsg_pipeline::{logging, PipelineConfig};
use vmsg_storage::StoreConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    info!("Pipeline self-check starting");
    let mut failures = 0u32;

    match check_ffmpeg() {
        Ok(path) => info!(path = %path.display(), "ffmpeg found"),
        Err(e) => {
            // Degraded but not fatal: exports pass the original through
            warn!(error = %e, "ffmpeg not found; exports will use original recordings");
        }
    }

    match check_ffprobe() {
        Ok(path) => info!(path = %path.display(), "ffprobe found"),
        Err(e) => warn!(error = %e, "ffprobe not found; duration will come from the player"),
    }

    let config = PipelineConfig::from_env();
    info!(
        scratch_dir = %config.scratch_dir.display(),
        max_recording_ms = config.max_recording_ms,
        encode_timeout_secs = config.encode_timeout_secs,
        "Configuration loaded"
    );

    match tokio::fs::create_dir_all(&config.scratch_dir).await {
        Ok(()) => info!("Scratch directory writable"),
        Err(e) => {
            tracing::error!(error = %e, "Cannot create scratch directory");
            failures += 1;
        }
    }

    match StoreConfig::from_env() {
        Ok(store) => info!(bucket = %store.bucket_name, "Storage configuration complete"),
        Err(e) => {
            tracing::error!(error = %e, "Storage configuration incomplete");
            failures += 1;
        }
    }

    if failures > 0 {
        anyhow::bail!("Self-check failed with {failures} error(s)");
    }
    info!("Self-check passed");
    Ok(())
}
