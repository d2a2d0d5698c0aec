use log::{info, warn};
use std::time::Duration;

use crate::utils::error::Error;

/// Receives the notable events of a pre-load run.
pub trait PreloadObserver: Send + Sync {
    fn started(&self, job: &str);
    fn no_images(&self, job: &str);
    fn pulling(&self, images: &[String], namespace: &str);
    fn sleeping(&self, period: Duration);
    fn cleanup_failed(&self, error: &Error);
}

/// Reports pre-load events through the `log` facade.
pub struct LogObserver;

impl PreloadObserver for LogObserver {
    fn started(&self, job: &str) {
        info!("Pre-load: images from job {}", job);
    }

    fn no_images(&self, _job: &str) {
        info!("No images found to pre-load, continuing");
    }

    fn pulling(&self, images: &[String], namespace: &str) {
        info!(
            "Pre-load: Creating DaemonSet using images {:?} in namespace {}",
            images, namespace
        );
    }

    fn sleeping(&self, period: Duration) {
        info!("Pre-load: Sleeping for {:?}", period);
    }

    fn cleanup_failed(&self, error: &Error) {
        warn!("Pre-load: {}", error);
    }
}
