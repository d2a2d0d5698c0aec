use clap::{Parser, Subcommand};
use env_logger::Env;
use kube::client::Client;
use log::{error, info};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

mod controllers;
mod models;
mod utils;
mod workflows;

use controllers::client::KubeClusterClient;
use controllers::observer::LogObserver;
use controllers::preload::PreloadController;
use models::job::JobConfig;
use utils::error::Error;
use utils::render::MissingKeyPolicy;
use workflows::extract::extract_images_with;

/// Pulls the images of load-generation jobs onto every node before the jobs run
#[derive(Parser, Debug)]
#[command(name = "image-preloader", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pre-load images for every job with `preLoadImages: true`
    Run {
        /// Path to the job configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Print the images each job references without touching the cluster
    Images {
        /// Path to the job configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Fail on template variables that have no value instead of rendering them empty
        #[arg(long)]
        strict: bool,
    },

    /// Delete every staging namespace left on the cluster
    Cleanup,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(err) = run(cli.command).await {
        error!("{}", err);
        process::exit(1);
    }
}

async fn run(command: Commands) -> Result<(), Error> {
    match command {
        Commands::Images { config, strict } => {
            let missing_key = if strict {
                MissingKeyPolicy::Error
            } else {
                MissingKeyPolicy::Zero
            };

            for job in JobConfig::load(&config)? {
                let images = extract_images_with(&job, missing_key)?;
                println!("{}: {}", job.name, images.join(" "));
            }
            Ok(())
        }
        Commands::Run { config } => {
            let jobs = JobConfig::load(&config)?;
            let controller = preload_controller().await?;

            let mut failed = 0;
            for job in jobs.iter().filter(|job| job.pre_load_images) {
                match controller.preload_images(job).await {
                    Ok(()) => {}
                    // Continuing without a staging namespace is unsafe, stop everything.
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => {
                        error!("job {}: {}", job.name, err);
                        failed += 1;
                    }
                }
            }

            if failed > 0 {
                return Err(Error::JobsFailed(failed));
            }
            info!("Pre-load finished");
            Ok(())
        }
        Commands::Cleanup => preload_controller().await?.cleanup().await,
    }
}

async fn preload_controller() -> Result<PreloadController, Error> {
    // The client is configured from KUBECONFIG or the in-cluster service account.
    let kubernetes_client = Client::try_default().await?;

    Ok(PreloadController::new(
        Arc::new(KubeClusterClient::new(kubernetes_client)),
        Arc::new(LogObserver),
    ))
}
