//! Synth Binary - Writes the website stack template
//!
//! Wires up:
//! - Configuration from the environment (and `.env`)
//! - Local adapters (build contexts and template output on the filesystem)
//! - The synthesis service

use cdn_website::adapters::local::{FsArtifactStore, FsTemplateSink};
use cdn_website::application::synth::SynthService;
use cdn_website::config::StackConfig;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    // 1. Configuration
    let config = match StackConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("invalid configuration: {}", e);
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    info!(stack = %config.stack_name, sites = config.sites.len(), "synthesizing");

    // 2. Adapters
    let artifacts = FsArtifactStore::new();
    let sink = FsTemplateSink::new(&config.out_dir);

    // 3. Application Service
    let service = SynthService::new(artifacts, sink);

    match service.synthesize(&config).await {
        Ok(report) => {
            info!(
                "wrote {} ({} resources, {} outputs)",
                report.template_path.display(),
                report.resources,
                report.outputs
            );
        }
        Err(e) => {
            error!("synthesis failed: {}", e);
            eprintln!("Synthesis failed: {}", e);
            std::process::exit(1);
        }
    }
}
