use clap::{Parser, Subcommand};
use std::path::PathBuf;

use reqlens_core::Config;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Extract and classify requirements from documents")]
pub struct Cli {
    /// Path to a YAML configuration file
    #[clap(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Zero-shot inference endpoint (the model ID is appended)
    #[clap(long, global = true)]
    pub classifier_url: Option<String>,

    /// Zero-shot model to use
    #[clap(long, global = true)]
    pub model: Option<String>,

    /// Start without a classifier; classification requests will fail
    #[clap(long, global = true)]
    pub no_classifier: bool,

    /// Default log filter when RUST_LOG is not set
    #[clap(long, global = true)]
    pub log_level: Option<String>,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP service (default)
    Serve {
        /// Address to bind
        #[clap(long)]
        host: Option<String>,

        /// Port to listen on
        #[clap(long, short = 'p')]
        port: Option<u16>,

        /// Directory uploaded documents are stored in
        #[clap(long)]
        upload_dir: Option<PathBuf>,

        /// Number of worker threads
        #[clap(long)]
        workers: Option<usize>,
    },

    /// Analyze a PDF or TXT file and print the requirements as JSON
    Analyze {
        /// The document to analyze
        file: PathBuf,
    },

    /// Classify a single requirement and print its categories
    Classify {
        /// The requirement text
        text: String,
    },

    /// Print the resolved configuration as YAML
    Config,
}

impl Cli {
    /// Apply command-line overrides on top of file and environment settings
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.classifier_url {
            config.classifier.endpoint = url.clone();
        }
        if let Some(model) = &self.model {
            config.classifier.model = model.clone();
        }
        if self.no_classifier {
            config.classifier.enabled = false;
        }

        if let Some(Command::Serve {
            host,
            port,
            upload_dir,
            workers,
        }) = &self.command
        {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
            if let Some(dir) = upload_dir {
                config.storage.upload_dir = dir.clone();
            }
            if let Some(workers) = workers {
                config.server.workers = *workers;
            }
        }
    }
}
