//! Command-line flags. Each one overrides the matching environment setting.

use std::path::PathBuf;

use clap::Parser;
use docqa_core::Config;

#[derive(Debug, Parser)]
#[command(name = "docqa-server", version, about = "Ask questions about a PDF over HTTP")]
pub struct Cli {
    /// Config profile; keys are looked up as {PROFILE}_{KEY} first.
    #[arg(long, env = "DOCQA_PROFILE")]
    pub profile: Option<String>,

    /// PDF to load before serving. Startup fails if it cannot be read.
    #[arg(long, value_name = "PATH")]
    pub pdf: Option<PathBuf>,

    /// Serve only the startup PDF; do not mount /upload.
    #[arg(long)]
    pub no_upload: bool,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,
}

impl Cli {
    /// Resolve the config for the selected profile and apply flag overrides.
    pub fn into_config(self) -> Config {
        let mut config = match self.profile.as_deref() {
            Some(profile) => Config::for_profile(profile),
            None => Config::from_env(),
        };
        if let Some(pdf) = self.pdf {
            config.document.startup_pdf = Some(pdf);
        }
        if self.no_upload {
            config.document.upload_enabled = false;
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        config
    }
}
