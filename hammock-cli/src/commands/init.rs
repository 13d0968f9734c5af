//! `hammock init --url <url> --database <db> [...]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use hammock_core::{config, Config};

/// Write the connection settings.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Server URL, e.g. http://localhost:5984
    #[arg(long)]
    pub url: String,

    /// Database holding the design documents.
    #[arg(long, short = 'd')]
    pub database: String,

    #[arg(long, short = 'u')]
    pub username: Option<String>,

    #[arg(long, short = 'p', requires = "username")]
    pub password: Option<String>,

    /// Designs root used when commands are not given --designs.
    #[arg(long)]
    pub designs: Option<PathBuf>,

    /// Overwrite an existing config file.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let path = config::config_path()?;

        let mut wanted = Config::new(self.url, self.database);
        wanted.username = self.username;
        wanted.password = self.password;
        if let Some(designs) = self.designs {
            wanted.designs = designs;
        }

        if self.force {
            config::save(&wanted)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("✓ Wrote {}", path.display());
            return Ok(());
        }

        let existed = path.exists();
        let config = config::init(wanted)
            .with_context(|| format!("failed to init {}", path.display()))?;
        if existed {
            println!(
                "Config already exists at {} (database '{}'); use --force to overwrite.",
                path.display(),
                config.database
            );
        } else {
            println!("✓ Wrote {}", path.display());
        }
        Ok(())
    }
}
