use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediagate")]
#[command(author, version, about = "Resolve and serve media node file requests")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON catalogue of content objects
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show delivery mode, content type, length, and headers for a request
    Describe {
        /// Request path, e.g. /content/media/object_id/42
        #[arg(required = true)]
        path: String,

        /// Client user agent used for quirk detection
        #[arg(long)]
        user_agent: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Stream the bytes of a request to a file or stdout
    Fetch {
        /// Request path
        #[arg(required = true)]
        path: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List transcoding profiles and whether their commands are available
    Profiles,

    /// Validate configuration file
    Validate,
}
