//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "stemstage")]
#[command(about = "Audio-reactive 3D stage for multitrack stems", long_about = None)]
pub struct Args {
    /// Directory holding the five stem WAVs and an optional stems.toml
    #[arg(long, value_name = "DIR", default_value = "stems")]
    pub stems: PathBuf,

    /// Amplitude samples (bars) per ring; must be a power of two
    #[arg(long, value_name = "N", default_value_t = 128)]
    pub resolution: usize,

    /// Start playback immediately
    #[arg(long)]
    pub autoplay: bool,
}
