//! Stem catalog: resolves each track's audio file and decodes it.
//!
//! A stems directory holds one WAV per track, named `<track>.wav` unless an
//! optional `stems.toml` manifest says otherwise:
//!
//! ```toml
//! [stems]
//! vocal = "lead_vox_final.wav"
//! drum = "drums_v2.wav"
//! ```
//!
//! Decode failures are per-track: a missing or corrupt stem leaves that one
//! track unloaded and the rest of the session intact.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;
use thiserror::Error;

use crate::audio::Stem;
use crate::mixer::TrackId;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read manifest {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to decode stem {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
}

/// Per-track file names from the manifest. Missing entries fall back to
/// `<track>.wav`.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct StemFiles {
    vocal: String,
    drum: String,
    guitar: String,
    bass: String,
    piano: String,
}

impl Default for StemFiles {
    fn default() -> Self {
        Self {
            vocal: "vocal.wav".into(),
            drum: "drum.wav".into(),
            guitar: "guitar.wav".into(),
            bass: "bass.wav".into(),
            piano: "piano.wav".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default)]
    stems: StemFiles,
}

/// Resolves and decodes the five stems of one session.
pub struct Catalog {
    dir: PathBuf,
    files: StemFiles,
}

impl Catalog {
    pub const MANIFEST_NAME: &'static str = "stems.toml";

    /// Open the catalog for `dir`. A missing manifest is fine (defaults
    /// apply); an unreadable or malformed one is an error.
    pub fn open(dir: &Path) -> Result<Self, CatalogError> {
        let manifest_path = dir.join(Self::MANIFEST_NAME);
        let files = if manifest_path.exists() {
            let text = fs::read_to_string(&manifest_path).map_err(|source| {
                CatalogError::ManifestRead {
                    path: manifest_path.clone(),
                    source,
                }
            })?;
            let manifest: Manifest =
                toml::from_str(&text).map_err(|source| CatalogError::ManifestParse {
                    path: manifest_path.clone(),
                    source,
                })?;
            info!("catalog: manifest {}", manifest_path.display());
            manifest.stems
        } else {
            StemFiles::default()
        };
        Ok(Self {
            dir: dir.to_path_buf(),
            files,
        })
    }

    /// Resolved path of one track's stem file.
    pub fn stem_path(&self, id: TrackId) -> PathBuf {
        let name = match id {
            TrackId::Vocal => &self.files.vocal,
            TrackId::Drum => &self.files.drum,
            TrackId::Guitar => &self.files.guitar,
            TrackId::Bass => &self.files.bass,
            TrackId::Piano => &self.files.piano,
        };
        self.dir.join(name)
    }

    /// Decode one track's stem to mono f32.
    pub fn load_stem(&self, id: TrackId) -> Result<Stem, CatalogError> {
        let path = self.stem_path(id);
        decode_wav(&path).map_err(|source| CatalogError::Decode {
            path: path.clone(),
            source,
        })
    }
}

/// Decode a WAV file to mono f32 samples in [-1, 1]. Multi-channel input is
/// averaged down; integer formats are normalized by their full scale.
fn decode_wav(path: &Path) -> Result<Stem, hound::Error> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let full_scale = (1u32 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<_, _>>()?
        }
    };

    let samples = if channels <= 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok(Stem {
        samples,
        sample_rate_hz: spec.sample_rate,
    })
}
