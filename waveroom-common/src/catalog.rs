//! Static effect, instrument, and sample-pack catalogs
//!
//! Catalog data is immutable configuration: parsed once from the
//! embedded TOML document on first access and shared for the life of
//! the process.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// One adjustable parameter of an effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectParameter {
    pub name: String,
    pub value: f64,
    #[serde(default)]
    pub min_value: f64,
    #[serde(default = "default_max_value")]
    pub max_value: f64,
}

fn default_max_value() -> f64 {
    100.0
}

/// An audio effect available in the studio rack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Effect {
    pub id: String,
    #[serde(rename = "type")]
    pub effect_type: String,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub parameters: Vec<EffectParameter>,
}

fn default_enabled() -> bool {
    true
}

/// A named preset for a virtual instrument
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentPreset {
    pub id: String,
    pub name: String,
    pub instrument_type: String,
}

/// A virtual instrument available for tracks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub instrument_type: String,
    pub category: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub presets: Vec<InstrumentPreset>,
}

/// A pack of loops and one-shots offered in the sample browser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplePack {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub genre: String,
    pub bpm: i64,
    pub samples_count: i64,
}

/// The full startup catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub effects: Vec<Effect>,
    pub instruments: Vec<Instrument>,
    pub sample_packs: Vec<SamplePack>,
}

static BUILTIN: Lazy<Catalog> = Lazy::new(|| {
    toml::from_str(include_str!("catalog.toml")).expect("embedded catalog parses")
});

impl Catalog {
    /// The built-in catalog shipped with the server
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }
}
