/* ==========================================================================================
 *                          This file is part of the Bachelor Thesis project
 *                                   University of Wrocław
 *                      Evaluation and Ranking of Noise Reduction Methods
 *                                         June 2025
 * ========================================================================================== */
use crate::error::{EvalError, Result};
use crate::ranking::Weights;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Case-insensitive mapping from a noisy file name to its pre-recorded clean counterpart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pairings {
    map: BTreeMap<String, String>,
}

impl Default for Pairings {
    fn default() -> Self {
        (1..=4).map(|i| (format!("noise{}.wav", i), format!("clean{}.wav", i))).collect()
    }
}

impl FromIterator<(String, String)> for Pairings {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Pairings { map: iter.into_iter().map(|(noisy, clean)| (noisy.to_lowercase(), clean)).collect() }
    }
}

impl<'de> Deserialize<'de> for Pairings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}

impl Pairings {
    /// Clean file name registered for the file name of `noisy`, if any.
    pub fn lookup(&self, noisy: &Path) -> Option<&str> {
        let name = noisy.file_name()?.to_str()?.to_lowercase();
        self.map.get(&name).map(String::as_str)
    }

    /// Full path of the clean counterpart of `noisy` under `assets_dir`.
    pub fn resolve(&self, noisy: &Path, assets_dir: &Path) -> Option<PathBuf> {
        self.lookup(noisy).map(|clean| assets_dir.join(clean))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Settings for a comparison run, usually read from a JSON file.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvalConfig {
    #[serde(default)]
    pub weights: Weights,
    #[serde(default)]
    pub pairings: Pairings,
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig { weights: Weights::default(), pairings: Pairings::default(), assets_dir: default_assets_dir() }
    }
}

impl EvalConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: EvalConfig = serde_json::from_str(text)?;
        config.weights.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file. Relative `assets_dir` is resolved against the file's directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut config = Self::from_json(&text)
            .map_err(|e| EvalError::Config(format!("{}: {}", path.display(), e)))?;
        if config.assets_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.assets_dir = parent.join(&config.assets_dir);
            }
        }
        log::debug!("loaded config from {} ({} pairings)", path.display(), config.pairings.len());
        Ok(config)
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}
