//! Device domain configuration.
//!
//! Each domain carries its own aliases so vocabulary can be tuned to the
//! speech model in use (e.g. adding "cody" because the model keeps
//! hearing it instead of "kodi") without touching code.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{default_true, expand_home};

/// Lighting domain driven by the `hue` CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HueConfig {
    /// Register the lighting domain at startup.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Program to invoke.
    #[serde(default = "default_hue_program")]
    pub program: String,

    /// Light identifier passed as `lights <light> ...`.
    #[serde(default = "default_light")]
    pub light: String,

    /// Top-level keywords that select this domain.
    #[serde(default = "default_hue_aliases")]
    pub aliases: Vec<String>,

    /// Phrases for switching the light on.
    #[serde(default = "default_on_aliases", alias = "onAliases")]
    pub on_aliases: Vec<String>,

    /// Phrases for switching the light off.
    #[serde(default = "default_off_aliases", alias = "offAliases")]
    pub off_aliases: Vec<String>,

    /// Phrases that introduce a colour change.
    #[serde(default = "default_color_aliases", alias = "colorAliases")]
    pub color_aliases: Vec<String>,

    /// Colour palette accepted by the CLI.
    #[serde(default = "default_colors")]
    pub colors: Vec<String>,

    /// Pairing credential written by `hue register`.
    #[serde(default = "default_pairing_file", alias = "pairingFile")]
    pub pairing_file: String,
}

fn default_hue_program() -> String {
    "hue".into()
}
fn default_light() -> String {
    "2".into()
}
fn default_hue_aliases() -> Vec<String> {
    vec!["lights".into(), "hue".into()]
}
fn default_on_aliases() -> Vec<String> {
    vec!["on".into()]
}
fn default_off_aliases() -> Vec<String> {
    vec!["off".into()]
}
fn default_color_aliases() -> Vec<String> {
    vec!["color".into()]
}
fn default_colors() -> Vec<String> {
    vec!["red".into(), "blue".into(), "white".into()]
}
fn default_pairing_file() -> String {
    "~/.hue.json".into()
}

impl Default for HueConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: default_hue_program(),
            light: default_light(),
            aliases: default_hue_aliases(),
            on_aliases: default_on_aliases(),
            off_aliases: default_off_aliases(),
            color_aliases: default_color_aliases(),
            colors: default_colors(),
            pairing_file: default_pairing_file(),
        }
    }
}

impl HueConfig {
    /// Pairing credential path with `~/` expanded.
    pub fn pairing_path(&self) -> PathBuf {
        expand_home(&self.pairing_file)
    }
}

/// Media domain driven by `kodi-cli`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KodiConfig {
    /// Register the media domain at startup.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Program to invoke.
    #[serde(default = "default_kodi_program")]
    pub program: String,

    /// Top-level keywords that select this domain.
    #[serde(default = "default_kodi_aliases")]
    pub aliases: Vec<String>,

    /// Phrases that toggle playback.
    #[serde(default = "default_pause_aliases", alias = "pauseAliases")]
    pub pause_aliases: Vec<String>,

    /// Arguments for the pause toggle.
    #[serde(default = "default_pause_args", alias = "pauseArgs")]
    pub pause_args: Vec<String>,
}

fn default_kodi_program() -> String {
    "kodi-cli".into()
}
fn default_kodi_aliases() -> Vec<String> {
    vec!["kodi".into(), "cody".into()]
}
fn default_pause_aliases() -> Vec<String> {
    vec!["pause".into(), "pose".into()]
}
fn default_pause_args() -> Vec<String> {
    vec!["-p".into()]
}

impl Default for KodiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: default_kodi_program(),
            aliases: default_kodi_aliases(),
            pause_aliases: default_pause_aliases(),
            pause_args: default_pause_args(),
        }
    }
}
