//! The built-in command tree.
//!
//! Top level: a keyword registry whose nodes are the enabled [`Domain`]s.
//! Each domain owns an utterance-mode registry of actions:
//!
//! ```text
//! domains (keyword)
//! ├── lights | hue  -> lights (utterance)
//! │   ├── on        -> hue lights <light> on
//! │   ├── off       -> hue lights <light> off
//! │   └── color     -> hue lights <light> <red|blue|white>
//! └── kodi | cody   -> media (utterance)
//!     └── pause | pose -> kodi-cli -p
//! ```
//!
//! Every alias, program name and palette entry comes from [`Config`].

use tracing::debug;

use murmur_types::config::{Config, HueConfig, KodiConfig};
use murmur_types::{ActionInvocation, Result};

use crate::registry::{Handler, MatchMode, ParameterAction, Registry};

/// Name of the top-level registry.
pub const ROOT_REGISTRY: &str = "domains";

/// Device domains reachable from the top level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    /// Lights via the `hue` CLI.
    Lighting,
    /// Media playback via `kodi-cli`.
    Media,
}

impl Domain {
    /// Declaration order of the top level.
    pub const ALL: [Domain; 2] = [Domain::Lighting, Domain::Media];

    pub fn name(self) -> &'static str {
        match self {
            Domain::Lighting => "lights",
            Domain::Media => "media",
        }
    }

    pub fn enabled(self, config: &Config) -> bool {
        match self {
            Domain::Lighting => config.hue.enabled,
            Domain::Media => config.kodi.enabled,
        }
    }

    /// Keywords that select this domain at the top level.
    pub fn aliases(self, config: &Config) -> &[String] {
        match self {
            Domain::Lighting => &config.hue.aliases,
            Domain::Media => &config.kodi.aliases,
        }
    }

    /// External program this domain drives.
    pub fn program(self, config: &Config) -> &str {
        match self {
            Domain::Lighting => &config.hue.program,
            Domain::Media => &config.kodi.program,
        }
    }

    /// The domain's action registry.
    pub fn registry(self, config: &Config) -> Result<Registry> {
        match self {
            Domain::Lighting => lighting_registry(&config.hue),
            Domain::Media => media_registry(&config.kodi),
        }
    }
}

/// Build the full dispatch tree for `config`.
///
/// Disabled domains are left out, so their keywords never match.
pub fn build_registry(config: &Config) -> Result<Registry> {
    config.validate()?;

    let mut builder = Registry::builder(ROOT_REGISTRY, MatchMode::Keyword);
    for domain in Domain::ALL {
        if !domain.enabled(config) {
            debug!(domain = domain.name(), "domain disabled, not registering");
            continue;
        }
        builder = builder.node(
            domain.name(),
            domain.aliases(config).iter().cloned(),
            Handler::Registry(domain.registry(config)?),
        );
    }
    builder.build()
}

fn lighting_registry(hue: &HueConfig) -> Result<Registry> {
    let light = ActionInvocation::new(&hue.program, ["lights", hue.light.as_str()]);
    Registry::builder(Domain::Lighting.name(), MatchMode::Utterance)
        .node(
            "on",
            hue.on_aliases.iter().cloned(),
            Handler::Action(light.with_arg("on")),
        )
        .node(
            "off",
            hue.off_aliases.iter().cloned(),
            Handler::Action(light.with_arg("off")),
        )
        .node(
            "color",
            hue.color_aliases.iter().cloned(),
            Handler::Parameter(ParameterAction::new(light, hue.colors.iter().cloned())),
        )
        .build()
}

fn media_registry(kodi: &KodiConfig) -> Result<Registry> {
    Registry::builder(Domain::Media.name(), MatchMode::Utterance)
        .node(
            "pause",
            kodi.pause_aliases.iter().cloned(),
            Handler::Action(ActionInvocation::new(
                &kodi.program,
                kodi.pause_args.iter().cloned(),
            )),
        )
        .build()
}
