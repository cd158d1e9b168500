//! `skein.toml` loading.
//!
//! ```toml
//! [recovery]
//! lookahead_limit = 4
//! completion_iteration_limit = 15
//! resolution_iteration_limit = 7
//! ```
//!
//! Every key is optional; omitted keys keep the engine defaults.

use std::path::Path;

use serde::Deserialize;
use skein_syntax::RecoveryConfig;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SkeinConfig {
    #[serde(default)]
    pub recovery: RecoveryConfig,
}

/// Read the config at `path`, or the defaults when no path was given.
pub(crate) fn load(path: Option<&Path>) -> Result<SkeinConfig, String> {
    let Some(path) = path else {
        return Ok(SkeinConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    let config = parse_config(&content)
        .map_err(|e| format!("could not parse '{}': {}", path.display(), e))?;
    log::debug!("loaded {}: {:?}", path.display(), config.recovery);
    Ok(config)
}

fn parse_config(content: &str) -> Result<SkeinConfig, toml::de::Error> {
    toml::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_keeps_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.recovery, RecoveryConfig::default());
    }

    #[test]
    fn partial_recovery_table_overrides_only_named_keys() {
        let config = parse_config("[recovery]\nlookahead_limit = 2\n").unwrap();
        assert_eq!(config.recovery.lookahead_limit, 2);
        assert_eq!(
            config.recovery.resolution_iteration_limit,
            RecoveryConfig::default().resolution_iteration_limit
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_config("[recovery]\nlookahead = 2\n").is_err());
        assert!(parse_config("[parser]\n").is_err());
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load(Some(Path::new("does/not/exist.toml"))).unwrap_err();
        assert!(err.contains("does/not/exist.toml"), "{}", err);
    }
}
