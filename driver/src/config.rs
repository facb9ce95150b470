// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use std::path::{Path, PathBuf};

use kiezel_compiler::SelectorOptions;
use kiezel_regexp::RegExpFeatures;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "kiezel.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Kon configuratiebestand `{}` niet lezen: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Ongeldig configuratiebestand `{}`: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigRoot {
    pub log: ConfigSectionLog,
    pub regexp: RegExpFeatures,
    pub selector: SelectorOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigSectionLog {
    pub debug: bool,
}

impl ConfigRoot {
    /// Reads the given file, or `kiezel.toml` when it exists. Without
    /// either, everything is default.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path,
            None if Path::new(DEFAULT_CONFIG_PATH).is_file() => Path::new(DEFAULT_CONFIG_PATH),
            None => return Ok(Self::default()),
        };

        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&source).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiezel_compiler::MipsVariant;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_is_default() {
        let config = ConfigRoot::parse("").unwrap();
        assert!(!config.log.debug);
        assert_eq!(config.regexp, RegExpFeatures::default());
        assert_eq!(config.selector, SelectorOptions::default());
    }

    #[test]
    fn sections_are_kebab_case() {
        let config = ConfigRoot::parse(r#"
            [log]
            debug = true

            [regexp]
            lookbehind = false
            possessive-quantifiers = true
            max-depth = 12

            [selector]
            variant = "r6"
            fp64 = false
        "#).unwrap();

        assert!(config.log.debug);

        assert!(!config.regexp.lookbehind);
        assert!(config.regexp.property_escapes);
        assert!(config.regexp.possessive_quantifiers);
        assert_eq!(config.regexp.max_depth, 12);
        assert_eq!(config.regexp.max_zone_units, RegExpFeatures::default().max_zone_units);

        assert_eq!(config.selector.variant, MipsVariant::R6);
        assert!(!config.selector.fp64);
        assert_eq!(config.selector.max_instructions, SelectorOptions::default().max_instructions);
    }

    #[test]
    fn missing_file_is_reported() {
        let result = ConfigRoot::load(Some(Path::new("bestaat/niet/kiezel.toml")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
