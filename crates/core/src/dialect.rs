//! Dialect configuration: which CPU variant and which optional instruction
//! sets the grammar table recognizes.
//!
//! A dialect is usually read from a small TOML file:
//!
//! ```toml
//! cpu = "tms9995"
//! extensions = ["f18a"]
//! max_depth = 64
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default bound on expression nesting.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Largest nesting bound a dialect may ask for. Deeper limits would let
/// pathological input exhaust the parser's stack.
pub const MAX_DEPTH_LIMIT: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cpu {
    #[default]
    Tms9900,
    Tms9995,
    Tms99105,
    Tms99110,
}

impl Cpu {
    /// Whether this CPU includes the TMS9995 additions (MPYS, DIVS, LST, LWP).
    pub fn has_9995_set(self) -> bool {
        self >= Cpu::Tms9995
    }

    /// Whether this CPU includes the TMS99000-family additions.
    pub fn has_99000_set(self) -> bool {
        self >= Cpu::Tms99105
    }
}

impl FromStr for Cpu {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tms9900" | "9900" => Ok(Cpu::Tms9900),
            "tms9995" | "9995" => Ok(Cpu::Tms9995),
            "tms99105" | "99105" => Ok(Cpu::Tms99105),
            "tms99110" | "99110" => Ok(Cpu::Tms99110),
            _ => Err(ConfigError::UnknownCpu(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Extension {
    /// F18A GPU instructions (CALL, RET, PUSH, POP, SLC, PIX).
    F18a,
    /// Block MOVE with count, source and destination addresses.
    GplMove,
}

impl FromStr for Extension {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "f18a" => Ok(Extension::F18a),
            "gpl-move" | "gplmove" => Ok(Extension::GplMove),
            _ => Err(ConfigError::UnknownExtension(s.to_owned())),
        }
    }
}

/// Caller-supplied dialect selection, fixed before parsing begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Dialect {
    pub cpu: Cpu,
    pub extensions: Vec<Extension>,
    /// Maximum expression nesting before the parser fails closed.
    pub max_depth: usize,
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect {
            cpu: Cpu::default(),
            extensions: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Dialect {
    pub fn new(cpu: Cpu) -> Self {
        Dialect {
            cpu,
            ..Dialect::default()
        }
    }

    pub fn with_extension(mut self, ext: Extension) -> Self {
        if !self.extensions.contains(&ext) {
            self.extensions.push(ext);
        }
        self
    }

    pub fn has(&self, ext: Extension) -> bool {
        self.extensions.contains(&ext)
    }

    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let dialect: Dialect = toml::from_str(src)?;
        dialect.validate()?;
        Ok(dialect)
    }

    /// Read a dialect file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::debug!("loading dialect from {}", path.display());
        Self::from_toml_str(&src)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_DEPTH_LIMIT).contains(&self.max_depth) {
            return Err(ConfigError::DepthOutOfRange {
                value: self.max_depth,
                max: MAX_DEPTH_LIMIT,
            });
        }
        Ok(())
    }
}
