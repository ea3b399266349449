//! Runtime configuration: built-in defaults, overridden by command-line flags.

use std::{
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use crate::{
    foundation::error::{CountdownError, CountdownResult},
    text::{DEFAULT_FONT_PATH, DEFAULT_FONT_SIZE_PX, FontResource},
};

pub const DEV_PORT: u16 = 5000;
pub const PROD_PORT: u16 = 8000;
pub const PROD_WORKERS: usize = 4;
/// Blocking threads kept free of generations for file I/O such as streaming downloads.
pub const BLOCKING_IO_HEADROOM: usize = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct GeneratorConfig {
    pub font_path: PathBuf,
    pub font_size_px: f32,
    pub output_dir: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            font_path: PathBuf::from(DEFAULT_FONT_PATH),
            font_size_px: DEFAULT_FONT_SIZE_PX,
            output_dir: PathBuf::from("."),
        }
    }
}

impl GeneratorConfig {
    pub fn load_font(&self) -> CountdownResult<FontResource> {
        FontResource::load(&self.font_path, self.font_size_px)
    }

    /// Output path without extension for a file named `name_base`.
    pub fn output_name_base(&self, name_base: &str) -> PathBuf {
        self.output_dir.join(name_base)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServeProfile {
    Development,
    Production,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    /// Runtime worker threads; also caps concurrent generations.
    pub workers: usize,
    pub profile: ServeProfile,
}

impl ServeConfig {
    pub fn development() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEV_PORT)),
            workers: 1,
            profile: ServeProfile::Development,
        }
    }

    pub fn production() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, PROD_PORT)),
            workers: PROD_WORKERS,
            profile: ServeProfile::Production,
        }
    }

    pub fn for_profile(profile: ServeProfile) -> Self {
        match profile {
            ServeProfile::Development => Self::development(),
            ServeProfile::Production => Self::production(),
        }
    }

    pub fn validate(&self) -> CountdownResult<()> {
        if self.workers == 0 {
            return Err(CountdownError::validation("serve workers must be >= 1"));
        }
        Ok(())
    }

    /// Blocking pool size: one thread per concurrent generation plus I/O headroom.
    pub fn max_blocking_threads(&self) -> usize {
        self.workers + BLOCKING_IO_HEADROOM
    }

    pub fn default_log_level(&self) -> &'static str {
        match self.profile {
            ServeProfile::Development => "debug",
            ServeProfile::Production => "info",
        }
    }
}
