/// Configuration module.
///
/// Gets encoder settings from environment variables and the Rocket
/// figment (Rocket.toml, ROCKET_* variables).  Values set as environment
/// variables will override like values in the config file.
use crate::recorder;
use rocket::fairing::AdHoc;
use rocket::figment::Figment;
use std::env;
use std::fmt;
use std::str::FromStr;

#[cfg(test)]
pub mod tests;

/// User string names for error recorders.
pub const NONE_RECORDER: &str = "none";
pub const CONSOLE_RECORDER: &str = "console";
pub const LOG_RECORDER: &str = "log";

const BLOSC_CLEVEL_ENV_NAME: &str = "BOSS_BLOSC_CLEVEL";
const BLOSC_CLEVEL_ROCKET_CFG: &str = "blosc_clevel";
/// Same default level as python-blosc.
const BLOSC_CLEVEL_DEFAULT: u8 = 9;
const BLOSC_CLEVEL_MAX: u8 = 9;

const BLOSC_COMPRESSOR_ENV_NAME: &str = "BOSS_BLOSC_COMPRESSOR";
const BLOSC_COMPRESSOR_ROCKET_CFG: &str = "blosc_compressor";

const JPEG_QUALITY_ENV_NAME: &str = "BOSS_JPEG_QUALITY";
const JPEG_QUALITY_ROCKET_CFG: &str = "jpeg_quality";
const JPEG_QUALITY_DEFAULT: u8 = 75;

const SPRITE_LAYOUT_ENV_NAME: &str = "BOSS_SPRITE_LAYOUT";
const SPRITE_LAYOUT_ROCKET_CFG: &str = "sprite_layout";

const ERROR_RECORDER_ENV_NAME: &str = "BOSS_ERROR_RECORDER";
const ERROR_RECORDER_ROCKET_CFG: &str = "error_recorder";

/// Compressors blosc can be asked to use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BloscCompressor {
    BloscLz,
    Lz4,
    Lz4hc,
    Snappy,
    Zlib,
    Zstd,
}

impl FromStr for BloscCompressor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "blosclz" => Ok(BloscCompressor::BloscLz),
            "lz4" => Ok(BloscCompressor::Lz4),
            "lz4hc" => Ok(BloscCompressor::Lz4hc),
            "snappy" => Ok(BloscCompressor::Snappy),
            "zlib" => Ok(BloscCompressor::Zlib),
            "zstd" => Ok(BloscCompressor::Zstd),
            other => Err(format!("unknown blosc compressor: {}", other)),
        }
    }
}

/// How z-slices are packed into a JPEG sprite sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpriteLayout {
    /// Every slice concatenated in the y-dimension: one column of tiles.
    Vertical,
    /// Slices laid out row-major, this many per row.
    Grid(usize),
}

impl SpriteLayout {
    /// Number of tiles per row of the sheet.
    pub fn columns(&self) -> usize {
        match self {
            SpriteLayout::Vertical => 1,
            SpriteLayout::Grid(columns) => *columns,
        }
    }
}

impl FromStr for SpriteLayout {
    type Err = String;

    /// Parses `vertical` or `grid:<columns>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        if lowered == "vertical" {
            return Ok(SpriteLayout::Vertical);
        }
        match lowered.strip_prefix("grid:").map(|n| n.parse::<usize>()) {
            Some(Ok(columns)) if columns > 0 => Ok(SpriteLayout::Grid(columns)),
            _ => Err(format!("invalid sprite layout: {}", s)),
        }
    }
}

impl fmt::Display for SpriteLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpriteLayout::Vertical => write!(f, "vertical"),
            SpriteLayout::Grid(columns) => write!(f, "grid:{}", columns),
        }
    }
}

/// Settings used by the renderers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    /// 0 (no compression) through 9.
    pub blosc_clevel: u8,
    pub blosc_compressor: BloscCompressor,
    /// 1 through 100.
    pub jpeg_quality: u8,
    pub sprite_layout: SpriteLayout,
    /// One of `none`, `console` or `log`.
    pub error_recorder: String,
}

impl Default for EncoderConfig {
    fn default() -> EncoderConfig {
        EncoderConfig {
            blosc_clevel: BLOSC_CLEVEL_DEFAULT,
            blosc_compressor: BloscCompressor::BloscLz,
            jpeg_quality: JPEG_QUALITY_DEFAULT,
            sprite_layout: SpriteLayout::Vertical,
            error_recorder: LOG_RECORDER.to_string(),
        }
    }
}

impl EncoderConfig {
    /// Gets the encoder config.  First checks for environment variables.
    /// Then checks for values in the Rocket figment.
    pub fn from_figment(figment: &Figment) -> EncoderConfig {
        EncoderConfig::from_lookup(|name| env::var(name).ok(), figment)
    }

    /// Like `from_figment()`, but environment variables come from `env`.
    ///
    /// # Arguments:
    ///
    /// * `env` - Returns the value of an environment variable, if set
    /// * `figment` - Rocket's configuration provider
    pub fn from_lookup<F>(env: F, figment: &Figment) -> EncoderConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = EncoderConfig::default();

        let blosc_clevel: u8 = get_setting(
            &env,
            figment,
            BLOSC_CLEVEL_ENV_NAME,
            BLOSC_CLEVEL_ROCKET_CFG,
            defaults.blosc_clevel,
        );
        let jpeg_quality: u8 = get_setting(
            &env,
            figment,
            JPEG_QUALITY_ENV_NAME,
            JPEG_QUALITY_ROCKET_CFG,
            defaults.jpeg_quality,
        );

        EncoderConfig {
            blosc_clevel: blosc_clevel.min(BLOSC_CLEVEL_MAX),
            blosc_compressor: get_setting(
                &env,
                figment,
                BLOSC_COMPRESSOR_ENV_NAME,
                BLOSC_COMPRESSOR_ROCKET_CFG,
                defaults.blosc_compressor,
            ),
            jpeg_quality: jpeg_quality.max(1).min(100),
            sprite_layout: get_setting(
                &env,
                figment,
                SPRITE_LAYOUT_ENV_NAME,
                SPRITE_LAYOUT_ROCKET_CFG,
                defaults.sprite_layout,
            ),
            error_recorder: get_setting(
                &env,
                figment,
                ERROR_RECORDER_ENV_NAME,
                ERROR_RECORDER_ROCKET_CFG,
                defaults.error_recorder,
            ),
        }
    }
}

/// Read a raw setting, environment first.  Figment values may be strings
/// or integers.
fn get_raw_setting<F>(env: &F, figment: &Figment, env_name: &str, cfg_key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = env(env_name) {
        return Some(val);
    }
    if let Ok(val) = figment.extract_inner::<String>(cfg_key) {
        return Some(val);
    }
    figment
        .extract_inner::<i64>(cfg_key)
        .ok()
        .map(|val| val.to_string())
}

fn get_setting<F, T>(env: &F, figment: &Figment, env_name: &str, cfg_key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get_raw_setting(env, figment, env_name, cfg_key) {
        None => default,
        Some(raw) => match raw.parse::<T>() {
            Ok(val) => val,
            Err(_) => {
                log::warn!("Ignoring bad value for {}: {}", cfg_key, raw);
                default
            }
        },
    }
}

/// Fairing that reads the `EncoderConfig`, puts it in managed state, and
/// installs the configured error recorder.
pub fn fairing() -> AdHoc {
    AdHoc::on_ignite("Encoder Config", |rocket| async move {
        let config = EncoderConfig::from_figment(rocket.figment());
        log::info!("Encoder config: {:?}", config);
        let kind = recorder::get_recorder_type(&config.error_recorder);
        if !recorder::install(kind) {
            log::warn!("Error recorder already installed; keeping it");
        }
        rocket.manage(config)
    })
}
