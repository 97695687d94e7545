use crate::config::{fairing, BloscCompressor, EncoderConfig, SpriteLayout};
use rocket::figment::Figment;
use rocket::local::blocking::Client;
use std::collections::HashMap;

fn no_env(_name: &str) -> Option<String> {
    None
}

#[test]
fn test_defaults() {
    let config = EncoderConfig::from_lookup(no_env, &Figment::new());
    assert_eq!(EncoderConfig::default(), config);
    assert_eq!(9, config.blosc_clevel);
    assert_eq!(BloscCompressor::BloscLz, config.blosc_compressor);
    assert_eq!(SpriteLayout::Vertical, config.sprite_layout);
    assert_eq!("log", config.error_recorder);
}

#[test]
fn test_figment_values() {
    let figment = Figment::new()
        .merge(("blosc_clevel", 3))
        .merge(("blosc_compressor", "zstd"))
        .merge(("jpeg_quality", 60))
        .merge(("sprite_layout", "grid:8"))
        .merge(("error_recorder", "console"));
    let config = EncoderConfig::from_lookup(no_env, &figment);
    assert_eq!(3, config.blosc_clevel);
    assert_eq!(BloscCompressor::Zstd, config.blosc_compressor);
    assert_eq!(60, config.jpeg_quality);
    assert_eq!(SpriteLayout::Grid(8), config.sprite_layout);
    assert_eq!("console", config.error_recorder);
}

#[test]
fn test_env_overrides_figment() {
    let mut env = HashMap::new();
    env.insert("BOSS_JPEG_QUALITY", "40".to_string());
    env.insert("BOSS_SPRITE_LAYOUT", "vertical".to_string());
    let figment = Figment::new()
        .merge(("jpeg_quality", 60))
        .merge(("sprite_layout", "grid:2"));

    let config = EncoderConfig::from_lookup(|name| env.get(name).cloned(), &figment);
    assert_eq!(40, config.jpeg_quality);
    assert_eq!(SpriteLayout::Vertical, config.sprite_layout);
}

#[test]
fn test_bad_values_fall_back() {
    let mut env = HashMap::new();
    env.insert("BOSS_BLOSC_COMPRESSOR", "brotli".to_string());
    env.insert("BOSS_SPRITE_LAYOUT", "grid:0".to_string());
    env.insert("BOSS_BLOSC_CLEVEL", "12".to_string());
    env.insert("BOSS_JPEG_QUALITY", "0".to_string());

    let config = EncoderConfig::from_lookup(|name| env.get(name).cloned(), &Figment::new());
    assert_eq!(BloscCompressor::BloscLz, config.blosc_compressor);
    assert_eq!(SpriteLayout::Vertical, config.sprite_layout);
    // Out of range numbers are clamped rather than dropped.
    assert_eq!(9, config.blosc_clevel);
    assert_eq!(1, config.jpeg_quality);
}

#[test]
fn test_sprite_layout_parsing() {
    assert_eq!(Ok(SpriteLayout::Grid(3)), "GRID:3".parse::<SpriteLayout>());
    assert!("grid:".parse::<SpriteLayout>().is_err());
    assert!("horizontal".parse::<SpriteLayout>().is_err());
    assert_eq!("grid:3", SpriteLayout::Grid(3).to_string());
    assert_eq!(1, SpriteLayout::Vertical.columns());
}

#[test]
fn test_fairing_manages_config() {
    let figment = rocket::Config::figment().merge(("jpeg_quality", 55));
    let rocket = rocket::custom(figment).attach(fairing());
    let client = Client::untracked(rocket).unwrap();

    let config = client.rocket().state::<EncoderConfig>().unwrap();
    assert_eq!(55, config.jpeg_quality);
}
