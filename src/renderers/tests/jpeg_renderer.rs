use super::random_uint8_volume;
use crate::config::{EncoderConfig, SpriteLayout};
use crate::error::ErrorCode;
use crate::renderers::{render, render_jpeg, tile_slices, Format, MAX_JPEG_DIMENSION};
use crate::volume::{CutoutRequest, Volume};
use image::ImageFormat;
use ndarray::{s, Array, Array3, Array4};

fn decode(bytes: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg).unwrap();
    (img.width(), img.height())
}

fn error_body(bytes: &[u8]) -> serde_json::Value {
    serde_json::from_slice(bytes).unwrap()
}

#[test]
fn test_vertical_filmstrip() {
    let volume = Volume::from(random_uint8_volume(16, 128, 64));
    let payload = render_jpeg(
        &volume,
        &CutoutRequest::new(false, 8),
        &EncoderConfig::default(),
    )
    .unwrap();
    assert!(!payload.is_error());
    assert_eq!(Format::Jpeg, payload.format());
    assert_eq!("image/jpeg", payload.media_type());
    assert_eq!(&[0xFF, 0xD8], &payload.bytes()[..2]);
    assert_eq!((64, 16 * 128), decode(payload.bytes()));
}

#[test]
fn test_grid_sprite_sheet() {
    let config = EncoderConfig {
        sprite_layout: SpriteLayout::Grid(4),
        jpeg_quality: 90,
        ..EncoderConfig::default()
    };
    let volume = Volume::from(random_uint8_volume(10, 32, 48));
    let payload = render_jpeg(&volume, &CutoutRequest::new(false, 8), &config).unwrap();
    assert!(!payload.is_error());
    // 10 slices at 4 per row is 3 rows.
    assert_eq!((4 * 48, 3 * 32), decode(payload.bytes()));
}

#[test]
fn test_tile_slices_placement() {
    let slices: Array3<u8> = Array::from_shape_fn((3, 2, 2), |(z, _, _)| (z + 1) as u8);

    let sheet = tile_slices(slices.view(), SpriteLayout::Vertical).unwrap();
    assert_eq!((6, 2), sheet.dim());
    assert_eq!(slices.as_slice().unwrap(), sheet.as_slice().unwrap());

    let sheet = tile_slices(slices.view(), SpriteLayout::Grid(2)).unwrap();
    assert_eq!((4, 4), sheet.dim());
    assert!(sheet.slice(s![0..2, 0..2]).iter().all(|&v| v == 1));
    assert!(sheet.slice(s![0..2, 2..4]).iter().all(|&v| v == 2));
    assert!(sheet.slice(s![2..4, 0..2]).iter().all(|&v| v == 3));
    // Unused tile stays black.
    assert!(sheet.slice(s![2..4, 2..4]).iter().all(|&v| v == 0));

    // More columns than slices collapses to a single row.
    let sheet = tile_slices(slices.view(), SpriteLayout::Grid(8)).unwrap();
    assert_eq!((2, 6), sheet.dim());
}

#[test]
fn test_time_series_is_an_error_payload() {
    let volume = Volume::from(Array4::<u8>::zeros((2, 2, 8, 8)));
    let payload = render_jpeg(
        &volume,
        &CutoutRequest::new(true, 8),
        &EncoderConfig::default(),
    )
    .unwrap();
    assert!(payload.is_error());
    assert_eq!(Format::ErrorJson, payload.format());
    assert_eq!("application/json", payload.media_type());
    assert_eq!(400, payload.status());
    assert_eq!(
        Some(ErrorCode::InvalidCutoutArgs),
        payload.error().unwrap().kind()
    );

    let body = error_body(payload.bytes());
    assert_eq!(400, body["status"]);
    assert_eq!(1001, body["code"]);
    assert_eq!(
        "The cutout service JPEG interface does not support 4D cutouts",
        body["message"]
    );
}

#[test]
fn test_non_uint8_is_an_error_payload() {
    let volume = Volume::from(Array4::<u16>::zeros((1, 2, 8, 8)));
    // Through the registry too: render() must not turn it into an `Err`.
    let payload = render(
        "image/jpeg",
        &volume,
        &CutoutRequest::new(false, 16),
        &EncoderConfig::default(),
    )
    .unwrap();
    assert!(payload.is_error());
    assert_eq!(1001, error_body(payload.bytes())["code"]);
}

#[test]
fn test_empty_and_oversized_cutouts() {
    let empty = Volume::from(Array4::<u8>::zeros((1, 0, 8, 8)));
    let payload = render_jpeg(
        &empty,
        &CutoutRequest::new(false, 8),
        &EncoderConfig::default(),
    )
    .unwrap();
    assert_eq!(
        Some(ErrorCode::SerializationError),
        payload.error().unwrap().kind()
    );

    let tall = Array3::<u8>::zeros((MAX_JPEG_DIMENSION / 4 + 1, 4, 1));
    let err = tile_slices(tall.view(), SpriteLayout::Vertical).unwrap_err();
    assert_eq!(Some(ErrorCode::SerializationError), err.kind());
}
