/*

Copyright 2020 The Johns Hopkins University Applied Physics Laboratory

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.

*/

/// Cutout renderers.
///
/// Turns a `Volume` into the bytes for one of the cutout service's
/// transport formats.  Renderers are looked up by media type in `RENDERERS`.
use crate::config::{BloscCompressor, EncoderConfig, SpriteLayout};
use crate::error::{BossError, ErrorCode};
use crate::volume::{for_each_volume, prepare, CutoutRequest, Volume};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::codecs::jpeg::JpegEncoder;
use image::ColorType;
use ndarray::{s, Array2, ArrayView3, Axis, CowArray, IxDyn};
use ndarray_npy::{WritableElement, WriteNpyExt};
use std::io::Write;


pub const BLOSC_PYTHON_MEDIA_TYPE: &str = "application/blosc-python";
pub const BLOSC_MEDIA_TYPE: &str = "application/blosc";
pub const NPYGZ_MEDIA_TYPE: &str = "application/npygz";
pub const JPEG_MEDIA_TYPE: &str = "image/jpeg";
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Largest side of a baseline JPEG.
pub const MAX_JPEG_DIMENSION: usize = 65535;

/// The kinds of payload a renderer can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    /// `.npy` container, blosc compressed.
    BloscPython,
    /// Bare element buffer, blosc compressed.
    Blosc,
    /// `.npy` container, zlib compressed.
    Npygz,
    /// Sprite sheet of z-slices.
    Jpeg,
    /// `{status, code, message}`, when rendering failed.
    ErrorJson,
}

impl Format {
    pub fn media_type(self) -> &'static str {
        match self {
            Format::BloscPython => BLOSC_PYTHON_MEDIA_TYPE,
            Format::Blosc => BLOSC_MEDIA_TYPE,
            Format::Npygz => NPYGZ_MEDIA_TYPE,
            Format::Jpeg => JPEG_MEDIA_TYPE,
            Format::ErrorJson => JSON_MEDIA_TYPE,
        }
    }

    /// File extension for the payload.
    pub fn extension(self) -> &'static str {
        match self {
            Format::BloscPython | Format::Blosc | Format::Npygz => "bin",
            Format::Jpeg => "jpg",
            Format::ErrorJson => "json",
        }
    }
}

/// Bytes ready to go out, tagged with what they are.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedPayload {
    format: Format,
    status: u16,
    bytes: Vec<u8>,
    /// Set when this payload stands in for a failed render.
    error: Option<BossError>,
}

impl EncodedPayload {
    pub fn new(format: Format, bytes: Vec<u8>) -> EncodedPayload {
        EncodedPayload {
            format,
            status: 200,
            bytes,
            error: None,
        }
    }

    /// An error-json payload.  Renderers return this instead of an `Err`
    /// when they are not allowed to fail.
    pub fn from_error(error: &BossError) -> EncodedPayload {
        EncodedPayload {
            format: Format::ErrorJson,
            status: error.status(),
            bytes: error.to_body(),
            error: Some(error.clone()),
        }
    }

    /// Check this before treating the payload as cutout data.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<&BossError> {
        self.error.as_ref()
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn media_type(&self) -> &'static str {
        self.format.media_type()
    }

    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

pub type RenderFn =
    fn(&Volume, &CutoutRequest, &EncoderConfig) -> Result<EncodedPayload, BossError>;

/// Media type to renderer.
pub static RENDERERS: [(&str, RenderFn); 4] = [
    (BLOSC_PYTHON_MEDIA_TYPE, render_blosc_python),
    (BLOSC_MEDIA_TYPE, render_blosc),
    (NPYGZ_MEDIA_TYPE, render_npygz),
    (JPEG_MEDIA_TYPE, render_jpeg),
];

/// Find the renderer for a `Content-Type`/`Accept` value.  Parameters after
/// a `;` are ignored.
pub fn lookup_renderer(media_type: &str) -> Option<RenderFn> {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();
    RENDERERS
        .iter()
        .find(|(name, _)| *name == essence)
        .map(|(_, render)| *render)
}

/// Render a cutout in the requested media type.
///
/// # Arguments
///
/// * `media_type` - One of the media types in `RENDERERS`
/// * `volume` - The cutout data
/// * `request` - Time range and bit depth from the request
/// * `config` - Compression and image settings
///
pub fn render(
    media_type: &str,
    volume: &Volume,
    request: &CutoutRequest,
    config: &EncoderConfig,
) -> Result<EncodedPayload, BossError> {
    let render = lookup_renderer(media_type).ok_or_else(|| {
        BossError::new(
            format!("Unsupported transport format: {}", media_type),
            ErrorCode::UnsupportedTransportFormat,
        )
    })?;
    let payload = render(volume, request, config)?;
    log::debug!(
        "Rendered {:?} cutout as {}: {} bytes",
        volume.shape(),
        payload.media_type(),
        payload.bytes().len()
    );
    Ok(payload)
}

/// Blosc-compressed `.npy` container.  The container carries dtype and
/// shape, so python clients can unpack it without knowing either.
pub fn render_blosc_python(
    volume: &Volume,
    request: &CutoutRequest,
    config: &EncoderConfig,
) -> Result<EncodedPayload, BossError> {
    volume.validate(request)?;
    let npy = for_each_volume!(volume, array => write_npy(&prepare(array, request)?)?);
    let compressed: Vec<u8> = blosc_context(config)?.compress(&npy[..]).into();
    Ok(EncodedPayload::new(Format::BloscPython, compressed))
}

/// Blosc-compressed element buffer, with the element width as the type
/// size.  Clients must already know the cutout's shape and dtype.
pub fn render_blosc(
    volume: &Volume,
    request: &CutoutRequest,
    config: &EncoderConfig,
) -> Result<EncodedPayload, BossError> {
    volume.validate(request)?;
    let ctx = blosc_context(config)?.typesize(Some(request.type_size()));
    let compressed: Vec<u8> = for_each_volume!(volume, array => {
        let prepared = prepare(array, request)?;
        ctx.compress(contiguous_slice(&prepared)?).into()
    });
    Ok(EncodedPayload::new(Format::Blosc, compressed))
}

/// Zlib-compressed `.npy` container, for older tools.
pub fn render_npygz(
    volume: &Volume,
    request: &CutoutRequest,
    _config: &EncoderConfig,
) -> Result<EncodedPayload, BossError> {
    volume.validate(request)?;
    let npy = for_each_volume!(volume, array => write_npy(&prepare(array, request)?)?);

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&npy)
        .map_err(|err| serialization_error("compress npy", err))?;
    let compressed = encoder
        .finish()
        .map_err(|err| serialization_error("compress npy", err))?;
    Ok(EncodedPayload::new(Format::Npygz, compressed))
}

/// JPEG sprite sheet of z-slices.  Only works for 3D `uint8` cutouts.
///
/// This never returns `Err`: failures come back as an error-json payload,
/// so check `is_error()` on the result.
pub fn render_jpeg(
    volume: &Volume,
    request: &CutoutRequest,
    config: &EncoderConfig,
) -> Result<EncodedPayload, BossError> {
    let payload = match jpeg_sprite_sheet(volume, request, config) {
        Ok(bytes) => EncodedPayload::new(Format::Jpeg, bytes),
        Err(err) => EncodedPayload::from_error(&err),
    };
    Ok(payload)
}

fn jpeg_sprite_sheet(
    volume: &Volume,
    request: &CutoutRequest,
    config: &EncoderConfig,
) -> Result<Vec<u8>, BossError> {
    if request.has_time {
        return Err(BossError::new(
            "The cutout service JPEG interface does not support 4D cutouts",
            ErrorCode::InvalidCutoutArgs,
        ));
    }
    if request.bit_depth != 8 {
        return Err(BossError::new(
            "The cutout service JPEG interface only supports uint8 channels",
            ErrorCode::InvalidCutoutArgs,
        ));
    }
    volume.validate(request)?;
    let array = match volume {
        Volume::U8(array) => array,
        _ => {
            return Err(BossError::new(
                "JPEG cutouts must be uint8",
                ErrorCode::TypeError,
            ))
        }
    };

    let prepared = prepare(array, request)?;
    let slices = prepared
        .view()
        .into_dimensionality()
        .map_err(|err| serialization_error("reshape cutout", err))?;
    let sheet = tile_slices(slices, config.sprite_layout)?;
    let (height, width) = sheet.dim();

    let mut bytes: Vec<u8> = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, config.jpeg_quality)
        .encode(
            &sheet.into_raw_vec(),
            width as u32,
            height as u32,
            ColorType::L8,
        )
        .map_err(|err| serialization_error("encode JPEG", err))?;
    Ok(bytes)
}

/// Pack the z-slices of a (z, y, x) array into one 2D image.
///
/// Slice `k` goes in tile row `k / columns`, tile column `k % columns`.
/// Unused tiles in the last row are left black.
///
/// # Returns
///
/// * A (rows * y, columns * x) array
///
pub fn tile_slices(
    slices: ArrayView3<u8>,
    layout: SpriteLayout,
) -> Result<Array2<u8>, BossError> {
    let (z, y, x) = slices.dim();
    if z == 0 || y == 0 || x == 0 {
        return Err(BossError::new(
            format!("Cannot make a JPEG from an empty cutout ({}, {}, {})", z, y, x),
            ErrorCode::SerializationError,
        ));
    }

    let columns = layout.columns().min(z);
    let rows = (z + columns - 1) / columns;
    let (height, width) = (rows * y, columns * x);
    if height > MAX_JPEG_DIMENSION || width > MAX_JPEG_DIMENSION {
        return Err(BossError::new(
            format!(
                "Sprite sheet of {}x{} exceeds the JPEG limit of {}",
                width, height, MAX_JPEG_DIMENSION
            ),
            ErrorCode::SerializationError,
        ));
    }

    let mut sheet = Array2::<u8>::zeros((height, width));
    for (k, slice) in slices.axis_iter(Axis(0)).enumerate() {
        let (row, col) = (k / columns, k % columns);
        sheet
            .slice_mut(s![row * y..(row + 1) * y, col * x..(col + 1) * x])
            .assign(&slice);
    }
    Ok(sheet)
}

fn blosc_context(config: &EncoderConfig) -> Result<blosc::Context, BossError> {
    let compressor = match config.blosc_compressor {
        BloscCompressor::BloscLz => blosc::Compressor::BloscLZ,
        BloscCompressor::Lz4 => blosc::Compressor::LZ4,
        BloscCompressor::Lz4hc => blosc::Compressor::LZ4HC,
        BloscCompressor::Snappy => blosc::Compressor::Snappy,
        BloscCompressor::Zlib => blosc::Compressor::Zlib,
        BloscCompressor::Zstd => blosc::Compressor::Zstd,
    };
    let clevel = match config.blosc_clevel {
        0 => blosc::Clevel::None,
        1 => blosc::Clevel::L1,
        2 => blosc::Clevel::L2,
        3 => blosc::Clevel::L3,
        4 => blosc::Clevel::L4,
        5 => blosc::Clevel::L5,
        6 => blosc::Clevel::L6,
        7 => blosc::Clevel::L7,
        8 => blosc::Clevel::L8,
        _ => blosc::Clevel::L9,
    };
    blosc::Context::new()
        .clevel(clevel)
        .shuffle(blosc::ShuffleMode::Byte)
        .compressor(compressor)
        .map_err(|err| {
            BossError::new(
                format!(
                    "Blosc compressor {:?} is not available: {:?}",
                    config.blosc_compressor, err
                ),
                ErrorCode::SerializationError,
            )
        })
}

fn write_npy<A: WritableElement>(array: &CowArray<A, IxDyn>) -> Result<Vec<u8>, BossError> {
    let mut npy: Vec<u8> = Vec::new();
    array
        .write_npy(&mut npy)
        .map_err(|err| serialization_error("write npy", err))?;
    Ok(npy)
}

fn contiguous_slice<'a, A>(array: &'a CowArray<A, IxDyn>) -> Result<&'a [A], BossError> {
    array.as_slice().ok_or_else(|| {
        BossError::new(
            "Cutout data is not contiguous",
            ErrorCode::SerializationError,
        )
    })
}

fn serialization_error(action: &str, err: impl std::fmt::Display) -> BossError {
    BossError::new(
        format!("Failed to {}: {}", action, err),
        ErrorCode::SerializationError,
    )
}
