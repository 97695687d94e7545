/// Volume module.
///
/// A `Volume` is the cutout array handed over by the storage layer, tagged
/// with its element type.  `prepare()` is the step every renderer runs
/// first: make the data contiguous and drop the time axis if the request
/// didn't ask for one.
use crate::error::{BossError, ErrorCode};
use ndarray::{Array, ArrayD, Axis, CowArray, Dimension, IxDyn};


/// Bit depths a channel may have.
pub const BIT_DEPTHS: [u8; 4] = [8, 16, 32, 64];

/// A rank 3 (z, y, x) or rank 4 (t, z, y, x) cutout.
#[derive(Clone, Debug, PartialEq)]
pub enum Volume {
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
    U32(ArrayD<u32>),
    U64(ArrayD<u64>),
}

/// Run `$body` with `$array` bound to the inner array of any `Volume`.
macro_rules! for_each_volume {
    ($volume:expr, $array:ident => $body:expr) => {
        match $volume {
            $crate::volume::Volume::U8($array) => $body,
            $crate::volume::Volume::U16($array) => $body,
            $crate::volume::Volume::U32($array) => $body,
            $crate::volume::Volume::U64($array) => $body,
        }
    };
}
pub(crate) use for_each_volume;

macro_rules! impl_from_array {
    ($elem:ty, $variant:ident) => {
        impl<D: Dimension> From<Array<$elem, D>> for Volume {
            fn from(array: Array<$elem, D>) -> Volume {
                Volume::$variant(array.into_dyn())
            }
        }
    };
}

impl_from_array!(u8, U8);
impl_from_array!(u16, U16);
impl_from_array!(u32, U32);
impl_from_array!(u64, U64);

impl Volume {
    /// Bits per element.
    pub fn bit_depth(&self) -> u8 {
        match self {
            Volume::U8(_) => 8,
            Volume::U16(_) => 16,
            Volume::U32(_) => 32,
            Volume::U64(_) => 64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        for_each_volume!(self, array => array.shape())
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// True if the elements are laid out row-major with no gaps.
    pub fn is_standard_layout(&self) -> bool {
        for_each_volume!(self, array => array.is_standard_layout())
    }

    /// The elements in logical (row-major) order as native-endian bytes,
    /// whatever the memory layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let len: usize = self.shape().iter().product();
        let mut bytes = Vec::with_capacity(len * usize::from(self.bit_depth() / 8));
        for_each_volume!(self, array => {
            for value in array.iter() {
                bytes.extend_from_slice(&value.to_ne_bytes());
            }
        });
        bytes
    }

    /// Check the request metadata against this volume.
    pub fn validate(&self, request: &CutoutRequest) -> Result<(), BossError> {
        if !BIT_DEPTHS.contains(&request.bit_depth) {
            return Err(BossError::new(
                format!("Unsupported bit depth: {}", request.bit_depth),
                ErrorCode::InvalidCutoutArgs,
            ));
        }
        if request.bit_depth != self.bit_depth() {
            return Err(BossError::new(
                format!(
                    "Channel bit depth is {} but the cutout data is {}-bit",
                    request.bit_depth,
                    self.bit_depth()
                ),
                ErrorCode::TypeError,
            ));
        }
        Ok(())
    }
}

/// What the caller knows about the cutout besides the data itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CutoutRequest {
    /// Did the user ask for a time range?
    pub has_time: bool,
    /// Bits per element of the channel; one of `BIT_DEPTHS`.
    pub bit_depth: u8,
}

impl CutoutRequest {
    pub fn new(has_time: bool, bit_depth: u8) -> CutoutRequest {
        CutoutRequest { has_time, bit_depth }
    }

    /// Bytes per element, the type-size hint handed to blosc.
    pub fn type_size(&self) -> usize {
        usize::from(self.bit_depth / 8)
    }
}

/// Get the array into the shape and layout the encoders expect.
///
/// The result borrows `array` when it's already contiguous; otherwise it
/// owns a contiguous copy.  The caller's array is never modified.
///
/// # Arguments
///
/// * `array` - The cutout, rank 3 or 4
/// * `request` - Whether the time axis should be kept
///
/// # Returns
///
/// * The array with the time axis removed unless `request.has_time`
///
pub fn prepare<'a, A: Clone>(
    array: &'a ArrayD<A>,
    request: &CutoutRequest,
) -> Result<CowArray<'a, A, IxDyn>, BossError> {
    let shape = array.shape();
    match (request.has_time, shape.len()) {
        (true, 4) | (false, 3) => Ok(array.as_standard_layout()),
        (false, 4) => {
            if shape[0] != 1 {
                return Err(BossError::new(
                    format!(
                        "Expected a single time sample without a time range, got {}",
                        shape[0]
                    ),
                    ErrorCode::InvalidCutoutArgs,
                ));
            }
            Ok(array.as_standard_layout().index_axis_move(Axis(0), 0))
        }
        (true, _) => Err(BossError::new(
            format!("Time series cutouts must be 4D, got {}D", shape.len()),
            ErrorCode::InvalidCutoutArgs,
        )),
        (false, _) => Err(BossError::new(
            format!("Cutouts must be 3D or 4D, got {}D", shape.len()),
            ErrorCode::InvalidCutoutArgs,
        )),
    }
}
