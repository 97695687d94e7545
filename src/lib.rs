pub mod config;
pub mod error;
pub mod recorder;
pub mod renderers;
pub mod response;
pub mod volume;

pub use config::EncoderConfig;
pub use error::{BossError, ErrorCode};
pub use renderers::{render, EncodedPayload, Format};
pub use response::CutoutResponse;
pub use volume::{CutoutRequest, Volume};
