use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use palm_asset::AssetError;

#[derive(Debug)]
pub enum RenderError {
    MalformedAsset(AssetError),
    BackendUnavailable(String),
    FrameWriteFailure(Box<dyn Error + Send + Sync>),
    BoneCountMismatch { expected: usize, actual: usize },
    AssetSource(Box<dyn Error + Send + Sync>),
    Detached,
}

impl Display for RenderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::MalformedAsset(error) => write!(f, "Malformed asset: {}", error),
            RenderError::BackendUnavailable(reason) => {
                write!(f, "Graphics backend unavailable: {}", reason)
            }
            RenderError::FrameWriteFailure(error) => write!(f, "Frame write failed: {}", error),
            RenderError::BoneCountMismatch { expected, actual } => write!(
                f,
                "Expected {} bone matrices, but got {}",
                expected, actual
            ),
            RenderError::AssetSource(error) => write!(f, "Asset source failed: {}", error),
            RenderError::Detached => write!(f, "Session was detached"),
        }
    }
}

impl Error for RenderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RenderError::MalformedAsset(error) => Some(error),
            RenderError::FrameWriteFailure(error) => Some(error.as_ref()),
            RenderError::AssetSource(error) => Some(error.as_ref()),
            _ => None,
        }
    }
}

impl From<AssetError> for RenderError {
    fn from(error: AssetError) -> Self {
        RenderError::MalformedAsset(error)
    }
}

impl RenderError {
    pub(crate) fn frame_write(error: impl Error + Send + Sync + 'static) -> Self {
        RenderError::FrameWriteFailure(Box::new(error))
    }

    pub(crate) fn backend(error: impl Display) -> Self {
        RenderError::BackendUnavailable(error.to_string())
    }

    /// Errors that only cost one frame. A bone count mismatch repeats on
    /// every frame, so it is not one of them.
    pub fn is_transient(&self) -> bool {
        matches!(self, RenderError::FrameWriteFailure(_))
    }
}
