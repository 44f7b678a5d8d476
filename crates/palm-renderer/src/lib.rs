//! Skinned model renderer.
//!
//! A [`RenderSession`] is loaded once from an asset source, then a
//! [`FrameDriver`] poses the skeleton and draws it on every callback the
//! host schedules. GPU work goes through [`backend::GraphicsBackend`], so
//! the same session runs on wgpu or on the recording backend in tests.
pub mod animation;
pub mod backend;
pub mod bounds;
pub mod config;
pub mod error;
pub mod frame;
pub mod renderer;
pub mod session;

pub use palm_asset;

pub use config::SessionConfig;
pub use error::RenderError;
pub use frame::{FrameDriver, FrameOutcome, FrameScheduler};
pub use session::{Lifecycle, RenderSession};

use wgpu::{
    rwh::{HasDisplayHandle, HasWindowHandle},
    WasmNotSendSync,
};

/// A window the wgpu backend can present to.
pub trait RenderTarget: HasWindowHandle + HasDisplayHandle + WasmNotSendSync + 'static {
    /// Physical size in pixels.
    fn inner_size(&self) -> (u32, u32);
    fn pre_present_notify(&self);
}
