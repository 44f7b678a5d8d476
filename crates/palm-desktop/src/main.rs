use std::{
    env,
    path::PathBuf,
    sync::Arc,
    time::Instant,
};

use log::{debug, error, info};
use palm_renderer::{
    backend::surface::WgpuBackend,
    palm_asset::source::DirectorySource,
    FrameDriver, FrameScheduler, Lifecycle, RenderError, RenderSession, RenderTarget,
    SessionConfig,
};
use pollster::FutureExt;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    error::EventLoopError,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    raw_window_handle::{
        DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
    },
    window::{Window, WindowAttributes, WindowId},
};

const WINDOW_SIZE: u32 = 760;
const DEFAULT_ASSET_DIR: &str = "assets";

struct WindowRenderTarget {
    window: Window,
}

impl HasWindowHandle for WindowRenderTarget {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        self.window.window_handle()
    }
}

impl HasDisplayHandle for WindowRenderTarget {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        self.window.display_handle()
    }
}

impl RenderTarget for WindowRenderTarget {
    fn inner_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn pre_present_notify(&self) {
        self.window.pre_present_notify();
    }
}

impl FrameScheduler for WindowRenderTarget {
    fn request_frame(&self) {
        self.window.request_redraw();
    }
}

type Backend = WgpuBackend<WindowRenderTarget>;

struct State {
    backend: Backend,
    session: RenderSession<Backend>,
    driver: FrameDriver,
    lifecycle: Lifecycle,
}

impl State {
    async fn new(
        target: Arc<WindowRenderTarget>,
        source: &DirectorySource,
        config: &SessionConfig,
    ) -> Result<Self, RenderError> {
        let mut backend = WgpuBackend::new(target).await?;
        let lifecycle = Lifecycle::new();
        let session =
            RenderSession::load(source, &mut backend, config, lifecycle.clone()).await?;
        Ok(Self {
            backend,
            session,
            driver: FrameDriver::new(config.max_consecutive_failures),
            lifecycle,
        })
    }

    fn render(&mut self, timestamp_millis: f64) -> Result<(), RenderError> {
        let target = self.backend.target().clone();
        self.driver
            .on_frame(
                &mut self.session,
                &mut self.backend,
                target.as_ref(),
                timestamp_millis,
            )
            .map(|_| ())
    }

    fn resize(&mut self, size: (u32, u32)) {
        self.backend.resize(size);
    }
}

impl Drop for State {
    fn drop(&mut self) {
        self.lifecycle.detach();
    }
}

struct App {
    source: DirectorySource,
    config: SessionConfig,
    window: Option<Arc<WindowRenderTarget>>,
    state: Option<State>,
    start_time: Instant,
}

impl App {
    fn new(asset_dir: PathBuf) -> Self {
        Self {
            source: DirectorySource::new(asset_dir),
            config: SessionConfig::default(),
            window: None,
            state: None,
            start_time: Instant::now(),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window = match &self.window {
            Some(window) => window.clone(),
            None => {
                let attributes = WindowAttributes::default()
                    .with_title("Palm")
                    .with_inner_size(LogicalSize::new(WINDOW_SIZE, WINDOW_SIZE))
                    .with_transparent(true);
                match event_loop.create_window(attributes) {
                    Ok(window) => self
                        .window
                        .insert(Arc::new(WindowRenderTarget { window }))
                        .clone(),
                    Err(err) => {
                        error!("Failed to create window: {}", err);
                        event_loop.exit();
                        return;
                    }
                }
            }
        };
        if self.state.is_none() {
            match State::new(window.clone(), &self.source, &self.config).block_on() {
                Ok(state) => {
                    info!("Session ready, animation lasts {:.3}s", state.session.duration());
                    self.state = Some(state);
                    window.request_frame();
                }
                Err(err) => {
                    error!("Failed to start: {}", err);
                    event_loop.exit();
                }
            }
        }
    }

    fn suspended(&mut self, _: &ActiveEventLoop) {
        debug!("Suspended, dropping the session");
        self.state = None;
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        match event {
            WindowEvent::CloseRequested => {
                self.state = None;
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let timestamp_millis = self.start_time.elapsed().as_secs_f64() * 1000.0;
                if let Err(err) = state.render(timestamp_millis) {
                    error!("Rendering stopped: {}", err);
                    self.state = None;
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(physical_size) => {
                state.resize((physical_size.width, physical_size.height));
                if let Some(window) = &self.window {
                    window.request_frame();
                }
            }
            _ => (),
        }
    }
}

fn main() -> Result<(), EventLoopError> {
    env_logger::init();
    let asset_dir = env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSET_DIR));
    info!("Loading assets from {}", asset_dir.display());

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);
    let mut app = App::new(asset_dir);
    event_loop.run_app(&mut app)
}
