/*!
    Window creation, presentation and event polling.
*/

use std::num::NonZeroU32;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use easy_ffmpeg_types::{Error, PlanarImage, Result};

use crate::config::DisplayConfig;
use crate::texture::Texture;

/// Pumps allowed for the platform to deliver the first `resumed` event.
const STARTUP_PUMPS: usize = 100;

/**
    Outcome of [`RenderSink::poll_events`].
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Poll {
    Continue,
    /// The window was closed or Escape was pressed.
    Quit,
}

/// Fields are dropped in declaration order: surface, context, window.
struct App {
    config: DisplayConfig,
    surface: Option<softbuffer::Surface<Rc<Window>, Rc<Window>>>,
    context: Option<softbuffer::Context<Rc<Window>>>,
    window: Option<Rc<Window>>,
    quit: bool,
    error: Option<String>,
}

impl App {
    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> std::result::Result<(), String> {
        let attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));

        let window = Rc::new(
            event_loop
                .create_window(attrs)
                .map_err(|e| format!("cannot create window: {e}"))?,
        );
        let context =
            softbuffer::Context::new(window.clone()).map_err(|e| format!("cannot create display context: {e}"))?;
        let surface = softbuffer::Surface::new(&context, window.clone())
            .map_err(|e| format!("cannot create window surface: {e}"))?;

        self.surface = Some(surface);
        self.context = Some(context);
        self.window = Some(window);
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_window(event_loop) {
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                debug!("window close requested");
                self.quit = true;
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && event.logical_key == Key::Named(NamedKey::Escape) =>
            {
                debug!("escape pressed");
                self.quit = true;
                event_loop.exit();
            }
            _ => {}
        }
    }
}

/**
    A window that decoded images are drawn into.

    The streaming texture is created from the first rendered image and keeps
    that size. Dropping the sink closes the window.
*/
pub struct RenderSink {
    texture: Option<Texture>,
    app: App,
    event_loop: EventLoop<()>,
}

impl RenderSink {
    /**
        Open a window titled and sized per `config`.

        Fails with `Render` when there is no display or the window cannot be
        created.
    */
    pub fn new(config: DisplayConfig) -> Result<Self> {
        let mut event_loop = EventLoop::new().map_err(|e| Error::render(format!("cannot create event loop: {e}")))?;

        let mut app = App {
            config,
            surface: None,
            context: None,
            window: None,
            quit: false,
            error: None,
        };

        for _ in 0..STARTUP_PUMPS {
            let status = event_loop.pump_app_events(Some(Duration::ZERO), &mut app);
            if let Some(e) = app.error.take() {
                return Err(Error::render(e));
            }
            if app.window.is_some() {
                break;
            }
            if let PumpStatus::Exit(code) = status {
                return Err(Error::render(format!("event loop exited with code {code}")));
            }
        }

        if app.window.is_none() {
            return Err(Error::render("window was not created"));
        }

        info!(
            title = %app.config.title,
            width = app.config.width,
            height = app.config.height,
            "opened window"
        );

        Ok(Self {
            texture: None,
            app,
            event_loop,
        })
    }

    /**
        The streaming texture, once the first image has been rendered.
    */
    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    /**
        Upload `image`, draw it over the whole window, present it and then
        sleep for `delay`.

        The first image fixes the texture size; later images of a different
        size fail with `InvalidData`.
    */
    pub fn render(&mut self, image: &PlanarImage<'_>, delay: Duration) -> Result<()> {
        let texture = match self.texture.take() {
            Some(texture) => texture,
            None => {
                debug!(width = image.width(), height = image.height(), "creating texture");
                Texture::new(image.width(), image.height())?
            }
        };
        let texture = self.texture.insert(texture);
        texture.upload(image)?;

        let (Some(window), Some(surface)) = (&self.app.window, &mut self.app.surface) else {
            return Err(Error::render("window is closed"));
        };

        let size = window.inner_size();
        if let (Some(width), Some(height)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
            surface
                .resize(width, height)
                .map_err(|e| Error::render(format!("cannot resize surface: {e}")))?;

            let mut buffer = surface
                .buffer_mut()
                .map_err(|e| Error::render(format!("cannot map surface: {e}")))?;
            texture.blit(&mut buffer, size.width as usize, size.height as usize);
            buffer
                .present()
                .map_err(|e| Error::render(format!("cannot present frame: {e}")))?;
        }

        if !delay.is_zero() {
            thread::sleep(delay);
        }
        Ok(())
    }

    /**
        Process pending window events without blocking.
    */
    pub fn poll_events(&mut self) -> Poll {
        let status = self.event_loop.pump_app_events(Some(Duration::ZERO), &mut self.app);
        if self.app.quit || matches!(status, PumpStatus::Exit(_)) {
            Poll::Quit
        } else {
            Poll::Continue
        }
    }
}

impl std::fmt::Debug for RenderSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSink")
            .field("config", &self.app.config)
            .field("texture", &self.texture.as_ref().map(|t| (t.width(), t.height())))
            .finish_non_exhaustive()
    }
}
