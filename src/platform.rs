use anyhow::Context as _;
use gl::Adapter as _;
use raw_window_handle::{HasDisplayHandle as _, HasWindowHandle as _};
use x11::wrap::{Event, WindowAttrs};

/// everything [`crate::app::run`] acquires from the windowing system and egl.
///
/// each resource borrows what it was created from, so the order in which the caller
/// declares them is the order in which they are released (reversed).
pub trait Platform {
    type Display;
    type Egl<'a>
    where
        Self: 'a;
    type Config: Copy;
    type Window<'a>
    where
        Self: 'a;
    type Surface<'a>
    where
        Self: 'a;
    type Context<'a>
    where
        Self: 'a;
    type Gl: gl::Adapter;

    fn open_display(&self) -> anyhow::Result<Self::Display>;
    fn connect<'a>(&'a self, display: &'a Self::Display) -> anyhow::Result<Self::Egl<'a>>;
    fn choose_config(
        &self,
        egl: &Self::Egl<'_>,
        attribs: &[egl::EGLint],
    ) -> anyhow::Result<Self::Config>;
    /// creates the window with the visual of `config` and waits until it is mapped.
    fn create_window<'a>(
        &'a self,
        display: &'a Self::Display,
        egl: &Self::Egl<'_>,
        config: Self::Config,
        attrs: &WindowAttrs,
    ) -> anyhow::Result<Self::Window<'a>>;
    fn create_surface<'a>(
        &'a self,
        egl: &'a Self::Egl<'_>,
        window: &'a Self::Window<'_>,
        config: Self::Config,
    ) -> anyhow::Result<Self::Surface<'a>>;
    fn create_context<'a>(
        &'a self,
        egl: &'a Self::Egl<'_>,
        config: Self::Config,
        attribs: &[egl::EGLint],
    ) -> anyhow::Result<Self::Context<'a>>;
    fn make_current(
        &self,
        egl: &Self::Egl<'_>,
        surface: &Self::Surface<'_>,
        context: &Self::Context<'_>,
    ) -> anyhow::Result<()>;
    fn release_current(&self, egl: &Self::Egl<'_>);
    /// requires a current context.
    fn load_gl(&self, egl: &Self::Egl<'_>) -> anyhow::Result<Self::Gl>;
    /// never blocks.
    fn poll_event(&self, window: &Self::Window<'_>) -> Option<Event>;
    fn swap_buffers(&self, egl: &Self::Egl<'_>, surface: &Self::Surface<'_>)
    -> anyhow::Result<()>;
}

/// xlib window, egl display on top of the same x connection, gles2 loaded through egl.
pub struct X11Egl;

fn log_egl_info(egl_connection: &egl::wrap::Connection) {
    let (major, minor) = egl_connection.version;
    log::info!("egl version {major}.{minor}");
    for (label, name) in [
        ("vendor", egl::VENDOR),
        ("version string", egl::VERSION),
        ("extensions", egl::EXTENSIONS),
        ("client apis", egl::CLIENT_APIS),
    ] {
        match egl_connection.query_string(name) {
            Some(value) => log::info!("egl {label}: {value}"),
            None => log::warn!("could not query egl {label}"),
        }
    }
}

fn log_gl_info(gl_api: &gl::Api) {
    for (label, name) in [
        ("version", gl::VERSION),
        ("vendor", gl::VENDOR),
        ("renderer", gl::RENDERER),
    ] {
        match unsafe { gl_api.get_string(name) } {
            Ok(value) => log::info!("gl {label}: {value}"),
            Err(err) => log::warn!("could not query gl {label}: {err}"),
        }
    }
}

impl Platform for X11Egl {
    type Display = x11::wrap::Connection;
    type Egl<'a> = egl::wrap::Connection<'a>;
    type Config = egl::EGLConfig;
    type Window<'a> = x11::wrap::Window<'a>;
    type Surface<'a> = egl::wrap::Surface<'a>;
    type Context<'a> = egl::wrap::Context<'a>;
    type Gl = gl::Api;

    fn open_display(&self) -> anyhow::Result<x11::wrap::Connection> {
        let x_connection =
            x11::wrap::Connection::open(None).context("could not open x display")?;
        log::info!("opened x display {}", x_connection.display_string());
        Ok(x_connection)
    }

    fn connect<'a>(
        &'a self,
        display: &'a x11::wrap::Connection,
    ) -> anyhow::Result<egl::wrap::Connection<'a>> {
        let egl_connection = egl::wrap::Connection::from_display_handle(display.display_handle()?)
            .context("could not create egl connection")?;
        log_egl_info(&egl_connection);
        Ok(egl_connection)
    }

    fn choose_config(
        &self,
        egl: &egl::wrap::Connection<'_>,
        attribs: &[egl::EGLint],
    ) -> anyhow::Result<egl::EGLConfig> {
        let (config, num_configs) = egl
            .choose_config(attribs)
            .context("could not choose egl config")?;
        log::info!("egl reported {num_configs} matching config(s)");
        Ok(config)
    }

    fn create_window<'a>(
        &'a self,
        display: &'a x11::wrap::Connection,
        egl: &egl::wrap::Connection<'_>,
        config: egl::EGLConfig,
        attrs: &WindowAttrs,
    ) -> anyhow::Result<x11::wrap::Window<'a>> {
        let native_visual_id = egl
            .config_attrib(config, egl::NATIVE_VISUAL_ID)
            .context("could not get native visual id of egl config")?;
        log::info!("native visual id {native_visual_id:#x}");

        let window = {
            let visual = display
                .visual_info(native_visual_id as x11::VisualID)
                .context("could not get x visual info")?;
            log::debug!("visual depth {}", visual.depth());
            x11::wrap::Window::create(display, &visual, attrs).context("could not create window")?
        };
        window.wait_until_mapped();
        display.sync();
        log::info!("window mapped");
        Ok(window)
    }

    fn create_surface<'a>(
        &'a self,
        egl: &'a egl::wrap::Connection<'_>,
        window: &'a x11::wrap::Window<'_>,
        config: egl::EGLConfig,
    ) -> anyhow::Result<egl::wrap::Surface<'a>> {
        egl.create_window_surface(config, window.window_handle()?)
            .context("could not create egl surface")
    }

    fn create_context<'a>(
        &'a self,
        egl: &'a egl::wrap::Connection<'_>,
        config: egl::EGLConfig,
        attribs: &[egl::EGLint],
    ) -> anyhow::Result<egl::wrap::Context<'a>> {
        egl.create_context(config, attribs)
            .context("could not create egl context")
    }

    fn make_current(
        &self,
        egl: &egl::wrap::Connection<'_>,
        surface: &egl::wrap::Surface<'_>,
        context: &egl::wrap::Context<'_>,
    ) -> anyhow::Result<()> {
        egl.make_current(surface, context)
            .context("could not make egl context current")
    }

    fn release_current(&self, egl: &egl::wrap::Connection<'_>) {
        log::debug!("releasing current egl context");
        egl.release_current();
    }

    fn load_gl(&self, egl: &egl::wrap::Connection<'_>) -> anyhow::Result<gl::Api> {
        let gl_api = unsafe { gl::Api::load(|name| egl.get_proc_address(name)) }
            .context("could not load gl")?;
        log_gl_info(&gl_api);
        Ok(gl_api)
    }

    fn poll_event(&self, window: &x11::wrap::Window<'_>) -> Option<Event> {
        window.poll_event()
    }

    fn swap_buffers(
        &self,
        egl: &egl::wrap::Connection<'_>,
        surface: &egl::wrap::Surface<'_>,
    ) -> anyhow::Result<()> {
        Ok(egl.swap_buffers(surface)?)
    }
}
