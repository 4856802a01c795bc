use std::ffi::{CStr, CString, c_int, c_uint, c_ulong, c_void};
use std::ptr::{NonNull, null};
use std::{error, fmt};

use anyhow::{Context as _, anyhow};
use raw_window_handle as rwh;

use crate::libx11 as xlib;

// NOTE: same idea as with egl: Connection owns the Display, everything that is created from it
// borrows it, so the borrow checker keeps teardown order honest (window before display).

// ----
// connection

#[derive(Debug)]
pub enum OpenConnectionError {
    CouldNotLoadLib(anyhow::Error),
    CouldNotOpenDisplay(Option<String>),
}

impl error::Error for OpenConnectionError {}

impl fmt::Display for OpenConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CouldNotLoadLib(err) => f.write_fmt(format_args!("could not load libX11: {err}")),
            Self::CouldNotOpenDisplay(Some(name)) => {
                f.write_fmt(format_args!("could not open display {name:?}"))
            }
            Self::CouldNotOpenDisplay(None) => f.write_str("could not open default display"),
        }
    }
}

pub struct Connection {
    pub lib: xlib::Lib,
    pub display: NonNull<xlib::Display>,
}

impl Drop for Connection {
    fn drop(&mut self) {
        log::debug!("closing x display");
        unsafe { (self.lib.XCloseDisplay)(self.display.as_ptr()) };
    }
}

impl Connection {
    /// `name` of `None` means "whatever DISPLAY env var says" (that is how XOpenDisplay treats
    /// NULL).
    pub fn open(name: Option<&CStr>) -> Result<Self, OpenConnectionError> {
        let lib = xlib::Lib::load().map_err(OpenConnectionError::CouldNotLoadLib)?;

        let display = unsafe { (lib.XOpenDisplay)(name.map_or(null(), CStr::as_ptr)) };
        let Some(display) = NonNull::new(display) else {
            return Err(OpenConnectionError::CouldNotOpenDisplay(
                name.map(|name| name.to_string_lossy().into_owned()),
            ));
        };

        Ok(Self { lib, display })
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut xlib::Display {
        self.display.as_ptr()
    }

    pub fn display_string(&self) -> String {
        let ptr = unsafe { (self.lib.XDisplayString)(self.as_ptr()) };
        if ptr.is_null() {
            return String::new();
        }
        unsafe { CStr::from_ptr(ptr) }
            .to_string_lossy()
            .into_owned()
    }

    pub fn default_screen(&self) -> c_int {
        unsafe { (self.lib.XDefaultScreen)(self.as_ptr()) }
    }

    pub fn default_root_window(&self) -> xlib::Window {
        unsafe { (self.lib.XDefaultRootWindow)(self.as_ptr()) }
    }

    pub fn intern_atom(&self, name: &CStr) -> xlib::Atom {
        unsafe { (self.lib.XInternAtom)(self.as_ptr(), name.as_ptr(), xlib::False) }
    }

    /// flushes the output buffer and waits until all requests have been processed by the server.
    pub fn sync(&self) {
        unsafe { (self.lib.XSync)(self.as_ptr(), xlib::False) };
    }

    /// number of events that were received but not yet removed from the queue. never blocks.
    pub fn pending(&self) -> usize {
        unsafe { (self.lib.XPending)(self.as_ptr()) }.max(0) as usize
    }

    /// blocks until there's an event.
    pub fn next_event(&self) -> xlib::XEvent {
        let mut event = xlib::XEvent::zeroed();
        unsafe { (self.lib.XNextEvent)(self.as_ptr(), &mut event) };
        event
    }

    pub fn visual_info(&self, visual_id: xlib::VisualID) -> anyhow::Result<VisualInfo<'_>> {
        let mut template = xlib::XVisualInfo {
            visual: std::ptr::null_mut(),
            visualid: visual_id,
            screen: 0,
            depth: 0,
            class: 0,
            red_mask: 0,
            green_mask: 0,
            blue_mask: 0,
            colormap_size: 0,
            bits_per_rgb: 0,
        };
        let mut num_visuals: c_int = 0;
        let ptr = unsafe {
            (self.lib.XGetVisualInfo)(
                self.as_ptr(),
                xlib::VisualIDMask,
                &mut template,
                &mut num_visuals,
            )
        };
        let info = NonNull::new(ptr)
            .with_context(|| format!("could not get x visual (id {visual_id:#x})"))?;
        Ok(VisualInfo { conn: self, info })
    }
}

impl rwh::HasDisplayHandle for Connection {
    fn display_handle(&self) -> Result<rwh::DisplayHandle<'_>, rwh::HandleError> {
        let raw = rwh::XlibDisplayHandle::new(
            Some(self.display.cast::<c_void>()),
            self.default_screen(),
        );
        Ok(unsafe { rwh::DisplayHandle::borrow_raw(raw.into()) })
    }
}

// ----
// visual

pub struct VisualInfo<'a> {
    conn: &'a Connection,
    info: NonNull<xlib::XVisualInfo>,
}

impl Drop for VisualInfo<'_> {
    fn drop(&mut self) {
        unsafe { (self.conn.lib.XFree)(self.info.as_ptr().cast()) };
    }
}

impl VisualInfo<'_> {
    #[inline]
    fn get(&self) -> &xlib::XVisualInfo {
        unsafe { self.info.as_ref() }
    }

    pub fn id(&self) -> xlib::VisualID {
        self.get().visualid
    }

    pub fn depth(&self) -> c_int {
        self.get().depth
    }

    pub fn visual(&self) -> *mut xlib::Visual {
        self.get().visual
    }
}

// ----
// window

#[derive(Debug, Clone)]
pub struct WindowAttrs {
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// min size == max size, window managers that respect hints won't let the user resize it.
    pub resizable: bool,
}

/// what the app cares about; everything else is [`Event::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// window manager's close button (WM_DELETE_WINDOW client message).
    CloseRequested,
    KeyPress { keycode: c_uint },
    Mapped,
    Other(c_int),
}

impl Event {
    pub fn classify(event: &xlib::XEvent, wm_delete_window: xlib::Atom) -> Self {
        match event.get_type() {
            xlib::ClientMessage => {
                let client_message = unsafe { event.client_message };
                if client_message.data[0] as xlib::Atom == wm_delete_window {
                    Self::CloseRequested
                } else {
                    Self::Other(xlib::ClientMessage)
                }
            }
            xlib::KeyPress => Self::KeyPress {
                keycode: unsafe { event.key.keycode },
            },
            xlib::MapNotify => Self::Mapped,
            other => Self::Other(other),
        }
    }
}

pub struct Window<'a> {
    conn: &'a Connection,
    pub window: xlib::Window,
    pub colormap: xlib::Colormap,
    pub visual_id: xlib::VisualID,
    pub wm_delete_window: xlib::Atom,
}

impl Drop for Window<'_> {
    fn drop(&mut self) {
        log::debug!("destroying x window {:#x}", self.window);
        unsafe {
            (self.conn.lib.XDestroyWindow)(self.conn.as_ptr(), self.window);
            (self.conn.lib.XFreeColormap)(self.conn.as_ptr(), self.colormap);
        }
    }
}

impl<'a> Window<'a> {
    /// creates and maps the window. the visual must come from the same connection.
    ///
    /// NOTE: the window is not guaranteed to be visible when this returns, see
    /// [`Window::wait_until_mapped`].
    pub fn create(
        conn: &'a Connection,
        visual: &VisualInfo<'_>,
        attrs: &WindowAttrs,
    ) -> anyhow::Result<Self> {
        let title = CString::new(attrs.title.as_str()).context("invalid window title")?;
        let root = conn.default_root_window();

        let colormap = unsafe {
            (conn.lib.XCreateColormap)(conn.as_ptr(), root, visual.visual(), xlib::AllocNone)
        };

        let mut window_attrs: xlib::XSetWindowAttributes = unsafe { std::mem::zeroed() };
        window_attrs.background_pixel = 0;
        window_attrs.border_pixel = 0;
        window_attrs.colormap = colormap;
        window_attrs.event_mask =
            xlib::ExposureMask | xlib::StructureNotifyMask | xlib::KeyPressMask;
        let value_mask: c_ulong =
            xlib::CWBackPixel | xlib::CWBorderPixel | xlib::CWColormap | xlib::CWEventMask;

        let window = unsafe {
            (conn.lib.XCreateWindow)(
                conn.as_ptr(),
                root,
                0,
                0,
                attrs.width,
                attrs.height,
                0,
                visual.depth(),
                xlib::InputOutput,
                visual.visual(),
                value_mask,
                &mut window_attrs,
            )
        };
        // NOTE: xlib allocates the id on the client side, a failed XCreateWindow shows up later
        // as an asynchronous protocol error (reported by the x error handler), not as 0 here.

        // NOTE: from here on Drop takes care of both the window and the colormap.
        let mut this = Self {
            conn,
            window,
            colormap,
            visual_id: visual.id(),
            wm_delete_window: 0,
        };

        if !attrs.resizable {
            let mut size_hints = size_hints_fixed(attrs.width, attrs.height);
            unsafe { (conn.lib.XSetWMNormalHints)(conn.as_ptr(), window, &mut size_hints) };
        }

        this.wm_delete_window = conn.intern_atom(c"WM_DELETE_WINDOW");
        let ok = unsafe {
            (conn.lib.XSetWMProtocols)(conn.as_ptr(), window, &mut this.wm_delete_window, 1)
        };
        if ok == 0 {
            return Err(anyhow!("could not set WM_DELETE_WINDOW protocol"));
        }

        unsafe {
            (conn.lib.XMapWindow)(conn.as_ptr(), window);
            (conn.lib.XStoreName)(conn.as_ptr(), window, title.as_ptr());
        }

        Ok(this)
    }

    /// blocks until MapNotify is received. events that arrive before it are dropped.
    pub fn wait_until_mapped(&self) {
        loop {
            let event = self.conn.next_event();
            match Event::classify(&event, self.wm_delete_window) {
                Event::Mapped => break,
                other => log::trace!("skipping {other:?} while waiting for map"),
            }
        }
    }

    /// returns the next queued event without blocking.
    pub fn poll_event(&self) -> Option<Event> {
        if self.conn.pending() == 0 {
            return None;
        }
        let event = self.conn.next_event();
        Some(Event::classify(&event, self.wm_delete_window))
    }
}

impl rwh::HasWindowHandle for Window<'_> {
    fn window_handle(&self) -> Result<rwh::WindowHandle<'_>, rwh::HandleError> {
        let mut raw = rwh::XlibWindowHandle::new(self.window);
        raw.visual_id = self.visual_id;
        Ok(unsafe { rwh::WindowHandle::borrow_raw(raw.into()) })
    }
}

impl rwh::HasDisplayHandle for Window<'_> {
    fn display_handle(&self) -> Result<rwh::DisplayHandle<'_>, rwh::HandleError> {
        self.conn.display_handle()
    }
}

fn size_hints_fixed(width: u32, height: u32) -> xlib::XSizeHints {
    let (width, height) = (width as c_int, height as c_int);
    xlib::XSizeHints {
        flags: xlib::PMinSize | xlib::PMaxSize,
        min_width: width,
        min_height: height,
        max_width: width,
        max_height: height,
        ..xlib::XSizeHints::default()
    }
}
