use std::ffi::{CStr, c_void};
use std::marker::PhantomData;
use std::ptr::{NonNull, null};
use std::{error, fmt, ops};

use raw_window_handle as rwh;

use crate::libegl::*;

// NOTE: the idea here is that Connection hands out handles to resources that it creates; those
// handles borrow the Connection, so they can't outlive the display they were created on and the
// borrow checker takes care of teardown order.

/// checks that an attribute list is made of key-value pairs and is terminated with NONE.
pub fn is_terminated(attribs: &[EGLint]) -> bool {
    attribs.len() % 2 == 1 && attribs.last() == Some(&NONE)
}

// ----
// error

/// eglGetError code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EglError(pub EGLint);

impl error::Error for EglError {}

impl fmt::Display for EglError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{} ({:#x})", error_name(self.0), self.0))
    }
}

impl EglError {
    pub fn last(lib: &Lib) -> Self {
        Self(unsafe { (lib.eglGetError)() })
    }
}

// ----
// display

/// ways of getting an EGLDisplay, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStrategy {
    /// eglGetDisplay(EGL_DEFAULT_DISPLAY)
    Default,
    /// eglGetDisplay(x display)
    /// > the set of platforms to which display_id is permitted to belong, as well as the actual
    /// type of display_id, are implementation-specific.
    /// - https://registry.khronos.org/EGL/sdk/docs/man/html/eglGetDisplay.xhtml
    Native,
    /// eglGetPlatformDisplayEXT(EGL_PLATFORM_X11_EXT, x display)
    /// - https://registry.khronos.org/EGL/extensions/EXT/EGL_EXT_platform_base.txt
    PlatformExt,
}

/// the part of libEGL that display strategies talk to.
pub trait DisplaySource {
    fn get_display(&self, display_id: EGLNativeDisplayType) -> EGLDisplay;
    /// `None` when EGL_EXT_platform_base is not available.
    fn get_platform_display_ext(
        &self,
        platform: EGLenum,
        native_display: *mut c_void,
    ) -> Option<EGLDisplay>;
    fn last_error(&self) -> EglError;
}

impl DisplaySource for Lib {
    fn get_display(&self, display_id: EGLNativeDisplayType) -> EGLDisplay {
        unsafe { (self.eglGetDisplay)(display_id) }
    }

    fn get_platform_display_ext(
        &self,
        platform: EGLenum,
        native_display: *mut c_void,
    ) -> Option<EGLDisplay> {
        let get_platform_display_ext = Lib::get_platform_display_ext(self)?;
        Some(unsafe { get_platform_display_ext(platform, native_display, null()) })
    }

    fn last_error(&self) -> EglError {
        EglError::last(self)
    }
}

impl DisplayStrategy {
    pub const ALL: [Self; 3] = [Self::Default, Self::Native, Self::PlatformExt];

    pub fn attempt(
        self,
        source: &impl DisplaySource,
        native: Option<NonNull<c_void>>,
    ) -> Result<EGLDisplay, String> {
        let ret = match self {
            Self::Default => source.get_display(DEFAULT_DISPLAY),
            Self::Native => {
                let native = native.ok_or("native display is unavailable")?;
                source.get_display(native.as_ptr())
            }
            Self::PlatformExt => {
                let native = native.ok_or("native display is unavailable")?;
                source
                    .get_platform_display_ext(PLATFORM_X11_EXT, native.as_ptr())
                    .ok_or("eglGetPlatformDisplayEXT is unavailable")?
            }
        };
        if ret != NO_DISPLAY {
            return Ok(ret);
        }
        match source.last_error() {
            EglError(SUCCESS) => Err("got EGL_NO_DISPLAY".to_string()),
            err => Err(format!("got EGL_NO_DISPLAY: {err}")),
        }
    }
}

impl fmt::Display for DisplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default display"),
            Self::Native => f.write_str("native display"),
            Self::PlatformExt => f.write_str("platform display (EGL_EXT_platform_base)"),
        }
    }
}

/// runs `attempt` for each of the strategies until one succeeds. if none does - returns what
/// each of them had to say.
pub fn try_in_order<S: Copy, T>(
    strategies: &[S],
    mut attempt: impl FnMut(S) -> Result<T, String>,
) -> Result<(S, T), Vec<(S, String)>> {
    let mut failures = Vec::with_capacity(strategies.len());
    for &strategy in strategies {
        match attempt(strategy) {
            Ok(ret) => return Ok((strategy, ret)),
            Err(reason) => failures.push((strategy, reason)),
        }
    }
    Err(failures)
}

#[derive(Debug)]
pub struct GetDisplayError {
    pub attempts: Vec<(DisplayStrategy, String)>,
}

impl error::Error for GetDisplayError {}

impl fmt::Display for GetDisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("could not get display using any of the methods")?;
        for (strategy, reason) in self.attempts.iter() {
            f.write_fmt(format_args!("; {strategy}: {reason}"))?;
        }
        Ok(())
    }
}

pub struct Display {
    pub strategy: DisplayStrategy,
    pub handle: EGLDisplay,
}

impl ops::Deref for Display {
    type Target = EGLDisplay;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl Display {
    fn get(lib: &Lib, native: Option<NonNull<c_void>>) -> Result<Self, GetDisplayError> {
        try_in_order(&DisplayStrategy::ALL, |strategy| {
            strategy.attempt(lib, native).inspect_err(|reason| {
                log::warn!("could not get egl {strategy}: {reason}, trying next method");
            })
        })
        .map(|(strategy, handle)| Self { strategy, handle })
        .map_err(|attempts| GetDisplayError { attempts })
    }
}

// ----
// config

#[derive(Debug)]
pub enum ChooseConfigError {
    CouldNotChooseConfig(EglError),
    NoMatchingConfig,
}

impl error::Error for ChooseConfigError {}

impl fmt::Display for ChooseConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CouldNotChooseConfig(err) => {
                f.write_fmt(format_args!("could not choose config: {err}"))
            }
            Self::NoMatchingConfig => f.write_str("no config matches requested attributes"),
        }
    }
}

// ----
// context

#[derive(Debug)]
pub enum CreateContextError {
    CouldNotBindApi(EglError),
    CouldNotCreateContext(EglError),
}

impl error::Error for CreateContextError {}

impl fmt::Display for CreateContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CouldNotBindApi(err) => f.write_fmt(format_args!("could not bind api: {err}")),
            Self::CouldNotCreateContext(err) => {
                f.write_fmt(format_args!("could not create context: {err}"))
            }
        }
    }
}

pub struct Context<'a> {
    lib: &'a Lib,
    display: EGLDisplay,
    pub context: EGLContext,
    pub config: EGLConfig,
}

impl Drop for Context<'_> {
    fn drop(&mut self) {
        log::debug!("destroying egl context");
        unsafe { (self.lib.eglDestroyContext)(self.display, self.context) };
    }
}

// ----
// surface

#[derive(Debug)]
pub enum CreateSurfaceError {
    UnsupportedWindowHandle(String),
    CouldNotCreateSurface(EglError),
}

impl error::Error for CreateSurfaceError {}

impl fmt::Display for CreateSurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedWindowHandle(handle) => {
                f.write_fmt(format_args!("unsupported window handle: {handle}"))
            }
            Self::CouldNotCreateSurface(err) => {
                f.write_fmt(format_args!("could not create surface: {err}"))
            }
        }
    }
}

pub struct Surface<'a> {
    lib: &'a Lib,
    display: EGLDisplay,
    pub surface: EGLSurface,
    pub config: EGLConfig,
    // NOTE: the native window must outlive the surface.
    _window: PhantomData<rwh::WindowHandle<'a>>,
}

impl Drop for Surface<'_> {
    fn drop(&mut self) {
        log::debug!("destroying egl surface");
        unsafe { (self.lib.eglDestroySurface)(self.display, self.surface) };
    }
}

// ----
// connection

#[derive(Debug)]
pub enum CreateConnectionError {
    UnsupportedDisplayHandle(String),
    CouldNotLoadEgl(anyhow::Error),
    CouldNotGetDisplay(GetDisplayError),
    CouldNotInitializeDisplay(EglError),
}

impl error::Error for CreateConnectionError {}

impl fmt::Display for CreateConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedDisplayHandle(handle) => {
                f.write_fmt(format_args!("unsupported display handle: {handle}"))
            }
            Self::CouldNotLoadEgl(err) => f.write_fmt(format_args!("could not load egl: {err}")),
            Self::CouldNotGetDisplay(err) => fmt::Display::fmt(err, f),
            Self::CouldNotInitializeDisplay(err) => {
                f.write_fmt(format_args!("could not initialize display: {err}"))
            }
        }
    }
}

pub struct Connection<'d> {
    pub lib: Lib,
    pub display: Display,
    pub version: (EGLint, EGLint),
    // NOTE: egl implementations hold on to the native display, it must outlive the connection.
    _native_display: PhantomData<rwh::DisplayHandle<'d>>,
}

impl Drop for Connection<'_> {
    fn drop(&mut self) {
        log::debug!("terminating egl display");
        unsafe { (self.lib.eglTerminate)(*self.display) };
    }
}

impl<'d> Connection<'d> {
    pub fn from_display_handle(
        display_handle: rwh::DisplayHandle<'d>,
    ) -> Result<Self, CreateConnectionError> {
        let native = match display_handle.as_raw() {
            rwh::RawDisplayHandle::Xlib(xlib) => xlib.display,
            other => {
                return Err(CreateConnectionError::UnsupportedDisplayHandle(format!(
                    "{other:?}"
                )));
            }
        };

        let lib = Lib::load().map_err(CreateConnectionError::CouldNotLoadEgl)?;

        let display =
            Display::get(&lib, native).map_err(CreateConnectionError::CouldNotGetDisplay)?;
        log::info!("got egl display using {}", display.strategy);

        let mut version = (0, 0);
        if unsafe { (lib.eglInitialize)(*display, &mut version.0, &mut version.1) } == FALSE {
            return Err(CreateConnectionError::CouldNotInitializeDisplay(
                EglError::last(&lib),
            ));
        }

        Ok(Self {
            lib,
            display,
            version,
            _native_display: PhantomData,
        })
    }

    pub fn last_error(&self) -> EglError {
        EglError::last(&self.lib)
    }

    pub fn query_string(&self, name: EGLint) -> Option<String> {
        let ptr = unsafe { (self.lib.eglQueryString)(*self.display, name) };
        if ptr.is_null() {
            return None;
        }
        Some(
            unsafe { CStr::from_ptr(ptr) }
                .to_string_lossy()
                .into_owned(),
        )
    }

    /// asks for exactly one config. returns it along with the number of configs the
    /// implementation reported.
    pub fn choose_config(
        &self,
        attribs: &[EGLint],
    ) -> Result<(EGLConfig, EGLint), ChooseConfigError> {
        assert!(is_terminated(attribs));

        let mut config: EGLConfig = std::ptr::null_mut();
        let mut num_configs: EGLint = 0;
        let ok = unsafe {
            (self.lib.eglChooseConfig)(
                *self.display,
                attribs.as_ptr(),
                &mut config,
                1,
                &mut num_configs,
            )
        };
        if ok == FALSE {
            return Err(ChooseConfigError::CouldNotChooseConfig(self.last_error()));
        }
        if num_configs == 0 || config.is_null() {
            return Err(ChooseConfigError::NoMatchingConfig);
        }
        Ok((config, num_configs))
    }

    pub fn config_attrib(&self, config: EGLConfig, attribute: EGLint) -> Result<EGLint, EglError> {
        let mut value: EGLint = 0;
        let ok =
            unsafe { (self.lib.eglGetConfigAttrib)(*self.display, config, attribute, &mut value) };
        if ok == FALSE {
            return Err(self.last_error());
        }
        Ok(value)
    }

    /// NOTE: EGLConfig does not need clean up, how you got it is up to you.
    pub fn create_context(
        &self,
        config: EGLConfig,
        attribs: &[EGLint],
    ) -> Result<Context<'_>, CreateContextError> {
        assert!(is_terminated(attribs));

        if unsafe { (self.lib.eglBindAPI)(OPENGL_ES_API) } == FALSE {
            return Err(CreateContextError::CouldNotBindApi(self.last_error()));
        }

        let context = unsafe {
            (self.lib.eglCreateContext)(*self.display, config, NO_CONTEXT, attribs.as_ptr())
        };
        if context == NO_CONTEXT {
            return Err(CreateContextError::CouldNotCreateContext(self.last_error()));
        }

        Ok(Context {
            lib: &self.lib,
            display: *self.display,
            context,
            config,
        })
    }

    pub fn create_window_surface<'a>(
        &'a self,
        config: EGLConfig,
        window_handle: rwh::WindowHandle<'a>,
    ) -> Result<Surface<'a>, CreateSurfaceError> {
        let native_window = match window_handle.as_raw() {
            rwh::RawWindowHandle::Xlib(xlib) => xlib.window as EGLNativeWindowType,
            other => {
                return Err(CreateSurfaceError::UnsupportedWindowHandle(format!(
                    "{other:?}"
                )));
            }
        };

        let surface = unsafe {
            (self.lib.eglCreateWindowSurface)(*self.display, config, native_window, null())
        };
        if surface == NO_SURFACE {
            return Err(CreateSurfaceError::CouldNotCreateSurface(self.last_error()));
        }

        Ok(Surface {
            lib: &self.lib,
            display: *self.display,
            surface,
            config,
            _window: PhantomData,
        })
    }

    /// binds the context to the surface for both drawing and reading.
    pub fn make_current(&self, surface: &Surface, context: &Context) -> Result<(), EglError> {
        let ok = unsafe {
            (self.lib.eglMakeCurrent)(
                *self.display,
                surface.surface,
                surface.surface,
                context.context,
            )
        };
        if ok == FALSE {
            return Err(self.last_error());
        }
        Ok(())
    }

    /// NOTE: dropping the connection does not do this, whoever made a context current must
    /// release it before the surface and the context go away.
    pub fn release_current(&self) {
        unsafe { (self.lib.eglMakeCurrent)(*self.display, NO_SURFACE, NO_SURFACE, NO_CONTEXT) };
    }

    pub fn swap_buffers(&self, surface: &Surface) -> Result<(), EglError> {
        if unsafe { (self.lib.eglSwapBuffers)(*self.display, surface.surface) } == FALSE {
            return Err(self.last_error());
        }
        Ok(())
    }

    pub fn get_proc_address(&self, name: &CStr) -> *const c_void {
        self.lib.get_proc_address(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminated() {
        assert!(is_terminated(&[NONE]));
        assert!(is_terminated(&[CONTEXT_CLIENT_VERSION, 2, NONE]));
        assert!(!is_terminated(&[CONTEXT_CLIENT_VERSION, 2]));
        assert!(!is_terminated(&[]));
        // NOTE: NONE in value position does not terminate the list.
        assert!(!is_terminated(&[RED_SIZE, NONE]));
    }

    #[test]
    fn test_try_in_order_first_success_wins() {
        let mut tried = Vec::new();
        let ret = try_in_order(&DisplayStrategy::ALL, |strategy| {
            tried.push(strategy);
            match strategy {
                DisplayStrategy::Default => Err("nope".to_string()),
                _ => Ok(strategy),
            }
        });
        assert_eq!(
            ret.ok(),
            Some((DisplayStrategy::Native, DisplayStrategy::Native))
        );
        // NOTE: must stop after the first success.
        assert_eq!(tried, [DisplayStrategy::Default, DisplayStrategy::Native]);
    }

    #[test]
    fn test_try_in_order_aggregates_failures() {
        let ret: Result<(DisplayStrategy, ()), _> =
            try_in_order(&DisplayStrategy::ALL, |strategy| {
                Err(format!("{strategy} failed"))
            });
        let attempts = ret.err().expect("all strategies fail");
        assert_eq!(attempts.len(), 3);
        assert_eq!(attempts[2].0, DisplayStrategy::PlatformExt);

        let err = GetDisplayError { attempts };
        let msg = err.to_string();
        assert!(msg.starts_with("could not get display"), "{msg}");
        assert!(msg.contains("default display: default display failed"), "{msg}");
        assert!(msg.contains("native display: native display failed"), "{msg}");
        assert!(msg.contains("EGL_EXT_platform_base"), "{msg}");
    }

    struct FakeSource {
        display: EGLDisplay,
        platform_ext: bool,
        error: EGLint,
        requested: std::cell::RefCell<Vec<EGLNativeDisplayType>>,
    }

    impl FakeSource {
        fn new(display: EGLDisplay) -> Self {
            Self {
                display,
                platform_ext: true,
                error: SUCCESS,
                requested: std::cell::RefCell::new(Vec::new()),
            }
        }
    }

    impl DisplaySource for FakeSource {
        fn get_display(&self, display_id: EGLNativeDisplayType) -> EGLDisplay {
            self.requested.borrow_mut().push(display_id);
            self.display
        }

        fn get_platform_display_ext(
            &self,
            platform: EGLenum,
            native_display: *mut c_void,
        ) -> Option<EGLDisplay> {
            assert_eq!(platform, PLATFORM_X11_EXT);
            if !self.platform_ext {
                return None;
            }
            self.requested.borrow_mut().push(native_display);
            Some(self.display)
        }

        fn last_error(&self) -> EglError {
            EglError(self.error)
        }
    }

    fn fake_ptr(addr: usize) -> *mut c_void {
        addr as *mut c_void
    }

    #[test]
    fn test_attempt_passes_native_display_through() {
        let source = FakeSource::new(fake_ptr(0x10));
        let native = NonNull::new(fake_ptr(0x20));

        assert_eq!(DisplayStrategy::Default.attempt(&source, native), Ok(fake_ptr(0x10)));
        assert_eq!(DisplayStrategy::Native.attempt(&source, native), Ok(fake_ptr(0x10)));
        assert_eq!(
            DisplayStrategy::PlatformExt.attempt(&source, native),
            Ok(fake_ptr(0x10))
        );
        assert_eq!(
            *source.requested.borrow(),
            [DEFAULT_DISPLAY, fake_ptr(0x20), fake_ptr(0x20)]
        );
    }

    #[test]
    fn test_attempt_without_native_display() {
        let source = FakeSource::new(fake_ptr(0x10));
        for strategy in [DisplayStrategy::Native, DisplayStrategy::PlatformExt] {
            assert_eq!(
                strategy.attempt(&source, None),
                Err("native display is unavailable".to_string())
            );
        }
        assert!(source.requested.borrow().is_empty());
    }

    #[test]
    fn test_attempt_without_platform_ext() {
        let mut source = FakeSource::new(fake_ptr(0x10));
        source.platform_ext = false;
        assert_eq!(
            DisplayStrategy::PlatformExt.attempt(&source, NonNull::new(fake_ptr(0x20))),
            Err("eglGetPlatformDisplayEXT is unavailable".to_string())
        );
    }

    #[test]
    fn test_attempt_no_display() {
        let mut source = FakeSource::new(NO_DISPLAY);
        assert_eq!(
            DisplayStrategy::Default.attempt(&source, None),
            Err("got EGL_NO_DISPLAY".to_string())
        );

        source.error = BAD_PARAMETER;
        assert_eq!(
            DisplayStrategy::Default.attempt(&source, None),
            Err("got EGL_NO_DISPLAY: EGL_BAD_PARAMETER (0x300c)".to_string())
        );
    }

    #[test]
    fn test_egl_error_display() {
        assert_eq!(EglError(BAD_MATCH).to_string(), "EGL_BAD_MATCH (0x3009)");
    }
}
