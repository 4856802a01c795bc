#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

use std::ffi::{CStr, c_char, c_uint, c_ulong, c_void};
use std::ptr::null_mut;

use dynlib::DynLib;

pub type khronos_int32_t = i32;

// https://registry.khronos.org/EGL/api/EGL/eglplatform.h
//
// NOTE: these are the xlib flavours; on x11 a native window is the XID, not a pointer.

pub type EGLNativeDisplayType = *mut c_void;
pub type EGLNativeWindowType = c_ulong;

// https://registry.khronos.org/EGL/api/EGL/egl.h

pub type EGLint = khronos_int32_t;
pub type EGLBoolean = c_uint;
pub type EGLenum = c_uint;
pub type EGLAttrib = isize;
pub type EGLDisplay = *mut c_void;
pub type EGLConfig = *mut c_void;
pub type EGLSurface = *mut c_void;
pub type EGLContext = *mut c_void;
pub type __eglMustCastToProperFunctionPointerType = Option<unsafe extern "C" fn()>;

pub const FALSE: EGLBoolean = 0;
pub const TRUE: EGLBoolean = 1;

pub const DEFAULT_DISPLAY: EGLNativeDisplayType = null_mut();
pub const NO_CONTEXT: EGLContext = null_mut();
pub const NO_DISPLAY: EGLDisplay = null_mut();
pub const NO_SURFACE: EGLSurface = null_mut();

// errors

pub const SUCCESS: EGLint = 0x3000;
pub const NOT_INITIALIZED: EGLint = 0x3001;
pub const BAD_ACCESS: EGLint = 0x3002;
pub const BAD_ALLOC: EGLint = 0x3003;
pub const BAD_ATTRIBUTE: EGLint = 0x3004;
pub const BAD_CONFIG: EGLint = 0x3005;
pub const BAD_CONTEXT: EGLint = 0x3006;
pub const BAD_CURRENT_SURFACE: EGLint = 0x3007;
pub const BAD_DISPLAY: EGLint = 0x3008;
pub const BAD_MATCH: EGLint = 0x3009;
pub const BAD_NATIVE_PIXMAP: EGLint = 0x300A;
pub const BAD_NATIVE_WINDOW: EGLint = 0x300B;
pub const BAD_PARAMETER: EGLint = 0x300C;
pub const BAD_SURFACE: EGLint = 0x300D;
pub const CONTEXT_LOST: EGLint = 0x300E;

// config attributes

pub const ALPHA_SIZE: EGLint = 0x3021;
pub const BLUE_SIZE: EGLint = 0x3022;
pub const GREEN_SIZE: EGLint = 0x3023;
pub const RED_SIZE: EGLint = 0x3024;
pub const DEPTH_SIZE: EGLint = 0x3025;
pub const STENCIL_SIZE: EGLint = 0x3026;
pub const NATIVE_VISUAL_ID: EGLint = 0x302E;
pub const SURFACE_TYPE: EGLint = 0x3033;
pub const NONE: EGLint = 0x3038;
pub const RENDERABLE_TYPE: EGLint = 0x3040;

pub const WINDOW_BIT: EGLint = 0x0004;
pub const OPENGL_ES2_BIT: EGLint = 0x0004;

// query strings

pub const VENDOR: EGLint = 0x3053;
pub const VERSION: EGLint = 0x3054;
pub const EXTENSIONS: EGLint = 0x3055;
pub const CLIENT_APIS: EGLint = 0x308D;

// context

pub const CONTEXT_CLIENT_VERSION: EGLint = 0x3098;
pub const OPENGL_ES_API: EGLenum = 0x30A0;

// https://registry.khronos.org/EGL/extensions/KHR/EGL_KHR_platform_x11.txt
// https://registry.khronos.org/EGL/extensions/EXT/EGL_EXT_platform_x11.txt

pub const PLATFORM_X11_KHR: EGLenum = 0x31D5;
pub const PLATFORM_X11_EXT: EGLenum = 0x31D5;

/// https://registry.khronos.org/EGL/extensions/EXT/EGL_EXT_platform_base.txt
pub type PFNEGLGETPLATFORMDISPLAYEXTPROC = unsafe extern "C" fn(
    platform: EGLenum,
    native_display: *mut c_void,
    attrib_list: *const EGLint,
) -> EGLDisplay;

pub struct Lib {
    pub eglBindAPI: unsafe extern "C" fn(api: EGLenum) -> EGLBoolean,
    pub eglChooseConfig: unsafe extern "C" fn(
        dpy: EGLDisplay,
        attrib_list: *const EGLint,
        configs: *mut EGLConfig,
        config_size: EGLint,
        num_config: *mut EGLint,
    ) -> EGLBoolean,
    pub eglCreateContext: unsafe extern "C" fn(
        dpy: EGLDisplay,
        config: EGLConfig,
        share_context: EGLContext,
        attrib_list: *const EGLint,
    ) -> EGLContext,
    pub eglCreateWindowSurface: unsafe extern "C" fn(
        dpy: EGLDisplay,
        config: EGLConfig,
        win: EGLNativeWindowType,
        attrib_list: *const EGLint,
    ) -> EGLSurface,
    pub eglDestroyContext: unsafe extern "C" fn(dpy: EGLDisplay, ctx: EGLContext) -> EGLBoolean,
    pub eglDestroySurface: unsafe extern "C" fn(dpy: EGLDisplay, surface: EGLSurface) -> EGLBoolean,
    pub eglGetConfigAttrib: unsafe extern "C" fn(
        dpy: EGLDisplay,
        config: EGLConfig,
        attribute: EGLint,
        value: *mut EGLint,
    ) -> EGLBoolean,
    pub eglGetDisplay: unsafe extern "C" fn(display_id: EGLNativeDisplayType) -> EGLDisplay,
    pub eglGetError: unsafe extern "C" fn() -> EGLint,
    pub eglGetProcAddress:
        unsafe extern "C" fn(procname: *const c_char) -> __eglMustCastToProperFunctionPointerType,
    pub eglInitialize:
        unsafe extern "C" fn(dpy: EGLDisplay, major: *mut EGLint, minor: *mut EGLint) -> EGLBoolean,
    pub eglMakeCurrent: unsafe extern "C" fn(
        dpy: EGLDisplay,
        draw: EGLSurface,
        read: EGLSurface,
        ctx: EGLContext,
    ) -> EGLBoolean,
    pub eglQueryString: unsafe extern "C" fn(dpy: EGLDisplay, name: EGLint) -> *const c_char,
    pub eglSwapBuffers: unsafe extern "C" fn(dpy: EGLDisplay, surface: EGLSurface) -> EGLBoolean,
    pub eglTerminate: unsafe extern "C" fn(dpy: EGLDisplay) -> EGLBoolean,

    _dl: DynLib,
}

impl Lib {
    pub fn load() -> anyhow::Result<Self> {
        let dl = DynLib::open_first(&[c"libEGL.so", c"libEGL.so.1"])?;

        Ok(Self {
            eglBindAPI: dl.lookup(c"eglBindAPI")?,
            eglChooseConfig: dl.lookup(c"eglChooseConfig")?,
            eglCreateContext: dl.lookup(c"eglCreateContext")?,
            eglCreateWindowSurface: dl.lookup(c"eglCreateWindowSurface")?,
            eglDestroyContext: dl.lookup(c"eglDestroyContext")?,
            eglDestroySurface: dl.lookup(c"eglDestroySurface")?,
            eglGetConfigAttrib: dl.lookup(c"eglGetConfigAttrib")?,
            eglGetDisplay: dl.lookup(c"eglGetDisplay")?,
            eglGetError: dl.lookup(c"eglGetError")?,
            eglGetProcAddress: dl.lookup(c"eglGetProcAddress")?,
            eglInitialize: dl.lookup(c"eglInitialize")?,
            eglMakeCurrent: dl.lookup(c"eglMakeCurrent")?,
            eglQueryString: dl.lookup(c"eglQueryString")?,
            eglSwapBuffers: dl.lookup(c"eglSwapBuffers")?,
            eglTerminate: dl.lookup(c"eglTerminate")?,

            _dl: dl,
        })
    }

    /// NOTE: extension funcs (for example eglGetPlatformDisplayEXT) cannot be reliably loaded
    /// with dlsym, only with eglGetProcAddress.
    pub fn get_proc_address(&self, name: &CStr) -> *const c_void {
        match unsafe { (self.eglGetProcAddress)(name.as_ptr()) } {
            Some(f) => f as *const c_void,
            None => std::ptr::null(),
        }
    }

    pub fn get_platform_display_ext(&self) -> Option<PFNEGLGETPLATFORMDISPLAYEXTPROC> {
        let ptr = self.get_proc_address(c"eglGetPlatformDisplayEXT");
        if ptr.is_null() {
            None
        } else {
            Some(unsafe {
                std::mem::transmute::<*const c_void, PFNEGLGETPLATFORMDISPLAYEXTPROC>(ptr)
            })
        }
    }
}

pub fn error_name(code: EGLint) -> &'static str {
    match code {
        SUCCESS => "EGL_SUCCESS",
        NOT_INITIALIZED => "EGL_NOT_INITIALIZED",
        BAD_ACCESS => "EGL_BAD_ACCESS",
        BAD_ALLOC => "EGL_BAD_ALLOC",
        BAD_ATTRIBUTE => "EGL_BAD_ATTRIBUTE",
        BAD_CONFIG => "EGL_BAD_CONFIG",
        BAD_CONTEXT => "EGL_BAD_CONTEXT",
        BAD_CURRENT_SURFACE => "EGL_BAD_CURRENT_SURFACE",
        BAD_DISPLAY => "EGL_BAD_DISPLAY",
        BAD_MATCH => "EGL_BAD_MATCH",
        BAD_NATIVE_PIXMAP => "EGL_BAD_NATIVE_PIXMAP",
        BAD_NATIVE_WINDOW => "EGL_BAD_NATIVE_WINDOW",
        BAD_PARAMETER => "EGL_BAD_PARAMETER",
        BAD_SURFACE => "EGL_BAD_SURFACE",
        CONTEXT_LOST => "EGL_CONTEXT_LOST",
        _ => "unknown egl error",
    }
}

#[test]
fn test_error_name() {
    assert_eq!(error_name(BAD_MATCH), "EGL_BAD_MATCH");
    assert_eq!(error_name(CONTEXT_LOST), "EGL_CONTEXT_LOST");
    assert_eq!(error_name(0x1234), "unknown egl error");
}
