#![allow(non_snake_case)]

// https://registry.khronos.org/OpenGL/api/GLES2/gl2.h
//
// NOTE: es 2.0 core, and only the entry points that are actually called.

use std::ffi::{CStr, c_char, c_float, c_int, c_uchar, c_uint, c_void};

use anyhow::anyhow;
use dynlib::DynLib;

pub type GLbitfield = c_uint;
pub type GLboolean = c_uchar;
pub type GLchar = c_char;
pub type GLenum = c_uint;
pub type GLfloat = c_float;
pub type GLint = c_int;
pub type GLsizei = c_int;
pub type GLsizeiptr = isize;
pub type GLubyte = c_uchar;
pub type GLuint = c_uint;

pub const FALSE: GLboolean = 0;
pub const TRUE: GLboolean = 1;

pub const NO_ERROR: GLenum = 0;
pub const INVALID_ENUM: GLenum = 0x0500;
pub const INVALID_VALUE: GLenum = 0x0501;
pub const INVALID_OPERATION: GLenum = 0x0502;
pub const OUT_OF_MEMORY: GLenum = 0x0505;
pub const INVALID_FRAMEBUFFER_OPERATION: GLenum = 0x0506;

pub const COLOR_BUFFER_BIT: GLbitfield = 0x00004000;

pub const TRIANGLES: GLenum = 0x0004;

pub const UNSIGNED_BYTE: GLenum = 0x1401;
pub const FLOAT: GLenum = 0x1406;
pub const RGBA: GLenum = 0x1908;

pub const VENDOR: GLenum = 0x1F00;
pub const RENDERER: GLenum = 0x1F01;
pub const VERSION: GLenum = 0x1F02;
pub const SHADING_LANGUAGE_VERSION: GLenum = 0x8B8C;

pub const ARRAY_BUFFER: GLenum = 0x8892;
pub const STATIC_DRAW: GLenum = 0x88E4;

pub const FRAGMENT_SHADER: GLenum = 0x8B30;
pub const VERTEX_SHADER: GLenum = 0x8B31;
pub const COMPILE_STATUS: GLenum = 0x8B81;
pub const LINK_STATUS: GLenum = 0x8B82;
pub const INFO_LOG_LENGTH: GLenum = 0x8B84;

pub struct Api {
    pub glAttachShader: unsafe extern "C" fn(program: GLuint, shader: GLuint),
    pub glBindBuffer: unsafe extern "C" fn(target: GLenum, buffer: GLuint),
    pub glBufferData: unsafe extern "C" fn(
        target: GLenum,
        size: GLsizeiptr,
        data: *const c_void,
        usage: GLenum,
    ),
    pub glClear: unsafe extern "C" fn(mask: GLbitfield),
    pub glClearColor:
        unsafe extern "C" fn(red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat),
    pub glCompileShader: unsafe extern "C" fn(shader: GLuint),
    pub glCreateProgram: unsafe extern "C" fn() -> GLuint,
    pub glCreateShader: unsafe extern "C" fn(r#type: GLenum) -> GLuint,
    pub glDeleteBuffers: unsafe extern "C" fn(n: GLsizei, buffers: *const GLuint),
    pub glDeleteProgram: unsafe extern "C" fn(program: GLuint),
    pub glDeleteShader: unsafe extern "C" fn(shader: GLuint),
    pub glDisableVertexAttribArray: unsafe extern "C" fn(index: GLuint),
    pub glDrawArrays: unsafe extern "C" fn(mode: GLenum, first: GLint, count: GLsizei),
    pub glEnableVertexAttribArray: unsafe extern "C" fn(index: GLuint),
    pub glGenBuffers: unsafe extern "C" fn(n: GLsizei, buffers: *mut GLuint),
    pub glGetAttribLocation:
        unsafe extern "C" fn(program: GLuint, name: *const GLchar) -> GLint,
    pub glGetError: unsafe extern "C" fn() -> GLenum,
    pub glGetProgramInfoLog: unsafe extern "C" fn(
        program: GLuint,
        buf_size: GLsizei,
        length: *mut GLsizei,
        info_log: *mut GLchar,
    ),
    pub glGetProgramiv: unsafe extern "C" fn(program: GLuint, pname: GLenum, params: *mut GLint),
    pub glGetShaderInfoLog: unsafe extern "C" fn(
        shader: GLuint,
        buf_size: GLsizei,
        length: *mut GLsizei,
        info_log: *mut GLchar,
    ),
    pub glGetShaderiv: unsafe extern "C" fn(shader: GLuint, pname: GLenum, params: *mut GLint),
    pub glGetString: unsafe extern "C" fn(name: GLenum) -> *const GLubyte,
    pub glLinkProgram: unsafe extern "C" fn(program: GLuint),
    pub glReadPixels: unsafe extern "C" fn(
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        r#type: GLenum,
        pixels: *mut c_void,
    ),
    pub glShaderSource: unsafe extern "C" fn(
        shader: GLuint,
        count: GLsizei,
        string: *const *const GLchar,
        length: *const GLint,
    ),
    pub glUseProgram: unsafe extern "C" fn(program: GLuint),
    pub glVertexAttribPointer: unsafe extern "C" fn(
        index: GLuint,
        size: GLint,
        r#type: GLenum,
        normalized: GLboolean,
        stride: GLsizei,
        pointer: *const c_void,
    ),
    pub glViewport: unsafe extern "C" fn(x: GLint, y: GLint, width: GLsizei, height: GLsizei),

    _dynlib: Option<DynLib>,
}

impl Api {
    /// a context must be current on the calling thread, some implementations hand out null (or
    /// worse - garbage) otherwise.
    pub unsafe fn load_with(
        mut get_proc_address: impl FnMut(&CStr) -> *const c_void,
    ) -> anyhow::Result<Self> {
        macro_rules! load {
            ($name:literal) => {{
                let ptr = get_proc_address($name);
                if ptr.is_null() {
                    return Err(anyhow!("could not load {:?}", $name));
                }
                unsafe { std::mem::transmute::<*const c_void, _>(ptr) }
            }};
        }

        Ok(Self {
            glAttachShader: load!(c"glAttachShader"),
            glBindBuffer: load!(c"glBindBuffer"),
            glBufferData: load!(c"glBufferData"),
            glClear: load!(c"glClear"),
            glClearColor: load!(c"glClearColor"),
            glCompileShader: load!(c"glCompileShader"),
            glCreateProgram: load!(c"glCreateProgram"),
            glCreateShader: load!(c"glCreateShader"),
            glDeleteBuffers: load!(c"glDeleteBuffers"),
            glDeleteProgram: load!(c"glDeleteProgram"),
            glDeleteShader: load!(c"glDeleteShader"),
            glDisableVertexAttribArray: load!(c"glDisableVertexAttribArray"),
            glDrawArrays: load!(c"glDrawArrays"),
            glEnableVertexAttribArray: load!(c"glEnableVertexAttribArray"),
            glGenBuffers: load!(c"glGenBuffers"),
            glGetAttribLocation: load!(c"glGetAttribLocation"),
            glGetError: load!(c"glGetError"),
            glGetProgramInfoLog: load!(c"glGetProgramInfoLog"),
            glGetProgramiv: load!(c"glGetProgramiv"),
            glGetShaderInfoLog: load!(c"glGetShaderInfoLog"),
            glGetShaderiv: load!(c"glGetShaderiv"),
            glGetString: load!(c"glGetString"),
            glLinkProgram: load!(c"glLinkProgram"),
            glReadPixels: load!(c"glReadPixels"),
            glShaderSource: load!(c"glShaderSource"),
            glUseProgram: load!(c"glUseProgram"),
            glVertexAttribPointer: load!(c"glVertexAttribPointer"),
            glViewport: load!(c"glViewport"),

            _dynlib: None,
        })
    }

    /// NOTE: eglGetProcAddress is only required to return core functions since egl 1.5, so
    /// libGLESv2 is asked first and `fallback` (which normally is eglGetProcAddress) is used for
    /// whatever it could not resolve.
    pub unsafe fn load(fallback: impl Fn(&CStr) -> *const c_void) -> anyhow::Result<Self> {
        let dynlib = DynLib::open_first(&[c"libGLESv2.so", c"libGLESv2.so.2"])
            .inspect_err(|err| log::warn!("could not open libGLESv2 ({err}), relying on egl"))
            .ok();

        let mut api = unsafe {
            Self::load_with(|name| {
                dynlib
                    .as_ref()
                    .and_then(|dynlib| dynlib.lookup_optional::<*const c_void>(name))
                    .unwrap_or_else(|| fallback(name))
            })
        }?;
        api._dynlib = dynlib;
        Ok(api)
    }
}
