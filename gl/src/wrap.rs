use std::ffi::{CStr, c_void};
use std::fmt;
use std::num::NonZero;

use anyhow::{Context as _, anyhow};

use crate::libgl as gl;

// NOTE: why not just use glow?
// i very don't like that its api does not exactly mirror gl spec.
//
// all methods match libgl's functions 1:1 with the exception of things that can be rustified
// (strings, object handles, -1 sentinels).
//
// the trait exists so that code that drives gl can be exercised without a gpu.
pub trait Adapter {
    type Buffer: Copy + fmt::Debug + PartialEq;
    type Program: Copy + fmt::Debug + PartialEq;
    type Shader: Copy + fmt::Debug + PartialEq;

    unsafe fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    unsafe fn bind_buffer(&self, target: gl::GLenum, buffer: Option<Self::Buffer>);
    unsafe fn buffer_data(
        &self,
        target: gl::GLenum,
        size: gl::GLsizeiptr,
        data: *const c_void,
        usage: gl::GLenum,
    );
    unsafe fn clear(&self, mask: gl::GLbitfield);
    unsafe fn clear_color(
        &self,
        red: gl::GLfloat,
        green: gl::GLfloat,
        blue: gl::GLfloat,
        alpha: gl::GLfloat,
    );
    unsafe fn compile_shader(&self, shader: Self::Shader);
    unsafe fn create_buffer(&self) -> anyhow::Result<Self::Buffer>;
    unsafe fn create_program(&self) -> anyhow::Result<Self::Program>;
    unsafe fn create_shader(&self, r#type: gl::GLenum) -> anyhow::Result<Self::Shader>;
    unsafe fn delete_buffer(&self, buffer: Self::Buffer);
    unsafe fn delete_program(&self, program: Self::Program);
    unsafe fn delete_shader(&self, shader: Self::Shader);
    unsafe fn disable_vertex_attrib_array(&self, index: gl::GLuint);
    unsafe fn draw_arrays(&self, mode: gl::GLenum, first: gl::GLint, count: gl::GLsizei);
    unsafe fn enable_vertex_attrib_array(&self, index: gl::GLuint);
    unsafe fn get_attrib_location(&self, program: Self::Program, name: &CStr) -> Option<gl::GLint>;
    unsafe fn get_error(&self) -> Option<gl::GLenum>;
    unsafe fn get_program_info_log(&self, program: Self::Program) -> String;
    unsafe fn get_program_parameter(&self, program: Self::Program, pname: gl::GLenum) -> gl::GLint;
    unsafe fn get_shader_info_log(&self, shader: Self::Shader) -> String;
    unsafe fn get_shader_parameter(&self, shader: Self::Shader, pname: gl::GLenum) -> gl::GLint;
    unsafe fn get_string(&self, name: gl::GLenum) -> anyhow::Result<String>;
    unsafe fn link_program(&self, program: Self::Program);
    unsafe fn read_pixels(
        &self,
        x: gl::GLint,
        y: gl::GLint,
        width: gl::GLsizei,
        height: gl::GLsizei,
        format: gl::GLenum,
        r#type: gl::GLenum,
        pixels: *mut c_void,
    );
    unsafe fn shader_source(&self, shader: Self::Shader, source: &str);
    unsafe fn use_program(&self, program: Option<Self::Program>);
    unsafe fn vertex_attrib_pointer(
        &self,
        index: gl::GLuint,
        size: gl::GLint,
        r#type: gl::GLenum,
        normalized: gl::GLboolean,
        stride: gl::GLsizei,
        pointer: *const c_void,
    );
    unsafe fn viewport(&self, x: gl::GLint, y: gl::GLint, width: gl::GLsizei, height: gl::GLsizei);
}

/// info logs come back nul-terminated (and sometimes with a trailing newline).
fn info_log_to_string(mut bytes: Vec<u8>, written: gl::GLsizei) -> String {
    bytes.truncate(written.max(0) as usize);
    while bytes.last().is_some_and(|b| *b == 0) {
        bytes.pop();
    }
    String::from_utf8_lossy(&bytes).trim_end().to_string()
}

impl Adapter for gl::Api {
    type Buffer = NonZero<gl::GLuint>;
    type Program = NonZero<gl::GLuint>;
    type Shader = NonZero<gl::GLuint>;

    #[inline]
    unsafe fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { (self.glAttachShader)(program.get(), shader.get()) };
    }

    #[inline]
    unsafe fn bind_buffer(&self, target: gl::GLenum, buffer: Option<Self::Buffer>) {
        unsafe { (self.glBindBuffer)(target, buffer.map_or(0, |v| v.get())) };
    }

    #[inline]
    unsafe fn buffer_data(
        &self,
        target: gl::GLenum,
        size: gl::GLsizeiptr,
        data: *const c_void,
        usage: gl::GLenum,
    ) {
        unsafe { (self.glBufferData)(target, size, data, usage) };
    }

    #[inline]
    unsafe fn clear(&self, mask: gl::GLbitfield) {
        unsafe { (self.glClear)(mask) };
    }

    #[inline]
    unsafe fn clear_color(
        &self,
        red: gl::GLfloat,
        green: gl::GLfloat,
        blue: gl::GLfloat,
        alpha: gl::GLfloat,
    ) {
        unsafe { (self.glClearColor)(red, green, blue, alpha) };
    }

    #[inline]
    unsafe fn compile_shader(&self, shader: Self::Shader) {
        unsafe { (self.glCompileShader)(shader.get()) };
    }

    #[inline]
    unsafe fn create_buffer(&self) -> anyhow::Result<Self::Buffer> {
        let mut buffer: gl::GLuint = 0;
        unsafe { (self.glGenBuffers)(1, &mut buffer) };
        NonZero::new(buffer).context("could not create buffer")
    }

    #[inline]
    unsafe fn create_program(&self) -> anyhow::Result<Self::Program> {
        let program = unsafe { (self.glCreateProgram)() };
        NonZero::new(program).context("could not create program")
    }

    #[inline]
    unsafe fn create_shader(&self, r#type: gl::GLenum) -> anyhow::Result<Self::Shader> {
        let shader = unsafe { (self.glCreateShader)(r#type) };
        NonZero::new(shader)
            .with_context(|| format!("could not create shader (type 0x{:x})", r#type))
    }

    #[inline]
    unsafe fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { (self.glDeleteBuffers)(1, &buffer.get()) };
    }

    #[inline]
    unsafe fn delete_program(&self, program: Self::Program) {
        unsafe { (self.glDeleteProgram)(program.get()) };
    }

    #[inline]
    unsafe fn delete_shader(&self, shader: Self::Shader) {
        unsafe { (self.glDeleteShader)(shader.get()) };
    }

    #[inline]
    unsafe fn disable_vertex_attrib_array(&self, index: gl::GLuint) {
        unsafe { (self.glDisableVertexAttribArray)(index) };
    }

    #[inline]
    unsafe fn draw_arrays(&self, mode: gl::GLenum, first: gl::GLint, count: gl::GLsizei) {
        unsafe { (self.glDrawArrays)(mode, first, count) };
    }

    #[inline]
    unsafe fn enable_vertex_attrib_array(&self, index: gl::GLuint) {
        unsafe { (self.glEnableVertexAttribArray)(index) };
    }

    #[inline]
    unsafe fn get_attrib_location(&self, program: Self::Program, name: &CStr) -> Option<gl::GLint> {
        let ret = unsafe { (self.glGetAttribLocation)(program.get(), name.as_ptr()) };
        (ret != -1).then_some(ret)
    }

    #[inline]
    unsafe fn get_error(&self) -> Option<gl::GLenum> {
        let ret = unsafe { (self.glGetError)() };
        (ret != gl::NO_ERROR).then_some(ret)
    }

    unsafe fn get_program_info_log(&self, program: Self::Program) -> String {
        let len = unsafe { self.get_program_parameter(program, gl::INFO_LOG_LENGTH) };
        if len <= 0 {
            return String::new();
        }
        let mut info_log = vec![0u8; len as usize];
        let mut written: gl::GLsizei = 0;
        unsafe {
            (self.glGetProgramInfoLog)(
                program.get(),
                len,
                &mut written,
                info_log.as_mut_ptr() as *mut gl::GLchar,
            )
        };
        info_log_to_string(info_log, written)
    }

    #[inline]
    unsafe fn get_program_parameter(&self, program: Self::Program, pname: gl::GLenum) -> gl::GLint {
        let mut param: gl::GLint = 0;
        unsafe { (self.glGetProgramiv)(program.get(), pname, &mut param) };
        param
    }

    unsafe fn get_shader_info_log(&self, shader: Self::Shader) -> String {
        let len = unsafe { self.get_shader_parameter(shader, gl::INFO_LOG_LENGTH) };
        if len <= 0 {
            return String::new();
        }
        let mut info_log = vec![0u8; len as usize];
        let mut written: gl::GLsizei = 0;
        unsafe {
            (self.glGetShaderInfoLog)(
                shader.get(),
                len,
                &mut written,
                info_log.as_mut_ptr() as *mut gl::GLchar,
            )
        };
        info_log_to_string(info_log, written)
    }

    #[inline]
    unsafe fn get_shader_parameter(&self, shader: Self::Shader, pname: gl::GLenum) -> gl::GLint {
        let mut param: gl::GLint = 0;
        unsafe { (self.glGetShaderiv)(shader.get(), pname, &mut param) };
        param
    }

    unsafe fn get_string(&self, name: gl::GLenum) -> anyhow::Result<String> {
        let ptr = unsafe { (self.glGetString)(name) };
        if ptr.is_null() {
            return Err(anyhow!("could not get string (name 0x{name:x})"));
        }
        unsafe { CStr::from_ptr(ptr.cast()) }
            .to_str()
            .context("invalid string")
            .map(str::to_string)
    }

    #[inline]
    unsafe fn link_program(&self, program: Self::Program) {
        unsafe { (self.glLinkProgram)(program.get()) };
    }

    #[inline]
    unsafe fn read_pixels(
        &self,
        x: gl::GLint,
        y: gl::GLint,
        width: gl::GLsizei,
        height: gl::GLsizei,
        format: gl::GLenum,
        r#type: gl::GLenum,
        pixels: *mut c_void,
    ) {
        unsafe { (self.glReadPixels)(x, y, width, height, format, r#type, pixels) };
    }

    #[inline]
    unsafe fn shader_source(&self, shader: Self::Shader, source: &str) {
        // NOTE: explicit length, the source does not need to be nul-terminated.
        let ptr = source.as_ptr() as *const gl::GLchar;
        let len = source.len() as gl::GLint;
        unsafe { (self.glShaderSource)(shader.get(), 1, &ptr, &len) };
    }

    #[inline]
    unsafe fn use_program(&self, program: Option<Self::Program>) {
        unsafe { (self.glUseProgram)(program.map_or(0, |v| v.get())) };
    }

    #[inline]
    unsafe fn vertex_attrib_pointer(
        &self,
        index: gl::GLuint,
        size: gl::GLint,
        r#type: gl::GLenum,
        normalized: gl::GLboolean,
        stride: gl::GLsizei,
        pointer: *const c_void,
    ) {
        unsafe { (self.glVertexAttribPointer)(index, size, r#type, normalized, stride, pointer) };
    }

    #[inline]
    unsafe fn viewport(&self, x: gl::GLint, y: gl::GLint, width: gl::GLsizei, height: gl::GLsizei) {
        unsafe { (self.glViewport)(x, y, width, height) };
    }
}

#[test]
fn test_info_log_to_string() {
    let log = b"0:3(1): error: syntax error\n\0".to_vec();
    let len = log.len() as gl::GLsizei;
    assert_eq!(info_log_to_string(log, len), "0:3(1): error: syntax error");

    // NOTE: drivers report `written` without the terminator.
    let log = b"warning\0\0\0".to_vec();
    assert_eq!(info_log_to_string(log, 7), "warning");

    assert_eq!(info_log_to_string(vec![0; 4], 0), "");
}
