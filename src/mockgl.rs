//! recording [`gl::Adapter`] that needs no gpu.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::{CStr, c_void};
use std::rc::Rc;

use anyhow::anyhow;

pub type Object = u32;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    AttachShader(Object, Object),
    BindBuffer(gl::GLenum, Option<Object>),
    BufferData {
        target: gl::GLenum,
        data: Vec<f32>,
        usage: gl::GLenum,
    },
    Clear(gl::GLbitfield),
    ClearColor([f32; 4]),
    CompileShader(Object),
    CreateBuffer(Object),
    CreateProgram(Object),
    CreateShader(gl::GLenum, Object),
    DeleteBuffer(Object),
    DeleteProgram(Object),
    DeleteShader(Object),
    DisableVertexAttribArray(gl::GLuint),
    DrawArrays(gl::GLenum, gl::GLint, gl::GLsizei),
    EnableVertexAttribArray(gl::GLuint),
    GetAttribLocation(Object, String),
    GetError(Option<gl::GLenum>),
    LinkProgram(Object),
    ReadPixels {
        x: gl::GLint,
        y: gl::GLint,
        width: gl::GLsizei,
        height: gl::GLsizei,
    },
    ShaderSource(Object, String),
    UseProgram(Option<Object>),
    VertexAttribPointer {
        index: gl::GLuint,
        size: gl::GLint,
        r#type: gl::GLenum,
        normalized: gl::GLboolean,
        stride: gl::GLsizei,
        offset: usize,
    },
    Viewport(gl::GLint, gl::GLint, gl::GLsizei, gl::GLsizei),
}

pub struct MockGl {
    /// shader type whose compilation fails.
    pub fail_compile: Option<gl::GLenum>,
    pub fail_link: bool,
    /// active attributes of every linked program.
    pub attribs: Vec<(&'static CStr, gl::GLint)>,
    /// rgba every read_pixels call returns.
    pub pixel: [u8; 4],
    /// returned (once) by the next get_error call.
    pub error: Cell<Option<gl::GLenum>>,
    /// deletions are also written here, to interleave them with other teardown steps.
    pub journal: Option<Rc<RefCell<Vec<String>>>>,

    calls: RefCell<Vec<Call>>,
    next_object: Cell<Object>,
    shader_types: RefCell<BTreeMap<Object, gl::GLenum>>,
    live: RefCell<BTreeSet<Object>>,
    enabled_attribs: RefCell<BTreeSet<gl::GLuint>>,
}

impl MockGl {
    pub const COMPILE_LOG: &'static str = "0:1(1): error: mock compile failure";
    pub const LINK_LOG: &'static str = "error: mock link failure";

    pub fn new() -> Self {
        Self {
            fail_compile: None,
            fail_link: false,
            attribs: vec![(c"position", 0)],
            pixel: [255, 0, 0, 255],
            error: Cell::new(None),
            journal: None,

            calls: RefCell::new(Vec::new()),
            next_object: Cell::new(1),
            shader_types: RefCell::new(BTreeMap::new()),
            live: RefCell::new(BTreeSet::new()),
            enabled_attribs: RefCell::new(BTreeSet::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// objects created and not yet deleted.
    pub fn live_objects(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn enabled_attribs(&self) -> usize {
        self.enabled_attribs.borrow().len()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn alloc(&self) -> Object {
        let object = self.next_object.get();
        self.next_object.set(object + 1);
        self.live.borrow_mut().insert(object);
        object
    }

    fn release(&self, kind: &str, object: Object) {
        assert!(self.live.borrow_mut().remove(&object), "double delete of {object}");
        if let Some(journal) = self.journal.as_ref() {
            journal.borrow_mut().push(format!("delete {kind}"));
        }
    }
}

impl gl::Adapter for MockGl {
    type Buffer = Object;
    type Program = Object;
    type Shader = Object;

    unsafe fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        self.record(Call::AttachShader(program, shader));
    }

    unsafe fn bind_buffer(&self, target: gl::GLenum, buffer: Option<Self::Buffer>) {
        self.record(Call::BindBuffer(target, buffer));
    }

    unsafe fn buffer_data(
        &self,
        target: gl::GLenum,
        size: gl::GLsizeiptr,
        data: *const c_void,
        usage: gl::GLenum,
    ) {
        let len = size as usize / size_of::<f32>();
        let data = unsafe { std::slice::from_raw_parts(data as *const f32, len) }.to_vec();
        self.record(Call::BufferData {
            target,
            data,
            usage,
        });
    }

    unsafe fn clear(&self, mask: gl::GLbitfield) {
        self.record(Call::Clear(mask));
    }

    unsafe fn clear_color(
        &self,
        red: gl::GLfloat,
        green: gl::GLfloat,
        blue: gl::GLfloat,
        alpha: gl::GLfloat,
    ) {
        self.record(Call::ClearColor([red, green, blue, alpha]));
    }

    unsafe fn compile_shader(&self, shader: Self::Shader) {
        self.record(Call::CompileShader(shader));
    }

    unsafe fn create_buffer(&self) -> anyhow::Result<Self::Buffer> {
        let buffer = self.alloc();
        self.record(Call::CreateBuffer(buffer));
        Ok(buffer)
    }

    unsafe fn create_program(&self) -> anyhow::Result<Self::Program> {
        let program = self.alloc();
        self.record(Call::CreateProgram(program));
        Ok(program)
    }

    unsafe fn create_shader(&self, r#type: gl::GLenum) -> anyhow::Result<Self::Shader> {
        if r#type != gl::VERTEX_SHADER && r#type != gl::FRAGMENT_SHADER {
            return Err(anyhow!("invalid shader type 0x{:x}", r#type));
        }
        let shader = self.alloc();
        self.shader_types.borrow_mut().insert(shader, r#type);
        self.record(Call::CreateShader(r#type, shader));
        Ok(shader)
    }

    unsafe fn delete_buffer(&self, buffer: Self::Buffer) {
        self.release("buffer", buffer);
        self.record(Call::DeleteBuffer(buffer));
    }

    unsafe fn delete_program(&self, program: Self::Program) {
        self.release("program", program);
        self.record(Call::DeleteProgram(program));
    }

    unsafe fn delete_shader(&self, shader: Self::Shader) {
        self.release("shader", shader);
        self.record(Call::DeleteShader(shader));
    }

    unsafe fn disable_vertex_attrib_array(&self, index: gl::GLuint) {
        self.enabled_attribs.borrow_mut().remove(&index);
        self.record(Call::DisableVertexAttribArray(index));
    }

    unsafe fn draw_arrays(&self, mode: gl::GLenum, first: gl::GLint, count: gl::GLsizei) {
        self.record(Call::DrawArrays(mode, first, count));
    }

    unsafe fn enable_vertex_attrib_array(&self, index: gl::GLuint) {
        self.enabled_attribs.borrow_mut().insert(index);
        self.record(Call::EnableVertexAttribArray(index));
    }

    unsafe fn get_attrib_location(&self, program: Self::Program, name: &CStr) -> Option<gl::GLint> {
        self.record(Call::GetAttribLocation(
            program,
            name.to_string_lossy().into_owned(),
        ));
        self.attribs
            .iter()
            .find(|(attrib, _)| *attrib == name)
            .map(|(_, location)| *location)
    }

    unsafe fn get_error(&self) -> Option<gl::GLenum> {
        let error = self.error.take();
        self.record(Call::GetError(error));
        error
    }

    unsafe fn get_program_info_log(&self, _program: Self::Program) -> String {
        if self.fail_link {
            Self::LINK_LOG.to_string()
        } else {
            String::new()
        }
    }

    unsafe fn get_program_parameter(&self, _program: Self::Program, pname: gl::GLenum) -> gl::GLint {
        match pname {
            gl::LINK_STATUS => (!self.fail_link) as gl::GLint,
            gl::INFO_LOG_LENGTH if self.fail_link => Self::LINK_LOG.len() as gl::GLint + 1,
            _ => 0,
        }
    }

    unsafe fn get_shader_info_log(&self, shader: Self::Shader) -> String {
        let r#type = self.shader_types.borrow().get(&shader).copied();
        if r#type.is_some() && r#type == self.fail_compile {
            Self::COMPILE_LOG.to_string()
        } else {
            String::new()
        }
    }

    unsafe fn get_shader_parameter(&self, shader: Self::Shader, pname: gl::GLenum) -> gl::GLint {
        let failing = {
            let r#type = self.shader_types.borrow().get(&shader).copied();
            r#type.is_some() && r#type == self.fail_compile
        };
        match pname {
            gl::COMPILE_STATUS => (!failing) as gl::GLint,
            gl::INFO_LOG_LENGTH if failing => Self::COMPILE_LOG.len() as gl::GLint + 1,
            _ => 0,
        }
    }

    unsafe fn get_string(&self, name: gl::GLenum) -> anyhow::Result<String> {
        Ok(format!("mock 0x{name:x}"))
    }

    unsafe fn link_program(&self, program: Self::Program) {
        self.record(Call::LinkProgram(program));
    }

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
        assert_eq!((format, r#type), (gl::RGBA, gl::UNSIGNED_BYTE));
        self.record(Call::ReadPixels {
            x,
            y,
            width,
            height,
        });
        let count = (width * height) as usize;
        let out = unsafe { std::slice::from_raw_parts_mut(pixels as *mut u8, count * 4) };
        for chunk in out.chunks_exact_mut(4) {
            chunk.copy_from_slice(&self.pixel);
        }
    }

    unsafe fn shader_source(&self, shader: Self::Shader, source: &str) {
        self.record(Call::ShaderSource(shader, source.to_string()));
    }

    unsafe fn use_program(&self, program: Option<Self::Program>) {
        self.record(Call::UseProgram(program));
    }

    unsafe fn vertex_attrib_pointer(
        &self,
        index: gl::GLuint,
        size: gl::GLint,
        r#type: gl::GLenum,
        normalized: gl::GLboolean,
        stride: gl::GLsizei,
        pointer: *const c_void,
    ) {
        self.record(Call::VertexAttribPointer {
            index,
            size,
            r#type,
            normalized,
            stride,
            offset: pointer as usize,
        });
    }

    unsafe fn viewport(&self, x: gl::GLint, y: gl::GLint, width: gl::GLsizei, height: gl::GLsizei) {
        self.record(Call::Viewport(x, y, width, height));
    }
}
