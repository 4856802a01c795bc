use std::ffi::{CStr, c_void};
use std::{error, fmt};

use anyhow::Context as _;
use scopeguard::ScopeGuard;

pub const COMPONENTS_PER_VERTEX: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_type(self) -> gl::GLenum {
        match self {
            Self::Vertex => gl::VERTEX_SHADER,
            Self::Fragment => gl::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug)]
pub enum BuildError {
    Compile { stage: ShaderStage, info_log: String },
    Link { info_log: String },
    MissingAttribute(&'static CStr),
}

impl error::Error for BuildError {}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile { stage, info_log } => {
                write!(f, "could not compile {stage} shader: {info_log}")
            }
            Self::Link { info_log } => write!(f, "could not link program: {info_log}"),
            Self::MissingAttribute(name) => {
                write!(f, "program has no active attribute {name:?}")
            }
        }
    }
}

/// everything needed to put one mesh with one program on the gpu.
#[derive(Debug, Clone, Copy)]
pub struct PipelineDesc {
    pub vertex_source: &'static str,
    pub fragment_source: &'static str,
    pub position_attrib: &'static CStr,
    /// tightly packed xyz positions.
    pub vertices: &'static [f32],
}

/// on failure the shader is deleted and the driver's info log is returned in
/// [`BuildError::Compile`].
pub fn compile_shader<A: gl::Adapter>(
    gl_api: &A,
    stage: ShaderStage,
    source: &str,
) -> anyhow::Result<A::Shader> {
    let shader = unsafe { gl_api.create_shader(stage.gl_type()) }
        .with_context(|| format!("could not create {stage} shader"))?;
    unsafe {
        gl_api.shader_source(shader, source);
        gl_api.compile_shader(shader);
    }

    let status = unsafe { gl_api.get_shader_parameter(shader, gl::COMPILE_STATUS) };
    if status == gl::FALSE as gl::GLint {
        let info_log = unsafe { gl_api.get_shader_info_log(shader) };
        unsafe { gl_api.delete_shader(shader) };
        return Err(BuildError::Compile { stage, info_log }.into());
    }

    Ok(shader)
}

/// on failure the program is deleted; shaders are left to the caller.
pub fn link_program<A: gl::Adapter>(
    gl_api: &A,
    vertex_shader: A::Shader,
    fragment_shader: A::Shader,
) -> anyhow::Result<A::Program> {
    let program = unsafe { gl_api.create_program() }?;
    unsafe {
        gl_api.attach_shader(program, vertex_shader);
        gl_api.attach_shader(program, fragment_shader);
        gl_api.link_program(program);
    }

    let status = unsafe { gl_api.get_program_parameter(program, gl::LINK_STATUS) };
    if status == gl::FALSE as gl::GLint {
        let info_log = unsafe { gl_api.get_program_info_log(program) };
        unsafe { gl_api.delete_program(program) };
        return Err(BuildError::Link { info_log }.into());
    }

    Ok(program)
}

/// gpu objects for drawing one mesh. they are released exactly once, on drop,
/// in this order: buffer, program, vertex shader, fragment shader.
pub struct Pipeline<'gl, A: gl::Adapter> {
    gl_api: &'gl A,
    pub program: A::Program,
    pub vertex_shader: A::Shader,
    pub fragment_shader: A::Shader,
    pub vertex_buffer: A::Buffer,
    pub position_attrib: &'static CStr,
    pub vertex_count: gl::GLsizei,
}

impl<'gl, A: gl::Adapter> Pipeline<'gl, A> {
    pub fn build(gl_api: &'gl A, desc: &PipelineDesc) -> anyhow::Result<Self> {
        assert_eq!(desc.vertices.len() % COMPONENTS_PER_VERTEX, 0);

        let vertex_shader = scopeguard::guard(
            compile_shader(gl_api, ShaderStage::Vertex, desc.vertex_source)?,
            |shader| unsafe { gl_api.delete_shader(shader) },
        );
        let fragment_shader = scopeguard::guard(
            compile_shader(gl_api, ShaderStage::Fragment, desc.fragment_source)?,
            |shader| unsafe { gl_api.delete_shader(shader) },
        );
        let program = scopeguard::guard(
            link_program(gl_api, *vertex_shader, *fragment_shader)?,
            |program| unsafe { gl_api.delete_program(program) },
        );
        log::debug!("linked program {:?}", *program);

        if unsafe { gl_api.get_attrib_location(*program, desc.position_attrib) }.is_none() {
            return Err(BuildError::MissingAttribute(desc.position_attrib).into());
        }

        let vertex_buffer = unsafe { gl_api.create_buffer() }?;
        unsafe {
            gl_api.bind_buffer(gl::ARRAY_BUFFER, Some(vertex_buffer));
            gl_api.buffer_data(
                gl::ARRAY_BUFFER,
                size_of_val(desc.vertices) as gl::GLsizeiptr,
                desc.vertices.as_ptr() as *const c_void,
                gl::STATIC_DRAW,
            );
        }
        if let Some(err) = unsafe { gl_api.get_error() } {
            log::debug!("gl error 0x{err:x} after vertex upload");
        }

        Ok(Self {
            gl_api,
            program: ScopeGuard::into_inner(program),
            fragment_shader: ScopeGuard::into_inner(fragment_shader),
            vertex_shader: ScopeGuard::into_inner(vertex_shader),
            vertex_buffer,
            position_attrib: desc.position_attrib,
            vertex_count: (desc.vertices.len() / COMPONENTS_PER_VERTEX) as gl::GLsizei,
        })
    }
}

impl<A: gl::Adapter> Drop for Pipeline<'_, A> {
    fn drop(&mut self) {
        log::debug!("releasing pipeline");
        unsafe {
            self.gl_api.delete_buffer(self.vertex_buffer);
            self.gl_api.delete_program(self.program);
            self.gl_api.delete_shader(self.vertex_shader);
            self.gl_api.delete_shader(self.fragment_shader);
        }
    }
}
