use std::ffi::c_void;
use std::ptr::null;

use crate::pipeline::{COMPONENTS_PER_VERTEX, Pipeline};

/// clears the color buffer and draws the pipeline's mesh. leaves no vertex attribute
/// array enabled, so calling it again issues the exact same sequence.
pub fn draw_frame<A: gl::Adapter>(gl_api: &A, pipeline: &Pipeline<'_, A>) {
    unsafe {
        gl_api.clear(gl::COLOR_BUFFER_BIT);
        gl_api.use_program(Some(pipeline.program));
        gl_api.bind_buffer(gl::ARRAY_BUFFER, Some(pipeline.vertex_buffer));

        let Some(location) = gl_api.get_attrib_location(pipeline.program, pipeline.position_attrib)
        else {
            log::warn!("attribute {:?} is not active", pipeline.position_attrib);
            return;
        };
        let location = location as gl::GLuint;

        gl_api.enable_vertex_attrib_array(location);
        gl_api.vertex_attrib_pointer(
            location,
            COMPONENTS_PER_VERTEX as gl::GLint,
            gl::FLOAT,
            gl::FALSE,
            0,
            null(),
        );
        gl_api.draw_arrays(gl::TRIANGLES, 0, pipeline.vertex_count);
        gl_api.disable_vertex_attrib_array(location);
    }
}

/// reads one rgba pixel from the current read surface. `y` counts from the bottom.
pub fn read_pixel<A: gl::Adapter>(gl_api: &A, x: gl::GLint, y: gl::GLint) -> [u8; 4] {
    let mut pixel = [0u8; 4];
    unsafe {
        gl_api.read_pixels(
            x,
            y,
            1,
            1,
            gl::RGBA,
            gl::UNSIGNED_BYTE,
            pixel.as_mut_ptr() as *mut c_void,
        )
    };
    pixel
}
