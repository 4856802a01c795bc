use std::ffi::CStr;

use crate::pipeline::PipelineDesc;

pub const VERTEX_SHADER_SOURCE: &str = "\
attribute vec4 position;
void main() {
    gl_Position = position;
}
";

pub const FRAGMENT_SHADER_SOURCE: &str = "\
precision mediump float;
void main() {
    gl_FragColor = vec4(1.0, 0.0, 0.0, 1.0);
}
";

pub const POSITION_ATTRIB: &CStr = c"position";

/// top, bottom-left, bottom-right. clip space, z = 0.
#[rustfmt::skip]
pub const TRIANGLE_VERTICES: [f32; 9] = [
     0.0,  0.5, 0.0,
    -0.5, -0.5, 0.0,
     0.5, -0.5, 0.0,
];

pub const TRIANGLE: PipelineDesc = PipelineDesc {
    vertex_source: VERTEX_SHADER_SOURCE,
    fragment_source: FRAGMENT_SHADER_SOURCE,
    position_attrib: POSITION_ATTRIB,
    vertices: &TRIANGLE_VERTICES,
};
