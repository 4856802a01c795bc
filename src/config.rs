use x11::wrap::WindowAttrs;

#[derive(Debug, Clone)]
pub struct Config {
    pub width: u32,
    pub height: u32,
    pub title: &'static str,
    pub clear_color: [f32; 4],
    /// NONE-terminated, passed to eglChooseConfig as is.
    pub egl_config_attribs: [egl::EGLint; 17],
    pub egl_context_attribs: [egl::EGLint; 3],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "OpenGL Triangle",
            clear_color: [0.0, 0.0, 0.0, 1.0],
            #[rustfmt::skip]
            egl_config_attribs: [
                egl::SURFACE_TYPE, egl::WINDOW_BIT,
                egl::RENDERABLE_TYPE, egl::OPENGL_ES2_BIT,
                egl::RED_SIZE, 8,
                egl::GREEN_SIZE, 8,
                egl::BLUE_SIZE, 8,
                egl::ALPHA_SIZE, 8,
                egl::DEPTH_SIZE, 24,
                egl::STENCIL_SIZE, 8,
                egl::NONE,
            ],
            egl_context_attribs: [egl::CONTEXT_CLIENT_VERSION, 2, egl::NONE],
        }
    }
}

impl Config {
    pub fn window_attrs(&self) -> WindowAttrs {
        WindowAttrs {
            width: self.width,
            height: self.height,
            title: self.title.to_string(),
            resizable: false,
        }
    }

    /// center of the window in gl's bottom-left origin coordinates.
    pub fn center(&self) -> (i32, i32) {
        ((self.width / 2) as i32, (self.height / 2) as i32)
    }
}
