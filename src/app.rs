use anyhow::Context as _;
use gl::Adapter as _;

use crate::config::Config;
use crate::pipeline::Pipeline;
use crate::platform::Platform;
use crate::runloop::{self, ExitReason, PollFn};
use crate::{renderer, scene};

/// opens the display, sets up egl and gl on a fresh window, draws until the window is
/// closed or a key is pressed, then tears everything down.
///
/// locals are declared in teardown order (reversed), so a normal exit and every early
/// return release the same way: gl objects, un-current, surface, context, egl display,
/// window, x display. each of them at most once.
pub fn run<P: Platform>(platform: &P, config: &Config) -> anyhow::Result<ExitReason> {
    let display = platform.open_display()?;
    let window: P::Window<'_>;
    let egl = platform.connect(&display)?;

    let egl_config = platform.choose_config(&egl, &config.egl_config_attribs)?;
    window = platform.create_window(&display, &egl, egl_config, &config.window_attrs())?;

    let egl_context: P::Context<'_>;
    let egl_surface = platform.create_surface(&egl, &window, egl_config)?;
    egl_context = platform.create_context(&egl, egl_config, &config.egl_context_attribs)?;
    platform.make_current(&egl, &egl_surface, &egl_context)?;
    let _current = scopeguard::guard((), |()| platform.release_current(&egl));

    let gl_api = platform.load_gl(&egl)?;
    unsafe {
        gl_api.viewport(0, 0, config.width as gl::GLsizei, config.height as gl::GLsizei);
        let [r, g, b, a] = config.clear_color;
        gl_api.clear_color(r, g, b, a);
    }

    let pipeline =
        Pipeline::build(&gl_api, &scene::TRIANGLE).context("could not build triangle pipeline")?;

    let (center_x, center_y) = config.center();
    let mut frames: u64 = 0;
    let mut swap_failures: u64 = 0;
    let reason = runloop::run(&mut PollFn(|| platform.poll_event(&window)), || {
        renderer::draw_frame(&gl_api, &pipeline);
        if frames == 0 {
            let pixel = renderer::read_pixel(&gl_api, center_x, center_y);
            log::debug!("pixel at ({center_x}, {center_y}) after first frame: {pixel:?}");
        }
        frames += 1;

        // NOTE: a failed present is not fatal, the next frame tries again.
        if let Err(err) = platform.swap_buffers(&egl, &egl_surface) {
            if swap_failures == 0 {
                log::warn!("could not swap buffers: {err:#}");
            }
            swap_failures += 1;
        }
    });
    log::info!("drew {frames} frame(s)");
    if swap_failures > 0 {
        log::warn!("{swap_failures} swap(s) failed");
    }

    log::debug!("tearing down");
    Ok(reason)
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    use x11::wrap::{Event, WindowAttrs};

    use super::*;
    use crate::mockgl::MockGl;
    use crate::pipeline::BuildError;

    type Journal = Rc<RefCell<Vec<String>>>;

    /// writes `on_drop` to the journal when released.
    struct Held {
        journal: Journal,
        on_drop: &'static str,
    }

    impl Drop for Held {
        fn drop(&mut self) {
            self.journal.borrow_mut().push(self.on_drop.to_string());
        }
    }

    struct Recorder {
        journal: Journal,
        /// acquisition step that fails.
        fail_at: Option<&'static str>,
        fail_compile: Option<gl::GLenum>,
        events: RefCell<VecDeque<Option<Event>>>,
        swaps: Cell<usize>,
    }

    impl Recorder {
        fn new(events: impl IntoIterator<Item = Option<Event>>) -> Self {
            Self {
                journal: Journal::default(),
                fail_at: None,
                fail_compile: None,
                events: RefCell::new(events.into_iter().collect()),
                swaps: Cell::new(0),
            }
        }

        fn check(&self, name: &'static str) -> anyhow::Result<()> {
            self.journal.borrow_mut().push(name.to_string());
            if self.fail_at == Some(name) {
                anyhow::bail!("{name} failed");
            }
            Ok(())
        }

        fn step(&self, name: &'static str, on_drop: &'static str) -> anyhow::Result<Held> {
            self.check(name)?;
            Ok(Held {
                journal: self.journal.clone(),
                on_drop,
            })
        }

        fn journal(&self) -> Vec<String> {
            self.journal.borrow().clone()
        }
    }

    impl Platform for Recorder {
        type Display = Held;
        type Egl<'a> = Held;
        type Config = ();
        type Window<'a> = Held;
        type Surface<'a> = Held;
        type Context<'a> = Held;
        type Gl = MockGl;

        fn open_display(&self) -> anyhow::Result<Held> {
            self.step("open display", "close display")
        }

        fn connect<'a>(&'a self, _display: &'a Held) -> anyhow::Result<Held> {
            self.step("connect egl", "terminate egl")
        }

        fn choose_config(&self, _egl: &Held, attribs: &[egl::EGLint]) -> anyhow::Result<()> {
            assert!(egl::wrap::is_terminated(attribs));
            self.check("choose config")
        }

        fn create_window<'a>(
            &'a self,
            _display: &'a Held,
            _egl: &Held,
            _config: (),
            attrs: &WindowAttrs,
        ) -> anyhow::Result<Held> {
            assert_eq!((attrs.width, attrs.height), (800, 600));
            self.step("create window", "destroy window")
        }

        fn create_surface<'a>(
            &'a self,
            _egl: &'a Held,
            _window: &'a Held,
            _config: (),
        ) -> anyhow::Result<Held> {
            self.step("create surface", "destroy surface")
        }

        fn create_context<'a>(
            &'a self,
            _egl: &'a Held,
            _config: (),
            attribs: &[egl::EGLint],
        ) -> anyhow::Result<Held> {
            assert_eq!(attribs, [egl::CONTEXT_CLIENT_VERSION, 2, egl::NONE]);
            self.step("create context", "destroy context")
        }

        fn make_current(&self, _egl: &Held, _surface: &Held, _context: &Held) -> anyhow::Result<()> {
            self.check("make current")
        }

        fn release_current(&self, _egl: &Held) {
            self.journal.borrow_mut().push("release current".to_string());
        }

        fn load_gl(&self, _egl: &Held) -> anyhow::Result<MockGl> {
            self.check("load gl")?;
            let mut gl_api = MockGl::new();
            gl_api.fail_compile = self.fail_compile;
            gl_api.journal = Some(self.journal.clone());
            Ok(gl_api)
        }

        fn poll_event(&self, _window: &Held) -> Option<Event> {
            self.events
                .borrow_mut()
                .pop_front()
                .unwrap_or(Some(Event::CloseRequested))
        }

        fn swap_buffers(&self, _egl: &Held, _surface: &Held) -> anyhow::Result<()> {
            self.swaps.set(self.swaps.get() + 1);
            Ok(())
        }
    }

    const SETUP: [&str; 8] = [
        "open display",
        "connect egl",
        "choose config",
        "create window",
        "create surface",
        "create context",
        "make current",
        "load gl",
    ];

    const TEARDOWN: [&str; 10] = [
        "delete buffer",
        "delete program",
        "delete shader",
        "delete shader",
        "release current",
        "destroy surface",
        "destroy context",
        "terminate egl",
        "destroy window",
        "close display",
    ];

    #[test]
    fn test_key_press_runs_full_teardown_once() {
        let platform = Recorder::new([None, Some(Event::KeyPress { keycode: 9 })]);
        let reason = run(&platform, &Config::default()).unwrap();
        assert_eq!(reason, ExitReason::KeyPressed);
        assert_eq!(platform.swaps.get(), 1);

        let expected: Vec<&str> = SETUP.iter().chain(TEARDOWN.iter()).copied().collect();
        assert_eq!(platform.journal(), expected);
    }

    #[test]
    fn test_close_request_runs_same_teardown() {
        let platform = Recorder::new([None, None, Some(Event::Mapped)]);
        let reason = run(&platform, &Config::default()).unwrap();
        assert_eq!(reason, ExitReason::CloseRequested);
        assert_eq!(platform.swaps.get(), 2);
        assert!(platform.journal().ends_with(&TEARDOWN.map(String::from)));
    }

    #[test]
    fn test_context_failure_releases_what_was_acquired() {
        let mut platform = Recorder::new([]);
        platform.fail_at = Some("create context");
        let err = run(&platform, &Config::default()).err().unwrap();
        assert_eq!(err.to_string(), "create context failed");

        assert_eq!(
            platform.journal(),
            [
                "open display",
                "connect egl",
                "choose config",
                "create window",
                "create surface",
                "create context",
                "destroy surface",
                "terminate egl",
                "destroy window",
                "close display",
            ]
        );
    }

    #[test]
    fn test_egl_failure_closes_display() {
        let mut platform = Recorder::new([]);
        platform.fail_at = Some("connect egl");
        assert!(run(&platform, &Config::default()).is_err());
        assert_eq!(platform.journal(), ["open display", "connect egl", "close display"]);
    }

    #[test]
    fn test_shader_failure_unbinds_before_destroying_surface() {
        let mut platform = Recorder::new([]);
        platform.fail_compile = Some(gl::FRAGMENT_SHADER);
        let err = run(&platform, &Config::default()).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::Compile { .. })
        ));
        assert_eq!(platform.swaps.get(), 0);

        let journal = platform.journal();
        assert_eq!(journal[..SETUP.len()], SETUP);
        assert_eq!(
            journal[SETUP.len()..],
            [
                // the failed fragment shader, then the vertex shader.
                "delete shader",
                "delete shader",
                "release current",
                "destroy surface",
                "destroy context",
                "terminate egl",
                "destroy window",
                "close display",
            ]
        );
    }
}
