#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]

// https://gitlab.freedesktop.org/xorg/lib/libx11/-/blob/master/include/X11/Xlib.h
// https://gitlab.freedesktop.org/xorg/proto/xorgproto/-/blob/master/include/X11/X.h
//
// NOTE: only the bits that are needed to open a window, pick a visual and pump events.

use std::ffi::{c_char, c_int, c_long, c_uint, c_ulong, c_void};

use dynlib::{DynLib, opaque_struct};

opaque_struct!(Display);
opaque_struct!(Visual);

pub type XID = c_ulong;
pub type Atom = c_ulong;
pub type Bool = c_int;
pub type Colormap = XID;
pub type Cursor = XID;
pub type Pixmap = XID;
pub type Status = c_int;
pub type Time = c_ulong;
pub type VisualID = c_ulong;
pub type Window = XID;

pub const False: Bool = 0;
pub const True: Bool = 1;

// event types

pub const KeyPress: c_int = 2;
pub const KeyRelease: c_int = 3;
pub const Expose: c_int = 12;
pub const DestroyNotify: c_int = 17;
pub const UnmapNotify: c_int = 18;
pub const MapNotify: c_int = 19;
pub const ConfigureNotify: c_int = 22;
pub const ClientMessage: c_int = 33;

// event masks

pub const KeyPressMask: c_long = 1 << 0;
pub const ExposureMask: c_long = 1 << 15;
pub const StructureNotifyMask: c_long = 1 << 17;

// window attribute value mask bits

pub const CWBackPixel: c_ulong = 1 << 1;
pub const CWBorderPixel: c_ulong = 1 << 3;
pub const CWEventMask: c_ulong = 1 << 11;
pub const CWColormap: c_ulong = 1 << 13;

// window classes

pub const InputOutput: c_uint = 1;

// colormap alloc

pub const AllocNone: c_int = 0;

// XGetVisualInfo mask

pub const VisualIDMask: c_long = 0x1;

// size hints flags (Xutil.h)

pub const PMinSize: c_long = 1 << 4;
pub const PMaxSize: c_long = 1 << 5;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct XVisualInfo {
    pub visual: *mut Visual,
    pub visualid: VisualID,
    pub screen: c_int,
    pub depth: c_int,
    pub class: c_int,
    pub red_mask: c_ulong,
    pub green_mask: c_ulong,
    pub blue_mask: c_ulong,
    pub colormap_size: c_int,
    pub bits_per_rgb: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct XSetWindowAttributes {
    pub background_pixmap: Pixmap,
    pub background_pixel: c_ulong,
    pub border_pixmap: Pixmap,
    pub border_pixel: c_ulong,
    pub bit_gravity: c_int,
    pub win_gravity: c_int,
    pub backing_store: c_int,
    pub backing_planes: c_ulong,
    pub backing_pixel: c_ulong,
    pub save_under: Bool,
    pub event_mask: c_long,
    pub do_not_propagate_mask: c_long,
    pub override_redirect: Bool,
    pub colormap: Colormap,
    pub cursor: Cursor,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct XAspectRatio {
    pub x: c_int,
    pub y: c_int,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct XSizeHints {
    pub flags: c_long,
    pub x: c_int,
    pub y: c_int,
    pub width: c_int,
    pub height: c_int,
    pub min_width: c_int,
    pub min_height: c_int,
    pub max_width: c_int,
    pub max_height: c_int,
    pub width_inc: c_int,
    pub height_inc: c_int,
    pub min_aspect: XAspectRatio,
    pub max_aspect: XAspectRatio,
    pub base_width: c_int,
    pub base_height: c_int,
    pub win_gravity: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct XAnyEvent {
    pub r#type: c_int,
    pub serial: c_ulong,
    pub send_event: Bool,
    pub display: *mut Display,
    pub window: Window,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct XKeyEvent {
    pub r#type: c_int,
    pub serial: c_ulong,
    pub send_event: Bool,
    pub display: *mut Display,
    pub window: Window,
    pub root: Window,
    pub subwindow: Window,
    pub time: Time,
    pub x: c_int,
    pub y: c_int,
    pub x_root: c_int,
    pub y_root: c_int,
    pub state: c_uint,
    pub keycode: c_uint,
    pub same_screen: Bool,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct XClientMessageEvent {
    pub r#type: c_int,
    pub serial: c_ulong,
    pub send_event: Bool,
    pub display: *mut Display,
    pub window: Window,
    pub message_type: Atom,
    pub format: c_int,
    /// NOTE: in Xlib this is a union of `b: [c_char; 20]`, `s: [c_short; 10]` and
    /// `l: [c_long; 5]`; all of them have the same size, `l` is the only one used here.
    pub data: [c_long; 5],
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union XEvent {
    pub r#type: c_int,
    pub any: XAnyEvent,
    pub key: XKeyEvent,
    pub client_message: XClientMessageEvent,
    pub pad: [c_long; 24],
}

impl XEvent {
    pub fn zeroed() -> Self {
        Self { pad: [0; 24] }
    }

    pub fn get_type(&self) -> c_int {
        unsafe { self.r#type }
    }
}

pub struct Lib {
    pub XOpenDisplay: unsafe extern "C" fn(display_name: *const c_char) -> *mut Display,
    pub XCloseDisplay: unsafe extern "C" fn(display: *mut Display) -> c_int,
    pub XDisplayString: unsafe extern "C" fn(display: *mut Display) -> *mut c_char,
    pub XDefaultScreen: unsafe extern "C" fn(display: *mut Display) -> c_int,
    pub XDefaultRootWindow: unsafe extern "C" fn(display: *mut Display) -> Window,
    pub XGetVisualInfo: unsafe extern "C" fn(
        display: *mut Display,
        vinfo_mask: c_long,
        vinfo_template: *mut XVisualInfo,
        nitems_return: *mut c_int,
    ) -> *mut XVisualInfo,
    pub XFree: unsafe extern "C" fn(data: *mut c_void) -> c_int,
    pub XCreateColormap: unsafe extern "C" fn(
        display: *mut Display,
        w: Window,
        visual: *mut Visual,
        alloc: c_int,
    ) -> Colormap,
    pub XFreeColormap: unsafe extern "C" fn(display: *mut Display, colormap: Colormap) -> c_int,
    pub XCreateWindow: unsafe extern "C" fn(
        display: *mut Display,
        parent: Window,
        x: c_int,
        y: c_int,
        width: c_uint,
        height: c_uint,
        border_width: c_uint,
        depth: c_int,
        class: c_uint,
        visual: *mut Visual,
        valuemask: c_ulong,
        attributes: *mut XSetWindowAttributes,
    ) -> Window,
    pub XDestroyWindow: unsafe extern "C" fn(display: *mut Display, w: Window) -> c_int,
    pub XSetWMNormalHints:
        unsafe extern "C" fn(display: *mut Display, w: Window, hints: *mut XSizeHints),
    pub XInternAtom: unsafe extern "C" fn(
        display: *mut Display,
        atom_name: *const c_char,
        only_if_exists: Bool,
    ) -> Atom,
    pub XSetWMProtocols: unsafe extern "C" fn(
        display: *mut Display,
        w: Window,
        protocols: *mut Atom,
        count: c_int,
    ) -> Status,
    pub XMapWindow: unsafe extern "C" fn(display: *mut Display, w: Window) -> c_int,
    pub XStoreName:
        unsafe extern "C" fn(display: *mut Display, w: Window, window_name: *const c_char) -> c_int,
    pub XNextEvent: unsafe extern "C" fn(display: *mut Display, event_return: *mut XEvent) -> c_int,
    pub XPending: unsafe extern "C" fn(display: *mut Display) -> c_int,
    pub XSync: unsafe extern "C" fn(display: *mut Display, discard: Bool) -> c_int,

    _dynlib: DynLib,
}

impl Lib {
    pub fn load() -> anyhow::Result<Self> {
        let dynlib = DynLib::open_first(&[c"libX11.so", c"libX11.so.6"])?;

        Ok(Self {
            XOpenDisplay: dynlib.lookup(c"XOpenDisplay")?,
            XCloseDisplay: dynlib.lookup(c"XCloseDisplay")?,
            XDisplayString: dynlib.lookup(c"XDisplayString")?,
            XDefaultScreen: dynlib.lookup(c"XDefaultScreen")?,
            XDefaultRootWindow: dynlib.lookup(c"XDefaultRootWindow")?,
            XGetVisualInfo: dynlib.lookup(c"XGetVisualInfo")?,
            XFree: dynlib.lookup(c"XFree")?,
            XCreateColormap: dynlib.lookup(c"XCreateColormap")?,
            XFreeColormap: dynlib.lookup(c"XFreeColormap")?,
            XCreateWindow: dynlib.lookup(c"XCreateWindow")?,
            XDestroyWindow: dynlib.lookup(c"XDestroyWindow")?,
            XSetWMNormalHints: dynlib.lookup(c"XSetWMNormalHints")?,
            XInternAtom: dynlib.lookup(c"XInternAtom")?,
            XSetWMProtocols: dynlib.lookup(c"XSetWMProtocols")?,
            XMapWindow: dynlib.lookup(c"XMapWindow")?,
            XStoreName: dynlib.lookup(c"XStoreName")?,
            XNextEvent: dynlib.lookup(c"XNextEvent")?,
            XPending: dynlib.lookup(c"XPending")?,
            XSync: dynlib.lookup(c"XSync")?,

            _dynlib: dynlib,
        })
    }
}

#[test]
fn test_xevent_layout() {
    // NOTE: Xlib declares XEvent as a union padded out to 24 longs.
    assert_eq!(size_of::<XEvent>(), size_of::<c_long>() * 24);
    assert!(size_of::<XClientMessageEvent>() <= size_of::<XEvent>());
    assert!(size_of::<XKeyEvent>() <= size_of::<XEvent>());
}
