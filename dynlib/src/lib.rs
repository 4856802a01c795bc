use std::ffi::{CStr, c_void};
use std::mem::transmute_copy;
use std::ptr::NonNull;

use anyhow::anyhow;
use libc::{dlclose, dlerror, dlopen, dlsym};

/// takes the pending `dlerror` message, if any.
///
/// NOTE: the string returned by dlerror is owned by libc and may be overwritten by the next call,
/// it must be copied out and must never be freed.
fn take_dlerror() -> Option<String> {
    let err = unsafe { dlerror() };
    if err.is_null() {
        return None;
    }
    Some(
        unsafe { CStr::from_ptr(err) }
            .to_string_lossy()
            .into_owned(),
    )
}

pub struct DynLib(NonNull<c_void>);

impl DynLib {
    pub fn open(filename: &CStr) -> anyhow::Result<Self> {
        let handle = unsafe { dlopen(filename.as_ptr(), libc::RTLD_LAZY | libc::RTLD_LOCAL) };
        match NonNull::new(handle) {
            Some(handle) => Ok(Self(handle)),
            None => Err(anyhow!(
                take_dlerror().unwrap_or_else(|| format!("could not open {filename:?}"))
            )),
        }
    }

    /// tries each of the filenames in order, returns the first one that opens.
    ///
    /// distros don't agree on whether the unversioned `.so` symlink is installed (it usually comes
    /// with -dev packages), so loaders pass both the plain and the versioned soname.
    pub fn open_first(filenames: &[&CStr]) -> anyhow::Result<Self> {
        let mut errors = Vec::with_capacity(filenames.len());
        for filename in filenames {
            match Self::open(filename) {
                Ok(lib) => return Ok(lib),
                Err(err) => errors.push(err.to_string()),
            }
        }
        Err(anyhow!(errors.join("; ")))
    }

    /// NOTE: `F` must be a function pointer type (or a raw pointer), the symbol address is
    /// reinterpreted as `F` without any checks.
    pub fn lookup<F: Sized>(&self, name: &CStr) -> anyhow::Result<F> {
        assert_eq!(size_of::<F>(), size_of::<*mut c_void>());

        // NOTE: clear out whatever is pending, a null symbol is not an error by itself.
        _ = take_dlerror();

        let addr = unsafe { dlsym(self.0.as_ptr(), name.as_ptr()) };
        if let Some(err) = take_dlerror() {
            return Err(anyhow!(err));
        }
        if addr.is_null() {
            return Err(anyhow!("symbol {name:?} resolved to null"));
        }

        Ok(unsafe { transmute_copy(&addr) })
    }

    /// same as [`DynLib::lookup`], but for symbols that are allowed to be missing.
    pub fn lookup_optional<F: Sized>(&self, name: &CStr) -> Option<F> {
        self.lookup(name).ok()
    }
}

impl Drop for DynLib {
    fn drop(&mut self) {
        unsafe { dlclose(self.0.as_ptr()) };
    }
}

#[macro_export]
macro_rules! opaque_struct {
    ($name:ident) => {
        #[repr(C)]
        pub struct $name {
            _data: [u8; 0],
            _marker: std::marker::PhantomData<(*mut u8, std::marker::PhantomPinned)>,
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing() {
        let err = DynLib::open(c"libdoes-not-exist.so.42")
            .err()
            .expect("must fail");
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn test_open_first_reports_every_attempt() {
        let err = DynLib::open_first(&[c"libnope-a.so", c"libnope-b.so"])
            .err()
            .expect("must fail");
        let msg = err.to_string();
        assert!(msg.contains("libnope-a.so"), "{msg}");
        assert!(msg.contains("libnope-b.so"), "{msg}");
    }

    #[test]
    fn test_lookup_libc_symbol() {
        let lib = DynLib::open_first(&[c"libc.so.6", c"libc.so"]).expect("libc must be there");
        let strlen: unsafe extern "C" fn(*const libc::c_char) -> libc::size_t =
            lib.lookup(c"strlen").expect("strlen must be there");
        assert_eq!(unsafe { strlen(c"triangle".as_ptr()) }, 8);
        assert!(lib.lookup_optional::<*mut c_void>(c"no_such_symbol_here").is_none());
    }
}
