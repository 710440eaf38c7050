//! Safe wrapper over a live `emacs_env`, plus the load-time compatibility
//! checks.
//!
//! All `unsafe` needed to talk to Emacs is encapsulated here; the dispatch
//! layer works in terms of `Env`, `String` and `bool`.

use std::ffi::{CStr, CString};
use std::mem;

use libc::{c_char, c_void, ptrdiff_t};

use crate::raw::{emacs_env, emacs_function, emacs_runtime, emacs_value};

/// An `emacs_env` slot is only null if Emacs is older than the layout its
/// size tag claims, which the load-time check rules out.
macro_rules! env_fn {
    ($env:expr, $name:ident) => {
        unsafe { (*$env.raw).$name }.expect(concat!("emacs_env.", stringify!($name)))
    };
}

/// Borrowed handle to the environment of the current module call.
///
/// Valid only for the duration of that call; never stored.
#[derive(Clone, Copy)]
pub struct Env {
    raw: *mut emacs_env,
}

impl Env {
    /// # Safety
    /// `raw` must be the environment pointer Emacs passed to the current
    /// module call, and the returned handle must not outlive that call.
    pub unsafe fn new(raw: *mut emacs_env) -> Env {
        Env { raw }
    }

    pub fn intern(&self, name: &CStr) -> emacs_value {
        let f = env_fn!(self, intern);
        unsafe { f(self.raw, name.as_ptr()) }
    }

    /// Interned `t` or `nil`.
    pub fn boolean(&self, value: bool) -> emacs_value {
        self.intern(if value { c"t" } else { c"nil" })
    }

    pub fn make_integer(&self, value: i64) -> emacs_value {
        let f = env_fn!(self, make_integer);
        unsafe { f(self.raw, value) }
    }

    pub fn make_string(&self, value: &str) -> emacs_value {
        let f = env_fn!(self, make_string);
        // Our own messages never contain NUL; fall back to empty if one does.
        let c = CString::new(value).unwrap_or_default();
        unsafe { f(self.raw, c.as_ptr(), c.as_bytes().len() as ptrdiff_t) }
    }

    /// Export a Lisp string via the mandatory probe-then-copy protocol:
    /// first call reports the required buffer size (trailing NUL included),
    /// second call fills a buffer of exactly that size. The probe is never
    /// skipped, even for empty strings.
    pub fn copy_string(&self, value: emacs_value) -> Result<String, StringError> {
        let f = env_fn!(self, copy_string_contents);

        let mut size: ptrdiff_t = 0;
        let probed = unsafe { f(self.raw, value, std::ptr::null_mut(), &mut size) };
        if !probed {
            return Err(StringError::NotAString);
        }

        let mut buf = vec![0u8; size as usize];
        let copied = unsafe { f(self.raw, value, buf.as_mut_ptr() as *mut c_char, &mut size) };
        if !copied {
            return Err(StringError::CopyFailed);
        }

        // Drop the trailing NUL the size accounts for.
        if buf.last() == Some(&0) {
            buf.pop();
        }
        String::from_utf8(buf).map_err(|_| StringError::InvalidUtf8)
    }

    pub fn make_function(
        &self,
        min_arity: ptrdiff_t,
        max_arity: ptrdiff_t,
        function: emacs_function,
        doc: &CStr,
        data: *mut c_void,
    ) -> emacs_value {
        let f = env_fn!(self, make_function);
        unsafe { f(self.raw, min_arity, max_arity, function, doc.as_ptr(), data) }
    }

    pub fn funcall(&self, function: emacs_value, args: &mut [emacs_value]) -> emacs_value {
        let f = env_fn!(self, funcall);
        unsafe {
            f(
                self.raw,
                function,
                args.len() as ptrdiff_t,
                args.as_mut_ptr(),
            )
        }
    }

    /// Bind `name` to `function` via `defalias`, making it callable from
    /// Lisp.
    pub fn defalias(&self, name: &CStr, function: emacs_value) {
        let defalias = self.intern(c"defalias");
        let mut args = [self.intern(name), function];
        self.funcall(defalias, &mut args);
    }

    /// Raise a Lisp `error` carrying `message` and return `nil`. Emacs
    /// ignores the return value of a call with a pending non-local exit; the
    /// `nil` is interned before signalling so it is a real value either way.
    pub fn signal_message(&self, message: &str) -> emacs_value {
        let nil = self.intern(c"nil");
        let error = self.intern(c"error");
        let mut payload = [self.make_string(message)];
        let data = self.funcall(self.intern(c"list"), &mut payload);
        let f = env_fn!(self, non_local_exit_signal);
        unsafe { f(self.raw, error, data) };
        nil
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum StringError {
    /// The size probe failed: the value is not a string.
    NotAString,
    /// The probe succeeded but the copy did not.
    CopyFailed,
    /// Emacs handed back bytes that do not decode as UTF-8.
    InvalidUtf8,
}

impl std::fmt::Display for StringError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StringError::NotAString => write!(f, "startup option is not a string"),
            StringError::CopyFailed => write!(f, "copying string contents failed"),
            StringError::InvalidUtf8 => write!(f, "string contents are not valid UTF-8"),
        }
    }
}

impl std::error::Error for StringError {}

/// Why the host was rejected at load time.
#[derive(Debug, PartialEq, Eq)]
pub enum Incompatible {
    /// The `emacs_runtime` descriptor is smaller than the one this module
    /// was built against.
    Runtime,
    /// The `emacs_env` descriptor is smaller than the module-25 layout.
    Environment,
}

impl std::fmt::Display for Incompatible {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Incompatible::Runtime => write!(f, "emacs runtime descriptor too small"),
            Incompatible::Environment => write!(f, "emacs environment descriptor too small"),
        }
    }
}

impl std::error::Error for Incompatible {}

pub fn runtime_compatible(size: ptrdiff_t) -> bool {
    size >= mem::size_of::<emacs_runtime>() as ptrdiff_t
}

pub fn env_compatible(size: ptrdiff_t) -> bool {
    size >= mem::size_of::<emacs_env>() as ptrdiff_t
}

/// Check both size tags and hand back the environment pointer.
///
/// # Safety
/// `rt` must be the pointer Emacs passed to `emacs_module_init`.
pub unsafe fn environment(rt: *mut emacs_runtime) -> Result<*mut emacs_env, Incompatible> {
    if !runtime_compatible(unsafe { (*rt).size }) {
        return Err(Incompatible::Runtime);
    }
    let get_environment =
        unsafe { (*rt).get_environment }.expect("emacs_runtime.get_environment");
    let env = unsafe { get_environment(rt) };
    if !env_compatible(unsafe { (*env).size }) {
        return Err(Incompatible::Environment);
    }
    Ok(env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_size_checks() {
        let rt_size = mem::size_of::<emacs_runtime>() as ptrdiff_t;
        assert!(runtime_compatible(rt_size));
        assert!(runtime_compatible(rt_size + 64));
        assert!(!runtime_compatible(rt_size - 1));
        assert!(!runtime_compatible(0));

        let env_size = mem::size_of::<emacs_env>() as ptrdiff_t;
        assert!(env_compatible(env_size));
        assert!(env_compatible(env_size + 8));
        assert!(!env_compatible(env_size - 8));
    }

    #[test]
    fn incompatibility_messages() {
        assert_eq!(
            Incompatible::Runtime.to_string(),
            "emacs runtime descriptor too small"
        );
        assert_eq!(
            Incompatible::Environment.to_string(),
            "emacs environment descriptor too small"
        );
    }
}
