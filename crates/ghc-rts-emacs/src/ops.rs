//! The Lisp-facing operation surface: trampolines, registration, and the
//! boundary translation of statuses and booleans to interned symbols.
//!
//! Everything is generic over the `RtsRuntime` seam so the whole dispatch
//! path can be exercised in tests with a fake runtime and a fake
//! environment; the loadable module instantiates it with the real GHC
//! bindings.

use std::ffi::CStr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};

use libc::{c_void, ptrdiff_t};

use ghc_rts_core::{Lifecycle, RtsRuntime, RtsStatus};

use crate::env::{environment, Env};
use crate::raw::{emacs_env, emacs_runtime, emacs_value, EMACS_VARIADIC_FUNCTION};

/// Module-owned state: the one lifecycle controller for this process.
///
/// Emacs dispatches module calls from a single thread, but the contract with
/// the RTS requires init/shutdown and status transitions to be serialized
/// even if a host ever dispatches natively from more than one, so the
/// controller sits behind a mutex regardless.
pub struct ModuleState<R> {
    lifecycle: Mutex<Lifecycle<R>>,
}

impl<R: RtsRuntime> ModuleState<R> {
    pub fn new(runtime: R) -> Self {
        ModuleState {
            lifecycle: Mutex::new(Lifecycle::new(runtime)),
        }
    }
}

/// Status keywords as seen from Lisp. Keywords are self-quoting, so callers
/// can compare the return values against literals.
pub fn status_keyword(status: RtsStatus) -> &'static CStr {
    match status {
        RtsStatus::NotInitialized => c":not-initialized",
        RtsStatus::Initialized => c":initialized",
        RtsStatus::Exited => c":exited",
    }
}

/// Perform the load-time handshake and register every operation.
///
/// Rejects the host (returns `-1`) if either size-tagged descriptor is
/// smaller than the layout this module was built against; nothing is
/// registered in that case. On success the controller is created with
/// `runtime`, leaked for the process lifetime, and handed to each operation
/// through its data pointer.
///
/// # Safety
/// `rt` must be the pointer Emacs passed to `emacs_module_init`, and this
/// must only be called from that context.
pub unsafe fn init_module<R: RtsRuntime + 'static>(rt: *mut emacs_runtime, runtime: R) -> i32 {
    let raw_env = match unsafe { environment(rt) } {
        Ok(env) => env,
        Err(_) => return -1,
    };
    let env = unsafe { Env::new(raw_env) };
    let state: &'static ModuleState<R> = Box::leak(Box::new(ModuleState::new(runtime)));
    register(env, state);
    0
}

/// Register the seven operations under their fixed Lisp names.
pub fn register<R: RtsRuntime>(env: Env, state: &'static ModuleState<R>) {
    let data = state as *const ModuleState<R> as *mut c_void;
    let defun = |name: &CStr,
                     min: ptrdiff_t,
                     max: ptrdiff_t,
                     function: unsafe extern "C" fn(
        *mut emacs_env,
        ptrdiff_t,
        *mut emacs_value,
        *mut c_void,
    ) -> emacs_value,
                     doc: &CStr| {
        let f = env.make_function(min, max, Some(function), doc, data);
        env.defalias(name, f);
    };

    defun(
        c"initialize-runtime",
        0,
        EMACS_VARIADIC_FUNCTION,
        op_initialize::<R>,
        c"Initialize the GHC runtime system with the given startup options.\n\
          A second call is a no-op that ignores its arguments.\n\
          Returns one of :not-initialized, :initialized or :exited.",
    );
    defun(
        c"get-runtime-status",
        0,
        0,
        op_status::<R>,
        c"Get the status of the GHC runtime system.\n\
          Returns one of :not-initialized, :initialized or :exited.",
    );
    defun(
        c"exit-runtime",
        0,
        0,
        op_exit::<R>,
        c"Shut the GHC runtime system down. Irreversible for this process.\n\
          Returns one of :not-initialized, :initialized or :exited.",
    );
    defun(
        c"is-profiled",
        0,
        0,
        op_is_profiled::<R>,
        c"Return t if the GHC runtime system is profiled.",
    );
    defun(
        c"is-dynamically-linked",
        0,
        0,
        op_is_dynamic::<R>,
        c"Return t if the GHC runtime system is dynamically linked.",
    );
    defun(
        c"allocation-count",
        0,
        0,
        op_allocations::<R>,
        c"Return the number of bytes the GHC runtime system has allocated.",
    );
    defun(
        c"stats-enabled",
        0,
        0,
        op_stats_enabled::<R>,
        c"Return t if GHC runtime system statistics are enabled.",
    );
}

/// Shared trampoline plumbing: rebuild the env handle, fetch the controller
/// behind its lock, and keep panics from unwinding into Emacs.
fn with_state<R: RtsRuntime>(
    raw: *mut emacs_env,
    data: *mut c_void,
    f: impl FnOnce(Env, &mut Lifecycle<R>) -> emacs_value,
) -> emacs_value {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let env = unsafe { Env::new(raw) };
        let state = unsafe { &*(data as *const ModuleState<R>) };
        let mut lifecycle = state
            .lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(env, &mut lifecycle)
    }));
    match outcome {
        Ok(value) => value,
        Err(_) => {
            let env = unsafe { Env::new(raw) };
            env.signal_message("panic inside ghc-rts module function")
        }
    }
}

unsafe extern "C" fn op_initialize<R: RtsRuntime>(
    raw: *mut emacs_env,
    nargs: ptrdiff_t,
    args: *mut emacs_value,
    data: *mut c_void,
) -> emacs_value {
    with_state::<R>(raw, data, |env, lifecycle| {
        let status = match lifecycle.status() {
            RtsStatus::NotInitialized => {
                let mut options = Vec::with_capacity(nargs as usize);
                for i in 0..nargs as usize {
                    let value = unsafe { *args.add(i) };
                    match env.copy_string(value) {
                        Ok(s) => options.push(s),
                        Err(err) => return env.signal_message(&err.to_string()),
                    }
                }
                match lifecycle.initialize(&options) {
                    Ok(outcome) => outcome.status(),
                    Err(err) => return env.signal_message(&err.to_string()),
                }
            }
            // Already terminal: report status without reading the argument
            // list at all, matching the documented no-op.
            terminal => terminal,
        };
        env.intern(status_keyword(status))
    })
}

unsafe extern "C" fn op_status<R: RtsRuntime>(
    raw: *mut emacs_env,
    _nargs: ptrdiff_t,
    _args: *mut emacs_value,
    data: *mut c_void,
) -> emacs_value {
    with_state::<R>(raw, data, |env, lifecycle| {
        env.intern(status_keyword(lifecycle.status()))
    })
}

unsafe extern "C" fn op_exit<R: RtsRuntime>(
    raw: *mut emacs_env,
    _nargs: ptrdiff_t,
    _args: *mut emacs_value,
    data: *mut c_void,
) -> emacs_value {
    with_state::<R>(raw, data, |env, lifecycle| {
        env.intern(status_keyword(lifecycle.exit()))
    })
}

unsafe extern "C" fn op_is_profiled<R: RtsRuntime>(
    raw: *mut emacs_env,
    _nargs: ptrdiff_t,
    _args: *mut emacs_value,
    data: *mut c_void,
) -> emacs_value {
    with_state::<R>(raw, data, |env, lifecycle| {
        env.boolean(lifecycle.runtime().is_profiled())
    })
}

unsafe extern "C" fn op_is_dynamic<R: RtsRuntime>(
    raw: *mut emacs_env,
    _nargs: ptrdiff_t,
    _args: *mut emacs_value,
    data: *mut c_void,
) -> emacs_value {
    with_state::<R>(raw, data, |env, lifecycle| {
        env.boolean(lifecycle.runtime().is_dynamic())
    })
}

unsafe extern "C" fn op_allocations<R: RtsRuntime>(
    raw: *mut emacs_env,
    _nargs: ptrdiff_t,
    _args: *mut emacs_value,
    data: *mut c_void,
) -> emacs_value {
    with_state::<R>(raw, data, |env, lifecycle| {
        env.make_integer(lifecycle.runtime().allocations() as i64)
    })
}

unsafe extern "C" fn op_stats_enabled<R: RtsRuntime>(
    raw: *mut emacs_env,
    _nargs: ptrdiff_t,
    _args: *mut emacs_value,
    data: *mut c_void,
) -> emacs_value {
    with_state::<R>(raw, data, |env, lifecycle| {
        env.boolean(lifecycle.runtime().stats_enabled())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_cover_every_status() {
        assert_eq!(
            status_keyword(RtsStatus::NotInitialized).to_str().unwrap(),
            ":not-initialized"
        );
        assert_eq!(
            status_keyword(RtsStatus::Initialized).to_str().unwrap(),
            ":initialized"
        );
        assert_eq!(
            status_keyword(RtsStatus::Exited).to_str().unwrap(),
            ":exited"
        );
    }
}
