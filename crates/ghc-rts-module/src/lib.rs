//! The loadable Emacs module.
//!
//! Thin shell over `ghc-rts-emacs`: it supplies the real GHC runtime
//! bindings and the two symbols Emacs looks for in a module, the GPL
//! compatibility marker and `emacs_module_init`. The `hs_*`/`rts_*` imports
//! stay undefined in the `.so`; link the final artifact against `libHSrts`
//! (for example `RUSTFLAGS="-lHSrts-1.0.2"` with GHC's lib directory on the
//! search path).

use libc::c_int;

use ghc_rts_emacs::raw::emacs_runtime;

mod rts;

/// Emacs refuses to load modules that do not export this symbol.
#[allow(non_upper_case_globals)]
#[no_mangle]
pub static plugin_is_GPL_compatible: c_int = 0;

/// Module entry point: negotiate descriptor sizes, then register the
/// operation surface backed by the real RTS.
///
/// # Safety
/// Called by the Emacs module loader with a valid runtime descriptor.
#[no_mangle]
pub unsafe extern "C" fn emacs_module_init(rt: *mut emacs_runtime) -> c_int {
    unsafe { ghc_rts_emacs::init_module(rt, rts::GhcRts) }
}
