//! Bindings to the GHC runtime system and the `RtsRuntime` impl over them.

use libc::{c_char, c_int};

use ghc_rts_core::{ArgvBuffer, RtsRuntime};

#[allow(non_snake_case)]
extern "C" {
    /// `hs_init` with `RtsOptsAll`: the full range of `+RTS` flags in the
    /// argument vector is honored, not just the safe subset.
    fn hs_init_with_rtsopts(argc: *mut c_int, argv: *mut *mut *mut c_char);
    fn hs_exit();
    fn rts_isProfiled() -> c_int;
    fn rts_isDynamic() -> c_int;
    fn getAllocations() -> u64;
    fn getRTSStatsEnabled() -> c_int;
}

/// The real runtime system. Initialization and shutdown are one-shot per
/// process; `Lifecycle` enforces that ordering.
pub struct GhcRts;

impl RtsRuntime for GhcRts {
    fn init(&mut self, argv: &mut ArgvBuffer) {
        // The initializer rewrites both count and table while stripping RTS
        // flags; the rewritten views die with these locals, the buffers with
        // the caller's frame.
        let mut argc = argv.argc();
        let mut table = argv.as_mut_ptr();
        unsafe { hs_init_with_rtsopts(&mut argc, &mut table) };
    }

    fn shutdown(&mut self) {
        unsafe { hs_exit() };
    }

    fn is_profiled(&self) -> bool {
        unsafe { rts_isProfiled() != 0 }
    }

    fn is_dynamic(&self) -> bool {
        unsafe { rts_isDynamic() != 0 }
    }

    fn allocations(&self) -> u64 {
        unsafe { getAllocations() }
    }

    fn stats_enabled(&self) -> bool {
        unsafe { getRTSStatsEnabled() != 0 }
    }
}
