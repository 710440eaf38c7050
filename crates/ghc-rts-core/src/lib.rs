//! Lifecycle control for an embedded GHC runtime system.
//!
//! This crate is host-agnostic: it knows nothing about Emacs. It owns the
//! process-wide RTS state machine (`Lifecycle`), the trait seam over the
//! foreign runtime (`RtsRuntime`), and the startup-argument marshaller
//! (`ArgvBuffer`) that produces the `(argc, argv)` vector the RTS
//! initializer consumes.

mod argv;
mod lifecycle;

pub use argv::{ArgvBuffer, ArgvError};
pub use lifecycle::{InitOutcome, Lifecycle, RtsStatus};

/// Seam over the foreign runtime system.
///
/// The real implementation binds `hs_init_with_rtsopts` and friends in the
/// loadable module crate; tests substitute a recording fake. `init` and
/// `shutdown` are called at most once each, in that order, by `Lifecycle`.
pub trait RtsRuntime {
    /// Start the runtime, handing it the marshalled argument vector.
    ///
    /// The vector stays exclusively owned by the calling frame; the
    /// initializer may rewrite the pointer table while stripping its own
    /// flags but must not retain any pointer past the call.
    fn init(&mut self, argv: &mut ArgvBuffer);

    /// Shut the runtime down. Irreversible for the rest of the process.
    fn shutdown(&mut self);

    fn is_profiled(&self) -> bool;
    fn is_dynamic(&self) -> bool;
    fn allocations(&self) -> u64;
    fn stats_enabled(&self) -> bool;
}
