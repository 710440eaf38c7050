//! Emacs-side half of the GHC RTS bridge.
//!
//! Three layers, raw to cooked: `raw` declares the `emacs-module` C ABI,
//! `env` wraps a live environment pointer in a safe handle and performs the
//! load-time size-tag handshake, and `ops` holds the Lisp-callable
//! operations generic over the runtime seam. The loadable module crate only
//! has to supply the real GHC bindings and forward `emacs_module_init`.

pub mod env;
pub mod ops;
pub mod raw;

pub use env::{Env, Incompatible, StringError};
pub use ops::{init_module, register, status_keyword, ModuleState};
