//! Startup-argument marshalling: host strings to a C `(argc, argv)` vector.

use std::ffi::CString;

use libc::{c_char, c_int};

/// Owned, request-scoped argument vector for the RTS initializer.
///
/// Holds `n` NUL-terminated buffers plus a pointer table of `n + 1` entries
/// whose last entry is null. Both live exactly as long as this value; the
/// initializer reads them synchronously during its own call and nothing may
/// be retained afterwards.
#[derive(Debug)]
pub struct ArgvBuffer {
    args: Vec<CString>,
    // args.len() + 1 entries, null-terminated.
    ptrs: Vec<*mut c_char>,
}

impl ArgvBuffer {
    /// Copy `args` into owned NUL-terminated buffers and build the pointer
    /// table. An interior NUL in any argument is rejected before any buffer
    /// reaches the foreign side.
    pub fn from_args(args: &[String]) -> Result<Self, ArgvError> {
        let mut owned = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().enumerate() {
            let c = CString::new(arg.as_str()).map_err(|_| ArgvError::InteriorNul { index })?;
            owned.push(c);
        }
        let mut ptrs: Vec<*mut c_char> = owned
            .iter()
            .map(|c| c.as_ptr() as *mut c_char)
            .collect();
        ptrs.push(std::ptr::null_mut());
        Ok(ArgvBuffer { args: owned, ptrs })
    }

    pub fn argc(&self) -> c_int {
        self.args.len() as c_int
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Pointer to the argv table. The table is mutable (the RTS permutes it
    /// while stripping `+RTS` flags); the string bytes behind it are not.
    pub fn as_mut_ptr(&mut self) -> *mut *mut c_char {
        self.ptrs.as_mut_ptr()
    }

    /// Entry `i` of the pointer table, including the null sentinel at `len()`.
    pub fn entry(&self, i: usize) -> *mut c_char {
        self.ptrs[i]
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ArgvError {
    /// Argument at `index` contains an interior NUL byte and cannot be
    /// represented as a C string.
    InteriorNul { index: usize },
}

impl std::fmt::Display for ArgvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgvError::InteriorNul { index } => {
                write!(f, "startup option {index} contains an interior NUL byte")
            }
        }
    }
}

impl std::error::Error for ArgvError {}
