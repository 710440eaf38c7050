//! Hand-rolled declarations of the `emacs-module` C ABI.
//!
//! Layout mirrors the module-25 `emacs_env` exactly; the size-tagged structs
//! are how Emacs and the module negotiate compatibility at load time.
//! Function-pointer fields are `Option`-wrapped in the usual bindings style,
//! which also lets test fixtures leave unimplemented slots empty.

#![allow(non_camel_case_types)]

use libc::{c_char, c_int, c_void, intmax_t, ptrdiff_t};

/// Opaque Lisp value handle. Only ever passed back to the environment that
/// produced it.
#[repr(C)]
pub struct emacs_value_tag {
    _private: [u8; 0],
}

pub type emacs_value = *mut emacs_value_tag;

/// `max_arity` marker for functions accepting any number of arguments.
pub const EMACS_VARIADIC_FUNCTION: ptrdiff_t = -2;

pub type emacs_funcall_exit = c_int;
pub const EMACS_FUNCALL_EXIT_RETURN: emacs_funcall_exit = 0;
pub const EMACS_FUNCALL_EXIT_SIGNAL: emacs_funcall_exit = 1;
pub const EMACS_FUNCALL_EXIT_THROW: emacs_funcall_exit = 2;

/// A module function as registered through `make_function`.
pub type emacs_function = Option<
    unsafe extern "C" fn(
        env: *mut emacs_env,
        nargs: ptrdiff_t,
        args: *mut emacs_value,
        data: *mut c_void,
    ) -> emacs_value,
>;

pub type emacs_finalizer = Option<unsafe extern "C" fn(data: *mut c_void)>;

/// Size-tagged runtime descriptor Emacs hands to `emacs_module_init`.
#[repr(C)]
pub struct emacs_runtime {
    pub size: ptrdiff_t,
    pub private_members: *mut c_void,
    pub get_environment:
        Option<unsafe extern "C" fn(rt: *mut emacs_runtime) -> *mut emacs_env>,
}

/// Size-tagged environment descriptor (module-25 layout).
#[repr(C)]
pub struct emacs_env {
    pub size: ptrdiff_t,
    pub private_members: *mut c_void,
    pub make_global_ref:
        Option<unsafe extern "C" fn(*mut emacs_env, emacs_value) -> emacs_value>,
    pub free_global_ref: Option<unsafe extern "C" fn(*mut emacs_env, emacs_value)>,
    pub non_local_exit_check:
        Option<unsafe extern "C" fn(*mut emacs_env) -> emacs_funcall_exit>,
    pub non_local_exit_clear: Option<unsafe extern "C" fn(*mut emacs_env)>,
    pub non_local_exit_get: Option<
        unsafe extern "C" fn(
            *mut emacs_env,
            *mut emacs_value,
            *mut emacs_value,
        ) -> emacs_funcall_exit,
    >,
    pub non_local_exit_signal:
        Option<unsafe extern "C" fn(*mut emacs_env, emacs_value, emacs_value)>,
    pub non_local_exit_throw:
        Option<unsafe extern "C" fn(*mut emacs_env, emacs_value, emacs_value)>,
    pub make_function: Option<
        unsafe extern "C" fn(
            *mut emacs_env,
            ptrdiff_t,
            ptrdiff_t,
            emacs_function,
            *const c_char,
            *mut c_void,
        ) -> emacs_value,
    >,
    pub funcall: Option<
        unsafe extern "C" fn(
            *mut emacs_env,
            emacs_value,
            ptrdiff_t,
            *mut emacs_value,
        ) -> emacs_value,
    >,
    pub intern: Option<unsafe extern "C" fn(*mut emacs_env, *const c_char) -> emacs_value>,
    pub type_of: Option<unsafe extern "C" fn(*mut emacs_env, emacs_value) -> emacs_value>,
    pub is_not_nil: Option<unsafe extern "C" fn(*mut emacs_env, emacs_value) -> bool>,
    pub eq: Option<unsafe extern "C" fn(*mut emacs_env, emacs_value, emacs_value) -> bool>,
    pub extract_integer:
        Option<unsafe extern "C" fn(*mut emacs_env, emacs_value) -> intmax_t>,
    pub make_integer: Option<unsafe extern "C" fn(*mut emacs_env, intmax_t) -> emacs_value>,
    pub extract_float: Option<unsafe extern "C" fn(*mut emacs_env, emacs_value) -> f64>,
    pub make_float: Option<unsafe extern "C" fn(*mut emacs_env, f64) -> emacs_value>,
    pub copy_string_contents: Option<
        unsafe extern "C" fn(*mut emacs_env, emacs_value, *mut c_char, *mut ptrdiff_t) -> bool,
    >,
    pub make_string:
        Option<unsafe extern "C" fn(*mut emacs_env, *const c_char, ptrdiff_t) -> emacs_value>,
    pub make_user_ptr:
        Option<unsafe extern "C" fn(*mut emacs_env, emacs_finalizer, *mut c_void) -> emacs_value>,
    pub get_user_ptr: Option<unsafe extern "C" fn(*mut emacs_env, emacs_value) -> *mut c_void>,
    pub set_user_ptr: Option<unsafe extern "C" fn(*mut emacs_env, emacs_value, *mut c_void)>,
    pub get_user_finalizer:
        Option<unsafe extern "C" fn(*mut emacs_env, emacs_value) -> emacs_finalizer>,
    pub set_user_finalizer:
        Option<unsafe extern "C" fn(*mut emacs_env, emacs_value, emacs_finalizer)>,
    pub vec_get:
        Option<unsafe extern "C" fn(*mut emacs_env, emacs_value, ptrdiff_t) -> emacs_value>,
    pub vec_set:
        Option<unsafe extern "C" fn(*mut emacs_env, emacs_value, ptrdiff_t, emacs_value)>,
    pub vec_size: Option<unsafe extern "C" fn(*mut emacs_env, emacs_value) -> ptrdiff_t>,
}
