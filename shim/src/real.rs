//! Real libc entry points, resolved once through `dlsym(RTLD_NEXT)`.
//!
//! Every hook delegates through these pointers. Calling the libc wrappers
//! by name from inside the shim would resolve back to our own exported
//! symbols and recurse, so the rewriter's existence probe and the dirfd
//! resolution use these as well.

use libc::{c_char, c_int};
use once_cell::sync::Lazy;
use std::ffi::CStr;

pub type OpenFn = unsafe extern "C" fn(*const c_char, c_int, ...) -> c_int;
pub type OpenatFn = unsafe extern "C" fn(c_int, *const c_char, c_int, ...) -> c_int;
pub type FopenFn = unsafe extern "C" fn(*const c_char, *const c_char) -> *mut libc::FILE;
pub type StatFn = unsafe extern "C" fn(*const c_char, *mut libc::stat) -> c_int;
pub type FstatatFn = unsafe extern "C" fn(c_int, *const c_char, *mut libc::stat, c_int) -> c_int;
pub type AccessFn = unsafe extern "C" fn(*const c_char, c_int) -> c_int;
pub type FaccessatFn = unsafe extern "C" fn(c_int, *const c_char, c_int, c_int) -> c_int;
pub type ReadlinkFn = unsafe extern "C" fn(*const c_char, *mut c_char, libc::size_t) -> libc::ssize_t;
pub type ReadlinkatFn =
    unsafe extern "C" fn(c_int, *const c_char, *mut c_char, libc::size_t) -> libc::ssize_t;
pub type RealpathFn = unsafe extern "C" fn(*const c_char, *mut c_char) -> *mut c_char;

#[cfg(all(target_os = "linux", target_env = "gnu"))]
pub type Stat64Fn = unsafe extern "C" fn(*const c_char, *mut libc::stat64) -> c_int;
#[cfg(all(target_os = "linux", target_env = "gnu"))]
pub type Fstatat64Fn =
    unsafe extern "C" fn(c_int, *const c_char, *mut libc::stat64, c_int) -> c_int;
#[cfg(all(target_os = "linux", target_env = "gnu"))]
pub type XstatFn = unsafe extern "C" fn(c_int, *const c_char, *mut libc::stat) -> c_int;
#[cfg(all(target_os = "linux", target_env = "gnu"))]
pub type Xstat64Fn = unsafe extern "C" fn(c_int, *const c_char, *mut libc::stat64) -> c_int;
#[cfg(all(target_os = "linux", target_env = "gnu"))]
pub type FxstatatFn =
    unsafe extern "C" fn(c_int, c_int, *const c_char, *mut libc::stat, c_int) -> c_int;
#[cfg(all(target_os = "linux", target_env = "gnu"))]
pub type Fxstatat64Fn =
    unsafe extern "C" fn(c_int, c_int, *const c_char, *mut libc::stat64, c_int) -> c_int;
#[cfg(all(target_os = "linux", target_env = "gnu"))]
pub type StatxFn = unsafe extern "C" fn(
    c_int,
    *const c_char,
    c_int,
    libc::c_uint,
    *mut libc::statx,
) -> c_int;

/// Resolve `symbol` past this library. A miss here means the process is
/// calling a hook its own libc never exported; there is no way to honor
/// the call, so fail loudly instead of corrupting it.
fn resolve<T: Copy>(symbol: &'static CStr) -> T {
    debug_assert_eq!(size_of::<T>(), size_of::<*mut libc::c_void>());
    unsafe {
        let ptr = libc::dlsym(libc::RTLD_NEXT, symbol.as_ptr());
        if ptr.is_null() {
            let msg = b"dirswap-shim: unresolvable libc symbol\n";
            libc::write(libc::STDERR_FILENO, msg.as_ptr().cast(), msg.len());
            libc::abort();
        }
        std::mem::transmute_copy(&ptr)
    }
}

macro_rules! real_fn {
    ($(#[$attr:meta])* $name:ident: $ty:ty = $sym:literal) => {
        $(#[$attr])*
        pub static $name: Lazy<$ty> = Lazy::new(|| resolve($sym));
    };
}

real_fn!(OPEN: OpenFn = c"open");
real_fn!(OPENAT: OpenatFn = c"openat");
real_fn!(FOPEN: FopenFn = c"fopen");
real_fn!(STAT: StatFn = c"stat");
real_fn!(LSTAT: StatFn = c"lstat");
real_fn!(FSTATAT: FstatatFn = c"fstatat");
real_fn!(ACCESS: AccessFn = c"access");
real_fn!(FACCESSAT: FaccessatFn = c"faccessat");
real_fn!(READLINK: ReadlinkFn = c"readlink");
real_fn!(READLINKAT: ReadlinkatFn = c"readlinkat");
real_fn!(REALPATH: RealpathFn = c"realpath");

real_fn!(#[cfg(all(target_os = "linux", target_env = "gnu"))] OPEN64: OpenFn = c"open64");
real_fn!(#[cfg(all(target_os = "linux", target_env = "gnu"))] OPENAT64: OpenatFn = c"openat64");
real_fn!(#[cfg(all(target_os = "linux", target_env = "gnu"))] FOPEN64: FopenFn = c"fopen64");
real_fn!(#[cfg(all(target_os = "linux", target_env = "gnu"))] STAT64: Stat64Fn = c"stat64");
real_fn!(#[cfg(all(target_os = "linux", target_env = "gnu"))] LSTAT64: Stat64Fn = c"lstat64");
real_fn!(#[cfg(all(target_os = "linux", target_env = "gnu"))] FSTATAT64: Fstatat64Fn = c"fstatat64");
real_fn!(#[cfg(all(target_os = "linux", target_env = "gnu"))] XSTAT: XstatFn = c"__xstat");
real_fn!(#[cfg(all(target_os = "linux", target_env = "gnu"))] XSTAT64: Xstat64Fn = c"__xstat64");
real_fn!(#[cfg(all(target_os = "linux", target_env = "gnu"))] LXSTAT: XstatFn = c"__lxstat");
real_fn!(#[cfg(all(target_os = "linux", target_env = "gnu"))] LXSTAT64: Xstat64Fn = c"__lxstat64");
real_fn!(#[cfg(all(target_os = "linux", target_env = "gnu"))] FXSTATAT: FxstatatFn = c"__fxstatat");
real_fn!(#[cfg(all(target_os = "linux", target_env = "gnu"))] FXSTATAT64: Fxstatat64Fn = c"__fxstatat64");
real_fn!(#[cfg(all(target_os = "linux", target_env = "gnu"))] STATX: StatxFn = c"statx");
