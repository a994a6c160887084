//! Intercepted filesystem-entry operations.
//!
//! On Linux the dynamic loader resolves these exported symbols ahead of
//! libc (`LD_PRELOAD`); on macOS the `__interpose` pairs at the bottom do
//! the same under two-level namespacing. Each hook rewrites the path
//! argument through [`crate::rewrite`] and delegates to the real
//! operation; when no rewrite applies, the original arguments are passed
//! through untouched so the real errno contract is preserved byte for
//! byte.
//!
//! Dirfd-relative and plain relative arguments are absolutized first —
//! the rewrite rule operates on the logical path, not on how the caller
//! spelled it.

use libc::{c_char, c_int};
use std::borrow::Cow;
use std::ffi::{CStr, CString};

use crate::context::{self, RedirectRule};
use crate::real;
use crate::rewrite::{PathDecision, rewrite_with};

/// Rewrite a plain path argument. `Some` carries the redirected path to
/// delegate with; `None` means pass the call through unchanged.
unsafe fn reroute(tag: &str, path: *const c_char) -> Option<CString> {
    let rule = context::active_rule()?;
    if path.is_null() {
        return None;
    }
    let bytes = unsafe { CStr::from_ptr(path) }.to_bytes();
    let logical = absolutize(bytes, || cwd())?;
    decide(tag, rule, &logical)
}

/// Rewrite a dirfd-relative path argument.
unsafe fn reroute_at(tag: &str, dirfd: c_int, path: *const c_char) -> Option<CString> {
    let rule = context::active_rule()?;
    if path.is_null() {
        return None;
    }
    let bytes = unsafe { CStr::from_ptr(path) }.to_bytes();
    let logical = absolutize(bytes, || {
        if dirfd == libc::AT_FDCWD {
            cwd()
        } else {
            dirfd_dir(dirfd)
        }
    })?;
    decide(tag, rule, &logical)
}

fn decide(tag: &str, rule: &RedirectRule, logical: &[u8]) -> Option<CString> {
    let decision = rewrite_with(logical, rule, |candidate| {
        CString::new(candidate)
            .map(|c| unsafe { (*real::ACCESS)(c.as_ptr(), libc::F_OK) == 0 })
            .unwrap_or(false)
    });
    if rule.debug && decision.candidate.is_some() {
        diag(tag, &decision);
    }
    if decision.redirected {
        CString::new(decision.chosen).ok()
    } else {
        None
    }
}

fn absolutize<'a, F>(path: &'a [u8], base: F) -> Option<Cow<'a, [u8]>>
where
    F: FnOnce() -> Option<Vec<u8>>,
{
    if path.first() == Some(&b'/') {
        return Some(Cow::Borrowed(path));
    }
    if path.is_empty() {
        return None;
    }
    let mut joined = base()?;
    if joined.last() != Some(&b'/') {
        joined.push(b'/');
    }
    joined.extend_from_slice(path);
    Some(Cow::Owned(joined))
}

fn cwd() -> Option<Vec<u8>> {
    let mut buf = [0u8; libc::PATH_MAX as usize];
    let ptr = unsafe { libc::getcwd(buf.as_mut_ptr().cast(), buf.len()) };
    if ptr.is_null() {
        return None;
    }
    let len = buf.iter().position(|&b| b == 0)?;
    Some(buf[..len].to_vec())
}

/// Directory behind an open descriptor, via the real (non-hooked)
/// operations only.
#[cfg(target_os = "linux")]
fn dirfd_dir(fd: c_int) -> Option<Vec<u8>> {
    let link = CString::new(format!("/proc/self/fd/{fd}")).ok()?;
    let mut buf = [0u8; libc::PATH_MAX as usize];
    let n = unsafe { (*real::READLINK)(link.as_ptr(), buf.as_mut_ptr().cast(), buf.len()) };
    if n <= 0 {
        return None;
    }
    Some(buf[..n as usize].to_vec())
}

#[cfg(target_os = "macos")]
fn dirfd_dir(fd: c_int) -> Option<Vec<u8>> {
    let mut buf = [0u8; libc::PATH_MAX as usize];
    if unsafe { libc::fcntl(fd, libc::F_GETPATH, buf.as_mut_ptr()) } == -1 {
        return None;
    }
    let len = buf.iter().position(|&b| b == 0)?;
    Some(buf[..len].to_vec())
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn dirfd_dir(_fd: c_int) -> Option<Vec<u8>> {
    // No portable descriptor-to-path lookup here; leave the call alone.
    None
}

fn diag(tag: &str, decision: &PathDecision) {
    let original = String::from_utf8_lossy(&decision.original);
    let candidate = decision
        .candidate
        .as_deref()
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .unwrap_or_default();
    let verdict = if decision.redirected {
        "redirected"
    } else {
        "fallback"
    };
    eprintln!("dirswap[{tag}] {original} -> {candidate} {verdict}");
}

// ── open family ──

// The third argument is variadic in the real signature. Declaring it as a
// fixed mode_t reads the right register on every supported Linux ABI; on
// Apple arm64 variadic arguments travel on the stack, so the value seen
// here is only meaningful for O_CREAT/O_TMPFILE opens there.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn open(path: *const c_char, flags: c_int, mode: libc::mode_t) -> c_int {
    let real = *real::OPEN;
    match unsafe { reroute("open", path) } {
        Some(p) => unsafe { real(p.as_ptr(), flags, mode as libc::c_uint) },
        None => unsafe { real(path, flags, mode as libc::c_uint) },
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn openat(
    dirfd: c_int,
    path: *const c_char,
    flags: c_int,
    mode: libc::mode_t,
) -> c_int {
    let real = *real::OPENAT;
    match unsafe { reroute_at("openat", dirfd, path) } {
        Some(p) => unsafe { real(dirfd, p.as_ptr(), flags, mode as libc::c_uint) },
        None => unsafe { real(dirfd, path, flags, mode as libc::c_uint) },
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn fopen(path: *const c_char, mode: *const c_char) -> *mut libc::FILE {
    let real = *real::FOPEN;
    match unsafe { reroute("fopen", path) } {
        Some(p) => unsafe { real(p.as_ptr(), mode) },
        None => unsafe { real(path, mode) },
    }
}

// ── stat family ──

#[unsafe(no_mangle)]
pub unsafe extern "C" fn stat(path: *const c_char, buf: *mut libc::stat) -> c_int {
    let real = *real::STAT;
    match unsafe { reroute("stat", path) } {
        Some(p) => unsafe { real(p.as_ptr(), buf) },
        None => unsafe { real(path, buf) },
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn lstat(path: *const c_char, buf: *mut libc::stat) -> c_int {
    let real = *real::LSTAT;
    match unsafe { reroute("lstat", path) } {
        Some(p) => unsafe { real(p.as_ptr(), buf) },
        None => unsafe { real(path, buf) },
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn fstatat(
    dirfd: c_int,
    path: *const c_char,
    buf: *mut libc::stat,
    flags: c_int,
) -> c_int {
    let real = *real::FSTATAT;
    match unsafe { reroute_at("fstatat", dirfd, path) } {
        Some(p) => unsafe { real(dirfd, p.as_ptr(), buf, flags) },
        None => unsafe { real(dirfd, path, buf, flags) },
    }
}

// ── access family ──

#[unsafe(no_mangle)]
pub unsafe extern "C" fn access(path: *const c_char, mode: c_int) -> c_int {
    let real = *real::ACCESS;
    match unsafe { reroute("access", path) } {
        Some(p) => unsafe { real(p.as_ptr(), mode) },
        None => unsafe { real(path, mode) },
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn faccessat(
    dirfd: c_int,
    path: *const c_char,
    mode: c_int,
    flags: c_int,
) -> c_int {
    let real = *real::FACCESSAT;
    match unsafe { reroute_at("faccessat", dirfd, path) } {
        Some(p) => unsafe { real(dirfd, p.as_ptr(), mode, flags) },
        None => unsafe { real(dirfd, path, mode, flags) },
    }
}

// ── symlink resolution / canonicalization ──

#[unsafe(no_mangle)]
pub unsafe extern "C" fn readlink(
    path: *const c_char,
    buf: *mut c_char,
    bufsiz: libc::size_t,
) -> libc::ssize_t {
    let real = *real::READLINK;
    match unsafe { reroute("readlink", path) } {
        Some(p) => unsafe { real(p.as_ptr(), buf, bufsiz) },
        None => unsafe { real(path, buf, bufsiz) },
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn readlinkat(
    dirfd: c_int,
    path: *const c_char,
    buf: *mut c_char,
    bufsiz: libc::size_t,
) -> libc::ssize_t {
    let real = *real::READLINKAT;
    match unsafe { reroute_at("readlinkat", dirfd, path) } {
        Some(p) => unsafe { real(dirfd, p.as_ptr(), buf, bufsiz) },
        None => unsafe { real(dirfd, path, buf, bufsiz) },
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn realpath(path: *const c_char, resolved: *mut c_char) -> *mut c_char {
    let real = *real::REALPATH;
    match unsafe { reroute("realpath", path) } {
        Some(p) => unsafe { real(p.as_ptr(), resolved) },
        None => unsafe { real(path, resolved) },
    }
}

// ── glibc LFS and compat aliases ──

#[cfg(all(target_os = "linux", target_env = "gnu"))]
mod gnu {
    use super::*;

    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn open64(
        path: *const c_char,
        flags: c_int,
        mode: libc::mode_t,
    ) -> c_int {
        let real = *real::OPEN64;
        match unsafe { reroute("open64", path) } {
            Some(p) => unsafe { real(p.as_ptr(), flags, mode as libc::c_uint) },
            None => unsafe { real(path, flags, mode as libc::c_uint) },
        }
    }

    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn openat64(
        dirfd: c_int,
        path: *const c_char,
        flags: c_int,
        mode: libc::mode_t,
    ) -> c_int {
        let real = *real::OPENAT64;
        match unsafe { reroute_at("openat64", dirfd, path) } {
            Some(p) => unsafe { real(dirfd, p.as_ptr(), flags, mode as libc::c_uint) },
            None => unsafe { real(dirfd, path, flags, mode as libc::c_uint) },
        }
    }

    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn fopen64(path: *const c_char, mode: *const c_char) -> *mut libc::FILE {
        let real = *real::FOPEN64;
        match unsafe { reroute("fopen64", path) } {
            Some(p) => unsafe { real(p.as_ptr(), mode) },
            None => unsafe { real(path, mode) },
        }
    }

    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn stat64(path: *const c_char, buf: *mut libc::stat64) -> c_int {
        let real = *real::STAT64;
        match unsafe { reroute("stat64", path) } {
            Some(p) => unsafe { real(p.as_ptr(), buf) },
            None => unsafe { real(path, buf) },
        }
    }

    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn lstat64(path: *const c_char, buf: *mut libc::stat64) -> c_int {
        let real = *real::LSTAT64;
        match unsafe { reroute("lstat64", path) } {
            Some(p) => unsafe { real(p.as_ptr(), buf) },
            None => unsafe { real(path, buf) },
        }
    }

    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn fstatat64(
        dirfd: c_int,
        path: *const c_char,
        buf: *mut libc::stat64,
        flags: c_int,
    ) -> c_int {
        let real = *real::FSTATAT64;
        match unsafe { reroute_at("fstatat64", dirfd, path) } {
            Some(p) => unsafe { real(dirfd, p.as_ptr(), buf, flags) },
            None => unsafe { real(dirfd, path, buf, flags) },
        }
    }

    // Modern coreutils do their metadata queries through statx.
    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn statx(
        dirfd: c_int,
        path: *const c_char,
        flags: c_int,
        mask: libc::c_uint,
        buf: *mut libc::statx,
    ) -> c_int {
        let real = *real::STATX;
        match unsafe { reroute_at("statx", dirfd, path) } {
            Some(p) => unsafe { real(dirfd, p.as_ptr(), flags, mask, buf) },
            None => unsafe { real(dirfd, path, flags, mask, buf) },
        }
    }

    // Binaries linked against pre-2.33 glibc reach stat through the
    // versioned __xstat entry points.

    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn __xstat(ver: c_int, path: *const c_char, buf: *mut libc::stat) -> c_int {
        let real = *real::XSTAT;
        match unsafe { reroute("__xstat", path) } {
            Some(p) => unsafe { real(ver, p.as_ptr(), buf) },
            None => unsafe { real(ver, path, buf) },
        }
    }

    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn __xstat64(
        ver: c_int,
        path: *const c_char,
        buf: *mut libc::stat64,
    ) -> c_int {
        let real = *real::XSTAT64;
        match unsafe { reroute("__xstat64", path) } {
            Some(p) => unsafe { real(ver, p.as_ptr(), buf) },
            None => unsafe { real(ver, path, buf) },
        }
    }

    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn __lxstat(
        ver: c_int,
        path: *const c_char,
        buf: *mut libc::stat,
    ) -> c_int {
        let real = *real::LXSTAT;
        match unsafe { reroute("__lxstat", path) } {
            Some(p) => unsafe { real(ver, p.as_ptr(), buf) },
            None => unsafe { real(ver, path, buf) },
        }
    }

    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn __lxstat64(
        ver: c_int,
        path: *const c_char,
        buf: *mut libc::stat64,
    ) -> c_int {
        let real = *real::LXSTAT64;
        match unsafe { reroute("__lxstat64", path) } {
            Some(p) => unsafe { real(ver, p.as_ptr(), buf) },
            None => unsafe { real(ver, path, buf) },
        }
    }

    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn __fxstatat(
        ver: c_int,
        dirfd: c_int,
        path: *const c_char,
        buf: *mut libc::stat,
        flags: c_int,
    ) -> c_int {
        let real = *real::FXSTATAT;
        match unsafe { reroute_at("__fxstatat", dirfd, path) } {
            Some(p) => unsafe { real(ver, dirfd, p.as_ptr(), buf, flags) },
            None => unsafe { real(ver, dirfd, path, buf, flags) },
        }
    }

    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn __fxstatat64(
        ver: c_int,
        dirfd: c_int,
        path: *const c_char,
        buf: *mut libc::stat64,
        flags: c_int,
    ) -> c_int {
        let real = *real::FXSTATAT64;
        match unsafe { reroute_at("__fxstatat64", dirfd, path) } {
            Some(p) => unsafe { real(ver, dirfd, p.as_ptr(), buf, flags) },
            None => unsafe { real(ver, dirfd, path, buf, flags) },
        }
    }
}

// ── macOS interpose table ──

#[cfg(target_os = "macos")]
mod interpose {
    use super::*;

    /// One `__DATA,__interpose` entry: dyld rewires every call of
    /// `original` in other images to `replacement`.
    #[repr(C)]
    pub struct Pair {
        replacement: *const (),
        original: *const (),
    }

    unsafe impl Sync for Pair {}

    macro_rules! pair {
        ($slot:ident, $new:expr, $old:expr) => {
            #[unsafe(link_section = "__DATA,__interpose")]
            #[used]
            static $slot: Pair = Pair {
                replacement: $new as *const (),
                original: $old as *const (),
            };
        };
    }

    pair!(P_OPEN, open, libc::open);
    pair!(P_OPENAT, openat, libc::openat);
    pair!(P_FOPEN, fopen, libc::fopen);
    pair!(P_STAT, stat, libc::stat);
    pair!(P_LSTAT, lstat, libc::lstat);
    pair!(P_FSTATAT, fstatat, libc::fstatat);
    pair!(P_ACCESS, access, libc::access);
    pair!(P_FACCESSAT, faccessat, libc::faccessat);
    pair!(P_READLINK, readlink, libc::readlink);
    pair!(P_READLINKAT, readlinkat, libc::readlinkat);
    pair!(P_REALPATH, realpath, libc::realpath);
}
