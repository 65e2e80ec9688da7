//! Platform-specific R library loading and initialization.
//!
//! The bridge embeds R non-interactively: console output is routed to the
//! `log` facade and the ReadConsole callback always signals EOF, so R code
//! that prompts for input fails fast instead of hanging the process.

use crate::error::{RError, RResult};
use crate::functions::{init_r_library, r_library};
use std::env;
use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::path::PathBuf;
use std::process::Command;
use std::sync::RwLock;

/// Default R library paths by platform.
#[cfg(target_os = "linux")]
const R_LIB_PATHS: &[&str] = &[
    "/opt/R/current/lib/R/lib/libR.so",
    "/usr/lib/R/lib/libR.so",
    "/usr/local/lib/R/lib/libR.so",
];

#[cfg(target_os = "macos")]
const R_LIB_PATHS: &[&str] = &[
    "/Library/Frameworks/R.framework/Versions/Current/Resources/lib/libR.dylib",
    "/opt/R/arm64/lib/R/lib/libR.dylib",
    "/usr/local/lib/R/lib/libR.dylib",
];

/// Default R library paths for Windows.
/// On Windows, R installation paths vary widely, so we rely primarily on
/// the R_HOME environment variable or finding R in PATH.
#[cfg(target_os = "windows")]
const R_LIB_PATHS: &[&str] = &[];

/// Get the R shared library folder relative to R_HOME for each platform.
#[cfg(unix)]
fn r_lib_folder() -> &'static str {
    "lib"
}

#[cfg(windows)]
fn r_lib_folder() -> &'static str {
    // On Windows x64, R.dll is in bin/x64/
    // On Windows ARM64, R.dll is in bin/
    #[cfg(target_arch = "aarch64")]
    {
        "bin"
    }
    #[cfg(not(target_arch = "aarch64"))]
    {
        "bin\\x64"
    }
}

/// Find the R shared library path.
pub fn find_r_library() -> RResult<PathBuf> {
    // First, check R_HOME environment variable
    if let Ok(r_home) = env::var("R_HOME") {
        let lib_path = PathBuf::from(&r_home)
            .join(r_lib_folder())
            .join(r_lib_name());
        if lib_path.exists() {
            return Ok(lib_path);
        }
    }

    // Try to get R_HOME from R itself
    #[cfg(unix)]
    let r_cmd = "R";
    #[cfg(windows)]
    let r_cmd = "R.exe";

    if let Ok(output) = Command::new(r_cmd).args(["RHOME"]).output()
        && output.status.success()
    {
        let r_home = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let lib_path = PathBuf::from(&r_home)
            .join(r_lib_folder())
            .join(r_lib_name());
        if lib_path.exists() {
            return Ok(lib_path);
        }
    }

    // Try default paths
    for path in R_LIB_PATHS {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
    }

    Err(RError::LibraryNotFound(
        "Could not find R library. Please set R_HOME or ensure R is in PATH.".to_string(),
    ))
}

/// Get the R library filename for the current platform.
#[cfg(target_os = "linux")]
fn r_lib_name() -> &'static str {
    "libR.so"
}

#[cfg(target_os = "macos")]
fn r_lib_name() -> &'static str {
    "libR.dylib"
}

#[cfg(target_os = "windows")]
fn r_lib_name() -> &'static str {
    "R.dll"
}

/// Get R_HOME from the system.
pub fn get_r_home() -> RResult<PathBuf> {
    // Check environment variable first
    if let Ok(r_home) = env::var("R_HOME") {
        return Ok(PathBuf::from(r_home));
    }

    // Try to get from R command
    let output = Command::new("R")
        .args(["RHOME"])
        .output()
        .map_err(|e| RError::LibraryNotFound(format!("Failed to run R RHOME: {}", e)))?;

    if output.status.success() {
        let r_home = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(PathBuf::from(r_home))
    } else {
        Err(RError::LibraryNotFound(
            "R RHOME failed. Is R installed and in PATH?".to_string(),
        ))
    }
}

/// Per-stream buffers for partial console lines (R sends output in chunks).
/// Index 0 is stdout, index 1 is stderr.
static CONSOLE_BUFFERS: [RwLock<String>; 2] = [RwLock::new(String::new()), RwLock::new(String::new())];

/// Append a chunk to a line buffer and drain every completed line.
///
/// R's WriteConsoleEx delivers output in arbitrary chunks, so a chunk may
/// contain zero or more newlines and end mid-line. The trailing partial line
/// stays in the buffer until a later chunk completes it.
fn drain_lines(buffer: &mut String, chunk: &str) -> Vec<String> {
    buffer.push_str(chunk);

    let mut lines = Vec::new();
    while let Some(pos) = buffer.find('\n') {
        let line: String = buffer.drain(..=pos).collect();
        lines.push(line.trim_end_matches(['\n', '\r']).to_string());
    }
    lines
}

/// R's WriteConsoleEx callback.
///
/// Routes R console output to the `log` facade: regular output at debug
/// level, error/message output at warn level. A bridging library must not
/// write to the host process's stdout or stderr.
///
/// # Safety
/// This function is called by R and must match the expected signature.
unsafe extern "C" fn r_write_console_ex(buf: *const c_char, buflen: c_int, otype: c_int) {
    if buf.is_null() || buflen <= 0 {
        return;
    }

    let slice = unsafe { std::slice::from_raw_parts(buf as *const u8, buflen as usize) };
    let chunk = String::from_utf8_lossy(slice);

    let is_error = otype != 0;
    let stream = if is_error { 1 } else { 0 };

    if let Ok(mut buffer) = CONSOLE_BUFFERS[stream].write() {
        for line in drain_lines(&mut buffer, &chunk) {
            if is_error {
                log::warn!(target: "epicsa::r", "{}", line);
            } else {
                log::debug!(target: "epicsa::r", "{}", line);
            }
        }
    }
}

/// R's ReadConsole callback.
///
/// The bridge is non-interactive: always signal EOF so R code requesting
/// input (readline(), menu(), ...) fails instead of blocking forever.
///
/// # Safety
/// This function is called by R and must match the expected signature.
unsafe extern "C" fn r_read_console(
    prompt: *const c_char,
    _buf: *mut c_char,
    _buflen: c_int,
    _hist: c_int,
) -> c_int {
    if !prompt.is_null()
        && let Ok(s) = unsafe { std::ffi::CStr::from_ptr(prompt) }.to_str()
        && !s.trim().is_empty()
    {
        log::warn!(target: "epicsa::r", "R requested console input at prompt {:?}; returning EOF", s);
    }
    0
}

/// Initialize R with default settings for embedded, non-interactive use.
///
/// # Safety
/// This function initializes R's global state and must only be called once.
pub unsafe fn initialize_r() -> RResult<()> {
    let args = &["--quiet", "--no-save", "--no-restore", "--no-echo"];

    // SAFETY: forwarding to initialize_r_with_args which handles the unsafe operations
    unsafe { initialize_r_with_args(args) }
}

/// Initialize R with custom arguments.
///
/// The `r_args` parameter should contain R command-line arguments like
/// `["--quiet", "--no-save", "--no-restore"]`.
///
/// # Safety
/// This function initializes R's global state and must only be called once.
pub unsafe fn initialize_r_with_args(r_args: &[&str]) -> RResult<()> {
    // Find and load R library
    let lib_path = find_r_library()?;
    init_r_library(&lib_path)?;

    // Set R_HOME if not already set
    if env::var("R_HOME").is_err()
        && let Ok(r_home) = get_r_home()
    {
        // SAFETY: We're in single-threaded initialization
        unsafe { env::set_var("R_HOME", &r_home) };
    }

    // Set R_LIBS_SITE to ensure R can find base packages (including compiler for JIT)
    // SAFETY: We're in single-threaded initialization
    if env::var("R_LIBS_SITE").is_err()
        && let Ok(r_home) = get_r_home()
    {
        let lib_path = r_home.join("library");
        if lib_path.exists() {
            unsafe { env::set_var("R_LIBS_SITE", lib_path.to_string_lossy().as_ref()) };
        }
    }

    let lib = r_library()?;

    #[cfg(unix)]
    unsafe {
        initialize_r_unix(lib, r_args)?;
    }

    #[cfg(windows)]
    unsafe {
        initialize_r_windows(lib, r_args)?;
    }

    Ok(())
}

/// Unix-specific R initialization.
#[cfg(unix)]
unsafe fn initialize_r_unix(lib: &crate::functions::RLibrary, r_args: &[&str]) -> RResult<()> {
    unsafe {
        // Set R_running_as_main_program before initialization
        if !lib.r_running_as_main_program.is_null() {
            *lib.r_running_as_main_program = 1;
        }

        // Disable R's signal handlers: the host process owns signal handling
        if !lib.r_signalhandlers.is_null() {
            *lib.r_signalhandlers = 0;
        }

        // Prepare arguments for R initialization
        let mut args: Vec<CString> = vec![CString::new("epicsa").unwrap()];
        for arg in r_args {
            if let Ok(cstr) = CString::new(*arg) {
                args.push(cstr);
            }
        }
        let arg_ptrs: Vec<*const c_char> = args.iter().map(|s| s.as_ptr()).collect();

        // Initialize R
        (lib.rf_initialize_r)(args.len() as c_int, arg_ptrs.as_ptr());

        // Embedded batch use: not interactive
        if !lib.r_interactive.is_null() {
            *lib.r_interactive = 0;
        }

        // Disable stack checking (required for embedded R)
        if !lib.r_cstacklimit.is_null() {
            *lib.r_cstacklimit = usize::MAX;
        }

        // Redirect console output (set file pointers to NULL so callbacks are used)
        if !lib.r_consolefile.is_null() {
            *lib.r_consolefile = std::ptr::null_mut();
        }
        if !lib.r_outputfile.is_null() {
            *lib.r_outputfile = std::ptr::null_mut();
        }

        // Disable default console write, install our logging callback
        if !lib.ptr_r_writeconsole.is_null() {
            *lib.ptr_r_writeconsole = None;
        }
        if !lib.ptr_r_writeconsoleex.is_null() {
            *lib.ptr_r_writeconsoleex = Some(r_write_console_ex);
        }

        // The bridge never prompts; EOF any input request
        if !lib.ptr_r_readconsole.is_null() {
            *lib.ptr_r_readconsole = Some(r_read_console);
        }

        // Setup R main loop (but don't run it)
        (lib.setup_rmainloop)();
    }

    Ok(())
}

/// Windows-specific R initialization.
///
/// On Windows, R uses a params-based approach instead of global function
/// pointers: create an Rstart struct, set callbacks on it, then call
/// R_SetParams. LinkDLL mode is used since the bridge embeds R as a library
/// with no console of its own.
#[cfg(windows)]
unsafe fn initialize_r_windows(lib: &crate::functions::RLibrary, r_args: &[&str]) -> RResult<()> {
    use crate::types::{R_FALSE, Rstart, UImode};
    use std::mem::MaybeUninit;

    let r_home = get_r_home()?;
    let r_home_cstr = CString::new(r_home.to_string_lossy().as_ref())
        .map_err(|_| RError::LibraryNotFound("Invalid R_HOME path".to_string()))?;

    let user_home = env::var("USERPROFILE")
        .or_else(|_| env::var("HOME"))
        .unwrap_or_else(|_| ".".to_string());
    let user_home_cstr = CString::new(user_home)
        .map_err(|_| RError::LibraryNotFound("Invalid user home path".to_string()))?;

    unsafe {
        if !lib.r_signalhandlers.is_null() {
            *lib.r_signalhandlers = 0;
        }

        // cmdlineoptions does initialization that's not accessible any other way
        let empty_arg = CString::new("epicsa").unwrap();
        let mut empty_args: Vec<*mut c_char> = vec![empty_arg.as_ptr() as *mut c_char];
        (lib.cmdlineoptions)(1, empty_args.as_mut_ptr());

        // Create and initialize the Rstart params struct
        let mut params: MaybeUninit<Rstart> = MaybeUninit::uninit();
        let params_ptr = params.as_mut_ptr();
        (lib.r_defparamsex)(params_ptr, 0);

        // Process command line arguments (sets R_Quiet, SaveAction, RestoreAction)
        let mut args: Vec<CString> = vec![CString::new("epicsa").unwrap()];
        for arg in r_args {
            if let Ok(cstr) = CString::new(*arg) {
                args.push(cstr);
            }
        }
        let mut arg_ptrs: Vec<*mut c_char> =
            args.iter().map(|s| s.as_ptr() as *mut c_char).collect();
        let mut argc = args.len() as c_int;
        (lib.r_common_command_line)(&mut argc, arg_ptrs.as_mut_ptr(), params_ptr);

        (*params_ptr).r_interactive = 0;
        (*params_ptr).character_mode = UImode::LinkDLL;

        // Skip profile loading: the bridge wants a reproducible session
        (*params_ptr).load_init_file = R_FALSE;
        (*params_ptr).load_site_file = R_FALSE;

        // Console callbacks
        (*params_ptr).write_console = None;
        (*params_ptr).write_console_ex = Some(r_write_console_ex);
        (*params_ptr).read_console = Some(r_read_console);
        (*params_ptr).show_message = Some(r_show_message);
        (*params_ptr).yes_no_cancel = Some(r_yes_no_cancel);
        (*params_ptr).callback = Some(r_callback);
        (*params_ptr).busy = Some(r_busy);
        (*params_ptr).suicide = Some(r_suicide);

        (*params_ptr).rhome = r_home_cstr.as_ptr() as *mut c_char;
        (*params_ptr).home = user_home_cstr.as_ptr() as *mut c_char;

        (lib.r_setparams)(params_ptr);

        if !lib.r_cstacklimit.is_null() {
            *lib.r_cstacklimit = usize::MAX;
        }

        (lib.setup_rmainloop)();
    }

    Ok(())
}

/// Windows callback for ProcessEvents (no-op).
#[cfg(windows)]
extern "C" fn r_callback() {}

/// Windows callback for ShowMessage.
#[cfg(windows)]
extern "C" fn r_show_message(msg: *const c_char) {
    if !msg.is_null()
        && let Ok(s) = unsafe { std::ffi::CStr::from_ptr(msg) }.to_str()
    {
        log::info!(target: "epicsa::r", "[R ShowMessage] {}", s);
    }
}

/// Windows callback for YesNoCancel.
/// Returns 1 for Yes, -1 for No, 0 for Cancel.
#[cfg(windows)]
extern "C" fn r_yes_no_cancel(question: *const c_char) -> c_int {
    // Used during R's CleanUp when SA_SAVEASK is in effect; never save.
    if !question.is_null()
        && let Ok(s) = unsafe { std::ffi::CStr::from_ptr(question) }.to_str()
    {
        log::warn!(target: "epicsa::r", "[R YesNoCancel] Ignoring question: '{}'. Returning NO.", s);
    }
    -1
}

/// Windows callback for Busy indicator (no-op).
#[cfg(windows)]
extern "C" fn r_busy(_which: c_int) {}

/// Windows callback for Suicide (fatal error).
#[cfg(windows)]
extern "C" fn r_suicide(msg: *const c_char) {
    if !msg.is_null()
        && let Ok(s) = unsafe { std::ffi::CStr::from_ptr(msg) }.to_str()
    {
        log::error!(target: "epicsa::r", "[R FATAL] {}", s);
        eprintln!("R fatal error: {}", s);
    }
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_lines_complete_line() {
        let mut buffer = String::new();
        let lines = drain_lines(&mut buffer, "hello world\n");
        assert_eq!(lines, vec!["hello world"]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_drain_lines_partial_chunks() {
        let mut buffer = String::new();

        // First chunk has no newline: nothing drained, content buffered
        let lines = drain_lines(&mut buffer, "Loading required ");
        assert!(lines.is_empty());
        assert_eq!(buffer, "Loading required ");

        // Second chunk completes the line and starts another
        let lines = drain_lines(&mut buffer, "package: stats\nAttaching");
        assert_eq!(lines, vec!["Loading required package: stats"]);
        assert_eq!(buffer, "Attaching");
    }

    #[test]
    fn test_drain_lines_multiple_lines_in_one_chunk() {
        let mut buffer = String::new();
        let lines = drain_lines(&mut buffer, "a\nb\nc\n");
        assert_eq!(lines, vec!["a", "b", "c"]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_drain_lines_strips_crlf() {
        let mut buffer = String::new();
        let lines = drain_lines(&mut buffer, "Error: boom\r\n");
        assert_eq!(lines, vec!["Error: boom"]);
    }

    #[test]
    fn test_drain_lines_empty_chunk() {
        let mut buffer = String::from("pending");
        let lines = drain_lines(&mut buffer, "");
        assert!(lines.is_empty());
        assert_eq!(buffer, "pending");
    }

    /// R_HOME takes precedence over every other discovery mechanism.
    #[test]
    #[cfg(unix)]
    fn test_find_r_library_honors_r_home() {
        let dir = tempfile::tempdir().unwrap();
        let lib_dir = dir.path().join(r_lib_folder());
        std::fs::create_dir_all(&lib_dir).unwrap();
        std::fs::write(lib_dir.join(r_lib_name()), b"").unwrap();

        let previous = env::var("R_HOME").ok();
        // SAFETY: no other test in this binary reads R_HOME concurrently
        unsafe { env::set_var("R_HOME", dir.path()) };

        let found = find_r_library();

        // Restore before asserting so a failure doesn't poison other tests
        match previous {
            Some(v) => unsafe { env::set_var("R_HOME", v) },
            None => unsafe { env::remove_var("R_HOME") },
        }

        assert_eq!(found.unwrap(), lib_dir.join(r_lib_name()));
    }
}
