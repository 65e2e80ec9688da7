//! R function bindings loaded at runtime.

use crate::error::{RError, RResult};
use crate::types::*;
use libloading::{Library, Symbol};
use once_cell::sync::OnceCell;
use std::os::raw::{c_char, c_int};
use std::path::Path;

/// Global R library instance.
static R_LIBRARY: OnceCell<RLibrary> = OnceCell::new();

/// Preloaded supporting DLLs on Windows.
/// These are kept loaded so R packages can find them via the "Loaded-module list".
#[cfg(windows)]
static PRELOADED_DLLS: OnceCell<Vec<Library>> = OnceCell::new();

/// Container for the loaded R library and function pointers.
pub struct RLibrary {
    _library: Library,
    // Core functions
    pub rf_initialize_r: unsafe extern "C" fn(c_int, *const *const c_char) -> c_int,
    pub setup_rmainloop: unsafe extern "C" fn(),
    pub rf_endembeddedr: unsafe extern "C" fn(c_int),

    // Parsing and evaluation
    pub r_parsevector: unsafe extern "C" fn(SEXP, c_int, *mut ParseStatus, SEXP) -> SEXP,
    pub rf_protect: unsafe extern "C" fn(SEXP) -> SEXP,
    pub rf_unprotect: unsafe extern "C" fn(c_int),
    pub r_tryeval: unsafe extern "C" fn(SEXP, SEXP, *mut c_int) -> SEXP,

    // Top-level execution (for safe error handling)
    pub r_toplevelexec: unsafe extern "C" fn(
        Option<unsafe extern "C" fn(*mut std::ffi::c_void)>,
        *mut std::ffi::c_void,
    ) -> Rboolean,

    // Eval (without error handling - use inside R_ToplevelExec)
    pub rf_eval: unsafe extern "C" fn(SEXP, SEXP) -> SEXP,

    // String functions
    pub rf_mkchar: unsafe extern "C" fn(*const c_char) -> SEXP,
    pub rf_mkstring: unsafe extern "C" fn(*const c_char) -> SEXP,
    pub r_charsxp: unsafe extern "C" fn(SEXP) -> *const c_char,

    // Vector functions
    pub rf_allocvector: unsafe extern "C" fn(c_int, isize) -> SEXP,
    pub rf_length: unsafe extern "C" fn(SEXP) -> c_int,
    pub rf_xlength: unsafe extern "C" fn(SEXP) -> isize,
    pub set_string_elt: unsafe extern "C" fn(SEXP, isize, SEXP),
    pub string_elt: unsafe extern "C" fn(SEXP, isize) -> SEXP,
    pub vector_elt: unsafe extern "C" fn(SEXP, isize) -> SEXP,
    pub set_vector_elt: unsafe extern "C" fn(SEXP, isize, SEXP) -> SEXP,

    // Atomic vector data access
    pub real: unsafe extern "C" fn(SEXP) -> *mut f64,
    pub integer: unsafe extern "C" fn(SEXP) -> *mut c_int,
    pub logical: unsafe extern "C" fn(SEXP) -> *mut c_int,

    // Scalar constructors
    pub rf_scalarreal: unsafe extern "C" fn(f64) -> SEXP,
    pub rf_scalarinteger: unsafe extern "C" fn(c_int) -> SEXP,
    pub rf_scalarlogical: unsafe extern "C" fn(c_int) -> SEXP,

    // Type and class checking
    pub rf_typeof: unsafe extern "C" fn(SEXP) -> c_int,
    pub rf_isstring: unsafe extern "C" fn(SEXP) -> Rboolean,
    pub rf_inherits: unsafe extern "C" fn(SEXP, *const c_char) -> Rboolean,

    // Attribute access
    pub rf_getattrib: unsafe extern "C" fn(SEXP, SEXP) -> SEXP,
    pub rf_setattrib: unsafe extern "C" fn(SEXP, SEXP, SEXP) -> SEXP,

    // Symbol installation
    pub rf_install: unsafe extern "C" fn(*const c_char) -> SEXP,

    // Call construction (pairlist cells and tags)
    pub rf_lcons: unsafe extern "C" fn(SEXP, SEXP) -> SEXP,
    pub rf_cons: unsafe extern "C" fn(SEXP, SEXP) -> SEXP,
    pub set_tag: unsafe extern "C" fn(SEXP, SEXP),

    // NA handling
    pub r_isna: unsafe extern "C" fn(f64) -> c_int,

    // Global symbols
    pub r_nilvalue: *mut SEXP,
    pub r_globalenv: *mut SEXP,
    pub r_baseenv: *mut SEXP,
    pub r_unboundvalue: *mut SEXP,
    pub r_nastring: *mut SEXP,

    // Attribute symbols
    pub r_namessymbol: *mut SEXP,
    pub r_classsymbol: *mut SEXP,
    pub r_rownamessymbol: *mut SEXP,
    pub r_levelssymbol: *mut SEXP,

    // NA sentinels for atomic vectors
    pub r_nareal: *mut f64,
    pub r_naint: *mut c_int,

    // Stack limit (for embedded R)
    pub r_cstacklimit: *mut usize,

    // Console callbacks (Unix only - Windows uses Rstart params)
    #[cfg(unix)]
    pub ptr_r_readconsole: *mut ReadConsoleFunc,
    #[cfg(unix)]
    pub ptr_r_writeconsoleex: *mut WriteConsoleExFunc,
    #[cfg(unix)]
    pub ptr_r_writeconsole: *mut Option<unsafe extern "C" fn(*const c_char, c_int)>,

    // Console file pointers (must be NULL for callbacks to work)
    #[cfg(unix)]
    pub r_consolefile: *mut *mut std::ffi::c_void,
    #[cfg(unix)]
    pub r_outputfile: *mut *mut std::ffi::c_void,

    // Windows-specific initialization functions
    #[cfg(windows)]
    pub r_defparamsex: unsafe extern "C" fn(*mut crate::types::Rstart, c_int),
    #[cfg(windows)]
    pub r_setparams: unsafe extern "C" fn(*mut crate::types::Rstart),
    #[cfg(windows)]
    pub cmdlineoptions: unsafe extern "C" fn(c_int, *mut *mut c_char),
    #[cfg(windows)]
    pub r_common_command_line:
        unsafe extern "C" fn(*mut c_int, *mut *mut c_char, *mut crate::types::Rstart),

    // R state variables
    pub r_interactive: *mut c_int,
    pub r_signalhandlers: *mut c_int,
    pub r_running_as_main_program: *mut c_int,
}

// Safety: RLibrary contains only function pointers and raw pointers that are
// used in a thread-safe manner (R is single-threaded anyway).
unsafe impl Send for RLibrary {}
unsafe impl Sync for RLibrary {}

impl RLibrary {
    /// Load the R library from the given path.
    ///
    /// On Unix, the library is loaded with RTLD_GLOBAL so that R packages
    /// can find libR.so symbols when loading their own shared libraries.
    ///
    /// On Windows, we preemptively load supporting R DLLs (Rlapack, Riconv,
    /// Rblas) before loading R.dll. This is necessary because R packages
    /// (including base packages like 'stats') link to these DLLs, and Windows
    /// searches the "Loaded-module list" when resolving DLL dependencies.
    pub fn load(library_path: &Path) -> RResult<Self> {
        unsafe {
            #[cfg(unix)]
            let library = {
                use libloading::os::unix::Library as UnixLibrary;
                // RTLD_NOW = 0x2, RTLD_GLOBAL = 0x100
                const RTLD_NOW: libc::c_int = 0x2;
                const RTLD_GLOBAL: libc::c_int = 0x100;
                let unix_lib = UnixLibrary::open(Some(library_path), RTLD_NOW | RTLD_GLOBAL)
                    .map_err(|e| RError::LibraryNotFound(e.to_string()))?;
                Library::from(unix_lib)
            };

            #[cfg(windows)]
            let library = {
                use libloading::os::windows::LOAD_LIBRARY_SEARCH_DLL_LOAD_DIR;
                use libloading::os::windows::LOAD_LIBRARY_SEARCH_SYSTEM32;
                use libloading::os::windows::Library as WinLibrary;

                // Preload supporting DLLs before loading R.dll so they're in
                // the "Loaded-module list" when R packages resolve their
                // dependencies.
                let dll_dir = library_path.parent().ok_or_else(|| {
                    RError::LibraryNotFound("Cannot determine R DLL directory".to_string())
                })?;

                let _ = PRELOADED_DLLS.get_or_init(|| {
                    let flags = LOAD_LIBRARY_SEARCH_DLL_LOAD_DIR | LOAD_LIBRARY_SEARCH_SYSTEM32;
                    let support_dlls = ["Rblas.dll", "Riconv.dll", "Rlapack.dll"];
                    let mut loaded = Vec::new();

                    for dll_name in &support_dlls {
                        let dll_path = dll_dir.join(dll_name);
                        if dll_path.exists() {
                            match WinLibrary::load_with_flags(&dll_path, flags) {
                                Ok(lib) => {
                                    log::info!("[WINDOWS] Preloaded {}", dll_name);
                                    loaded.push(Library::from(lib));
                                }
                                Err(e) => {
                                    log::warn!("[WINDOWS] Failed to preload {}: {:?}", dll_name, e);
                                }
                            }
                        }
                    }

                    loaded
                });

                let flags = LOAD_LIBRARY_SEARCH_DLL_LOAD_DIR | LOAD_LIBRARY_SEARCH_SYSTEM32;
                let win_lib = WinLibrary::load_with_flags(library_path, flags)
                    .map_err(|e| RError::LibraryNotFound(e.to_string()))?;
                Library::from(win_lib)
            };

            macro_rules! load_symbol {
                ($name:ident, $sym:expr) => {
                    let $name: Symbol<_> = library.get($sym).map_err(|_| {
                        RError::FunctionNotFound(String::from_utf8_lossy($sym).to_string())
                    })?;
                    let $name = *$name;
                };
            }

            // Macro for loading global symbol pointers (platform-specific)
            #[cfg(unix)]
            macro_rules! load_ptr {
                ($name:ident, $sym:expr, $ty:ty) => {
                    let $name: Symbol<$ty> = library.get($sym).map_err(|_| {
                        RError::FunctionNotFound(String::from_utf8_lossy($sym).to_string())
                    })?;
                    let $name = $name.into_raw().into_raw() as *mut $ty;
                };
            }

            #[cfg(windows)]
            macro_rules! load_ptr {
                ($name:ident, $sym:expr, $ty:ty) => {
                    let $name: Symbol<$ty> = library.get($sym).map_err(|_| {
                        RError::FunctionNotFound(String::from_utf8_lossy($sym).to_string())
                    })?;
                    // On Windows, into_raw() returns os::windows::Symbol, then
                    // into_raw() returns Option<FARPROC>: the symbol address.
                    let $name = $name
                        .into_raw()
                        .into_raw()
                        .map(|f| f as usize as *mut $ty)
                        .unwrap_or(std::ptr::null_mut());
                };
            }

            // Core functions
            load_symbol!(rf_initialize_r, b"Rf_initialize_R\0");
            load_symbol!(setup_rmainloop, b"setup_Rmainloop\0");
            load_symbol!(rf_endembeddedr, b"Rf_endEmbeddedR\0");

            // Parsing and evaluation
            load_symbol!(r_parsevector, b"R_ParseVector\0");
            load_symbol!(rf_protect, b"Rf_protect\0");
            load_symbol!(rf_unprotect, b"Rf_unprotect\0");
            load_symbol!(r_tryeval, b"R_tryEval\0");
            load_symbol!(r_toplevelexec, b"R_ToplevelExec\0");
            load_symbol!(rf_eval, b"Rf_eval\0");

            // Strings
            load_symbol!(rf_mkchar, b"Rf_mkChar\0");
            load_symbol!(rf_mkstring, b"Rf_mkString\0");
            load_symbol!(r_charsxp, b"R_CHAR\0");

            // Vectors
            load_symbol!(rf_allocvector, b"Rf_allocVector\0");
            load_symbol!(rf_length, b"Rf_length\0");
            load_symbol!(rf_xlength, b"Rf_xlength\0");
            load_symbol!(set_string_elt, b"SET_STRING_ELT\0");
            load_symbol!(string_elt, b"STRING_ELT\0");
            load_symbol!(vector_elt, b"VECTOR_ELT\0");
            load_symbol!(set_vector_elt, b"SET_VECTOR_ELT\0");

            // Atomic vector data access
            load_symbol!(real, b"REAL\0");
            load_symbol!(integer, b"INTEGER\0");
            load_symbol!(logical, b"LOGICAL\0");

            // Scalar constructors
            load_symbol!(rf_scalarreal, b"Rf_ScalarReal\0");
            load_symbol!(rf_scalarinteger, b"Rf_ScalarInteger\0");
            load_symbol!(rf_scalarlogical, b"Rf_ScalarLogical\0");

            // Type and class checking
            load_symbol!(rf_typeof, b"TYPEOF\0");
            load_symbol!(rf_isstring, b"Rf_isString\0");
            load_symbol!(rf_inherits, b"Rf_inherits\0");

            // Attributes
            load_symbol!(rf_getattrib, b"Rf_getAttrib\0");
            load_symbol!(rf_setattrib, b"Rf_setAttrib\0");

            // Symbol installation
            load_symbol!(rf_install, b"Rf_install\0");

            // Call construction
            load_symbol!(rf_lcons, b"Rf_lcons\0");
            load_symbol!(rf_cons, b"Rf_cons\0");
            load_symbol!(set_tag, b"SET_TAG\0");

            // NA handling
            load_symbol!(r_isna, b"R_IsNA\0");

            // Global symbols
            load_ptr!(r_nilvalue, b"R_NilValue\0", SEXP);
            load_ptr!(r_globalenv, b"R_GlobalEnv\0", SEXP);
            load_ptr!(r_baseenv, b"R_BaseEnv\0", SEXP);
            load_ptr!(r_unboundvalue, b"R_UnboundValue\0", SEXP);
            load_ptr!(r_nastring, b"R_NaString\0", SEXP);

            // Attribute symbols
            load_ptr!(r_namessymbol, b"R_NamesSymbol\0", SEXP);
            load_ptr!(r_classsymbol, b"R_ClassSymbol\0", SEXP);
            load_ptr!(r_rownamessymbol, b"R_RowNamesSymbol\0", SEXP);
            load_ptr!(r_levelssymbol, b"R_LevelsSymbol\0", SEXP);

            // NA sentinels
            load_ptr!(r_nareal, b"R_NaReal\0", f64);
            load_ptr!(r_naint, b"R_NaInt\0", c_int);

            // Stack limit pointer
            load_ptr!(r_cstacklimit, b"R_CStackLimit\0", usize);

            // Console callbacks (Unix only - Windows uses Rstart params)
            #[cfg(unix)]
            load_ptr!(ptr_r_readconsole, b"ptr_R_ReadConsole\0", ReadConsoleFunc);
            #[cfg(unix)]
            load_ptr!(
                ptr_r_writeconsoleex,
                b"ptr_R_WriteConsoleEx\0",
                WriteConsoleExFunc
            );
            #[cfg(unix)]
            load_ptr!(
                ptr_r_writeconsole,
                b"ptr_R_WriteConsole\0",
                Option<unsafe extern "C" fn(*const c_char, c_int)>
            );

            // Console file pointers (Unix only)
            #[cfg(unix)]
            load_ptr!(r_consolefile, b"R_Consolefile\0", *mut std::ffi::c_void);
            #[cfg(unix)]
            load_ptr!(r_outputfile, b"R_Outputfile\0", *mut std::ffi::c_void);

            // Windows-specific initialization functions
            #[cfg(windows)]
            load_symbol!(r_defparamsex, b"R_DefParamsEx\0");
            #[cfg(windows)]
            load_symbol!(r_setparams, b"R_SetParams\0");
            #[cfg(windows)]
            load_symbol!(cmdlineoptions, b"cmdlineoptions\0");
            #[cfg(windows)]
            load_symbol!(r_common_command_line, b"R_common_command_line\0");

            // R state variables (addresses of global ints; optional symbols)
            #[cfg(unix)]
            let r_interactive: *mut c_int = library
                .get::<c_int>(b"R_Interactive\0")
                .map(|s| s.into_raw().into_raw() as *mut c_int)
                .unwrap_or(std::ptr::null_mut());
            #[cfg(unix)]
            let r_signalhandlers: *mut c_int = library
                .get::<c_int>(b"R_SignalHandlers\0")
                .map(|s| s.into_raw().into_raw() as *mut c_int)
                .unwrap_or(std::ptr::null_mut());
            #[cfg(unix)]
            let r_running_as_main_program: *mut c_int = library
                .get::<c_int>(b"R_running_as_main_program\0")
                .map(|s| s.into_raw().into_raw() as *mut c_int)
                .unwrap_or(std::ptr::null_mut());

            #[cfg(windows)]
            let r_interactive: *mut c_int = library
                .get::<c_int>(b"R_Interactive\0")
                .ok()
                .and_then(|s| s.into_raw().into_raw().map(|f| f as usize as *mut c_int))
                .unwrap_or(std::ptr::null_mut());
            #[cfg(windows)]
            let r_signalhandlers: *mut c_int = library
                .get::<c_int>(b"R_SignalHandlers\0")
                .ok()
                .and_then(|s| s.into_raw().into_raw().map(|f| f as usize as *mut c_int))
                .unwrap_or(std::ptr::null_mut());
            #[cfg(windows)]
            let r_running_as_main_program: *mut c_int = library
                .get::<c_int>(b"R_running_as_main_program\0")
                .ok()
                .and_then(|s| s.into_raw().into_raw().map(|f| f as usize as *mut c_int))
                .unwrap_or(std::ptr::null_mut());

            Ok(RLibrary {
                _library: library,
                rf_initialize_r,
                setup_rmainloop,
                rf_endembeddedr,
                r_parsevector,
                rf_protect,
                rf_unprotect,
                r_tryeval,
                r_toplevelexec,
                rf_eval,
                rf_mkchar,
                rf_mkstring,
                r_charsxp,
                rf_allocvector,
                rf_length,
                rf_xlength,
                set_string_elt,
                string_elt,
                vector_elt,
                set_vector_elt,
                real,
                integer,
                logical,
                rf_scalarreal,
                rf_scalarinteger,
                rf_scalarlogical,
                rf_typeof,
                rf_isstring,
                rf_inherits,
                rf_getattrib,
                rf_setattrib,
                rf_install,
                rf_lcons,
                rf_cons,
                set_tag,
                r_isna,
                r_nilvalue,
                r_globalenv,
                r_baseenv,
                r_unboundvalue,
                r_nastring,
                r_namessymbol,
                r_classsymbol,
                r_rownamessymbol,
                r_levelssymbol,
                r_nareal,
                r_naint,
                r_cstacklimit,
                #[cfg(unix)]
                ptr_r_readconsole,
                #[cfg(unix)]
                ptr_r_writeconsoleex,
                #[cfg(unix)]
                ptr_r_writeconsole,
                #[cfg(unix)]
                r_consolefile,
                #[cfg(unix)]
                r_outputfile,
                #[cfg(windows)]
                r_defparamsex,
                #[cfg(windows)]
                r_setparams,
                #[cfg(windows)]
                cmdlineoptions,
                #[cfg(windows)]
                r_common_command_line,
                r_interactive,
                r_signalhandlers,
                r_running_as_main_program,
            })
        }
    }
}

/// Initialize the global R library.
pub fn init_r_library(library_path: &Path) -> RResult<()> {
    R_LIBRARY
        .set(RLibrary::load(library_path)?)
        .map_err(|_| RError::EvalError("R library already initialized".to_string()))
}

/// Get a reference to the global R library.
pub fn r_library() -> RResult<&'static RLibrary> {
    R_LIBRARY.get().ok_or(RError::NotInitialized)
}

/// Get R_NilValue.
pub fn r_nil_value() -> RResult<SEXP> {
    let lib = r_library()?;
    unsafe { Ok(*lib.r_nilvalue) }
}

/// Get R_GlobalEnv.
pub fn r_global_env() -> RResult<SEXP> {
    let lib = r_library()?;
    unsafe { Ok(*lib.r_globalenv) }
}
