//! Parsing and evaluation of R code with error capture.

use crate::error::{HarpError, HarpResult};
use crate::object::RObject;
use crate::protect::RProtect;
use epicsa_libr::{ParseStatus, RError, SEXP, r_library, r_nil_value};
use std::ffi::CString;
use std::os::raw::c_int;

/// Install (intern) an R symbol by name.
pub(crate) unsafe fn install_symbol(name: &str) -> HarpResult<SEXP> {
    let lib = r_library()?;
    let name_cstring = CString::new(name).map_err(|_| HarpError::TypeMismatch {
        expected: "symbol name without null bytes".to_string(),
        actual: "string with null byte".to_string(),
    })?;
    // SAFETY: rf_install is safe to call with a valid C string
    unsafe { Ok((lib.rf_install)(name_cstring.as_ptr())) }
}

/// Payload for R_ToplevelExec callback - parsing.
struct ParsePayload {
    code_sexp: SEXP,
    status: ParseStatus,
    result: Option<SEXP>,
}

/// Callback for R_ToplevelExec - parses the expression.
unsafe extern "C" fn parse_callback(payload: *mut std::ffi::c_void) {
    let data = unsafe { &mut *(payload as *mut ParsePayload) };
    let lib = match r_library() {
        Ok(lib) => lib,
        Err(_) => return,
    };
    let nil = match r_nil_value() {
        Ok(nil) => nil,
        Err(_) => return,
    };
    let result = unsafe { (lib.r_parsevector)(data.code_sexp, -1, &mut data.status, nil) };
    data.result = Some(result);
}

/// Fetch R's last error message via `geterrmessage()`.
///
/// Falls back to a generic message if the lookup itself fails; an error here
/// must never mask the original evaluation failure.
pub(crate) fn last_error_message() -> String {
    const FALLBACK: &str = "R evaluation failed (no error message available)";

    let Ok(lib) = r_library() else {
        return FALLBACK.to_string();
    };

    unsafe {
        let mut protect = RProtect::new();

        let Ok(sym) = install_symbol("geterrmessage") else {
            return FALLBACK.to_string();
        };
        let Ok(nil) = r_nil_value() else {
            return FALLBACK.to_string();
        };
        let call = protect.protect((lib.rf_lcons)(sym, nil));

        let mut error: c_int = 0;
        let result = (lib.r_tryeval)(call, *lib.r_baseenv, &mut error);
        if error != 0 || result.is_null() {
            return FALLBACK.to_string();
        }

        let message = RObject::new(result);
        match message.as_string() {
            Ok(s) => s.trim_end().to_string(),
            Err(_) => FALLBACK.to_string(),
        }
    }
}

/// Parse the given R source into an expression vector.
///
/// Parsing runs inside `R_ToplevelExec` so an R-level error during parsing
/// cannot longjmp across Rust frames.
unsafe fn parse_expressions(code: &str, protect: &mut RProtect) -> HarpResult<SEXP> {
    let lib = r_library()?;

    let code_cstring = CString::new(code).map_err(|_| HarpError::TypeMismatch {
        expected: "R source without null bytes".to_string(),
        actual: "string with null byte".to_string(),
    })?;

    unsafe {
        let code_sexp = protect.protect((lib.rf_mkstring)(code_cstring.as_ptr()));

        let mut payload = ParsePayload {
            code_sexp,
            status: ParseStatus::Null,
            result: None,
        };

        let success = (lib.r_toplevelexec)(
            Some(parse_callback),
            &mut payload as *mut ParsePayload as *mut std::ffi::c_void,
        );

        if success == 0 || payload.result.is_none() {
            return Err(HarpError::RError(RError::ParseError(
                "Parse error (R error during parsing)".to_string(),
            )));
        }

        let parsed = protect.protect(payload.result.unwrap());

        match payload.status {
            ParseStatus::Ok => Ok(parsed),
            ParseStatus::Incomplete => Err(HarpError::RError(RError::ParseError(
                "Incomplete expression".to_string(),
            ))),
            ParseStatus::Error => Err(HarpError::RError(RError::ParseError(
                "Parse error".to_string(),
            ))),
            other => Err(HarpError::RError(RError::ParseError(format!(
                "Unexpected parse status: {:?}",
                other
            )))),
        }
    }
}

/// Parse and evaluate an R expression string, returning the last value.
///
/// Evaluation uses `R_tryEval`, so an R error is caught and surfaced as
/// `RError::EvalError` carrying `geterrmessage()`. Nothing is printed.
pub fn eval_string(code: &str) -> HarpResult<RObject> {
    let lib = r_library()?;
    let mut protect = RProtect::new();

    unsafe {
        let parsed = parse_expressions(code, &mut protect)?;

        let n_expr = (lib.rf_length)(parsed);
        let global_env = *lib.r_globalenv;

        let mut last_result = r_nil_value()?;

        for i in 0..n_expr as isize {
            let expr = (lib.vector_elt)(parsed, i);

            let mut error: c_int = 0;
            let result = (lib.r_tryeval)(expr, global_env, &mut error);
            if error != 0 || result.is_null() {
                return Err(HarpError::RError(RError::EvalError(last_error_message())));
            }
            last_result = protect.protect(result);
        }

        Ok(RObject::new(last_result))
    }
}
