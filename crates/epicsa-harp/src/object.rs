//! Safe wrapper around R's SEXP objects.

use crate::error::{HarpError, HarpResult};
use crate::protect::RProtect;
use epicsa_libr::{SEXP, SexpType, r_library, r_nil_value};
use std::ffi::{CStr, CString};

/// A safe wrapper around an R SEXP object.
///
/// This struct manages the lifetime and protection of R objects.
#[derive(Debug)]
pub struct RObject {
    sexp: SEXP,
    _protect: RProtect,
}

impl RObject {
    /// Create a new RObject from a raw SEXP.
    ///
    /// # Safety
    /// The caller must ensure that `sexp` is a valid R object.
    pub unsafe fn new(sexp: SEXP) -> Self {
        let mut protect = RProtect::new();
        // SAFETY: The caller guarantees sexp is valid, and we're inside an unsafe fn
        let sexp = unsafe { protect.protect(sexp) };
        RObject {
            sexp,
            _protect: protect,
        }
    }

    /// Get the raw SEXP pointer.
    pub fn sexp(&self) -> SEXP {
        self.sexp
    }

    /// Check if this object is R's NULL.
    pub fn is_null(&self) -> bool {
        if let Ok(nil) = r_nil_value() {
            self.sexp == nil
        } else {
            false
        }
    }

    /// Get the type of this R object.
    pub fn sexp_type(&self) -> HarpResult<SexpType> {
        let lib = r_library()?;
        let type_int = unsafe { (lib.rf_typeof)(self.sexp) };
        match type_int as u32 {
            0 => Ok(SexpType::NilSxp),
            1 => Ok(SexpType::SymSxp),
            2 => Ok(SexpType::ListSxp),
            3 => Ok(SexpType::ClosSxp),
            4 => Ok(SexpType::EnvSxp),
            5 => Ok(SexpType::PromSxp),
            6 => Ok(SexpType::LangSxp),
            7 => Ok(SexpType::SpecialSxp),
            8 => Ok(SexpType::BuiltinSxp),
            9 => Ok(SexpType::CharSxp),
            10 => Ok(SexpType::LglSxp),
            13 => Ok(SexpType::IntSxp),
            14 => Ok(SexpType::RealSxp),
            15 => Ok(SexpType::CplxSxp),
            16 => Ok(SexpType::StrSxp),
            17 => Ok(SexpType::DotSxp),
            18 => Ok(SexpType::AnySxp),
            19 => Ok(SexpType::VecSxp),
            20 => Ok(SexpType::ExprSxp),
            21 => Ok(SexpType::BcodeSxp),
            22 => Ok(SexpType::ExtptrSxp),
            23 => Ok(SexpType::WeakrefSxp),
            24 => Ok(SexpType::RawSxp),
            25 => Ok(SexpType::S4Sxp),
            _ => Err(HarpError::TypeMismatch {
                expected: "known SEXP type".to_string(),
                actual: format!("unknown type {}", type_int),
            }),
        }
    }

    /// Get the length of this object (vector length, or list element count).
    pub fn len(&self) -> HarpResult<usize> {
        let lib = r_library()?;
        Ok(unsafe { (lib.rf_xlength)(self.sexp) } as usize)
    }

    /// Check whether this object has zero length.
    pub fn is_empty(&self) -> HarpResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Check whether this object inherits from the given S3 class.
    pub fn inherits(&self, class: &str) -> HarpResult<bool> {
        let lib = r_library()?;
        let class_cstring = CString::new(class).map_err(|_| HarpError::TypeMismatch {
            expected: "class name without null bytes".to_string(),
            actual: "string with null byte".to_string(),
        })?;
        Ok(unsafe { (lib.rf_inherits)(self.sexp, class_cstring.as_ptr()) } != 0)
    }

    /// Get a named attribute of this object, or None if unset.
    pub fn attribute(&self, name: &str) -> HarpResult<Option<RObject>> {
        let lib = r_library()?;
        let name_cstring = CString::new(name).map_err(|_| HarpError::TypeMismatch {
            expected: "attribute name without null bytes".to_string(),
            actual: "string with null byte".to_string(),
        })?;
        unsafe {
            let symbol = (lib.rf_install)(name_cstring.as_ptr());
            let value = (lib.rf_getattrib)(self.sexp, symbol);
            if value == r_nil_value()? {
                Ok(None)
            } else {
                Ok(Some(RObject::new(value)))
            }
        }
    }

    /// Get the `names` attribute as a vector of strings, or None if unset.
    pub fn names(&self) -> HarpResult<Option<Vec<String>>> {
        let lib = r_library()?;
        unsafe {
            let names = (lib.rf_getattrib)(self.sexp, *lib.r_namessymbol);
            if names == r_nil_value()? {
                return Ok(None);
            }
            let names = RObject::new(names);
            Ok(Some(names.as_string_vec()?.into_iter().map(|s| s.unwrap_or_default()).collect()))
        }
    }

    /// Get an element of a list (VECSXP) by position.
    pub fn list_elt(&self, index: usize) -> HarpResult<RObject> {
        if self.sexp_type()? != SexpType::VecSxp {
            return Err(HarpError::TypeMismatch {
                expected: "list".to_string(),
                actual: format!("{:?}", self.sexp_type()?),
            });
        }
        let length = self.len()?;
        if index >= length {
            return Err(HarpError::IndexOutOfBounds { index, length });
        }
        let lib = r_library()?;
        unsafe { Ok(RObject::new((lib.vector_elt)(self.sexp, index as isize))) }
    }

    /// Extract a scalar double. Accepts a length-1 double or integer vector.
    pub fn as_f64(&self) -> HarpResult<f64> {
        let values = self.as_f64_vec()?;
        match values.as_slice() {
            [Some(value)] => Ok(*value),
            [None] => Err(HarpError::TypeMismatch {
                expected: "non-NA numeric scalar".to_string(),
                actual: "NA".to_string(),
            }),
            _ => Err(HarpError::TypeMismatch {
                expected: "numeric scalar".to_string(),
                actual: format!("vector of length {}", values.len()),
            }),
        }
    }

    /// Extract a scalar logical. Accepts a length-1 logical vector.
    pub fn as_bool(&self) -> HarpResult<bool> {
        let values = self.as_bool_vec()?;
        match values.as_slice() {
            [Some(value)] => Ok(*value),
            [None] => Err(HarpError::TypeMismatch {
                expected: "non-NA logical scalar".to_string(),
                actual: "NA".to_string(),
            }),
            _ => Err(HarpError::TypeMismatch {
                expected: "logical scalar".to_string(),
                actual: format!("vector of length {}", values.len()),
            }),
        }
    }

    /// Extract a scalar string. Accepts a length-1 character vector.
    pub fn as_string(&self) -> HarpResult<String> {
        let values = self.as_string_vec()?;
        match values.into_iter().collect::<Vec<_>>().as_slice() {
            [Some(value)] => Ok(value.clone()),
            [None] => Err(HarpError::TypeMismatch {
                expected: "non-NA character scalar".to_string(),
                actual: "NA".to_string(),
            }),
            other => Err(HarpError::TypeMismatch {
                expected: "character scalar".to_string(),
                actual: format!("vector of length {}", other.len()),
            }),
        }
    }

    /// Extract a double vector, mapping NA to None.
    ///
    /// Integer vectors are widened to doubles so callers don't have to care
    /// whether R produced `1L` or `1.0`.
    pub fn as_f64_vec(&self) -> HarpResult<Vec<Option<f64>>> {
        let lib = r_library()?;
        let length = self.len()?;

        match self.sexp_type()? {
            SexpType::RealSxp => unsafe {
                let data = (lib.real)(self.sexp);
                if data.is_null() {
                    return Err(HarpError::NullPointer);
                }
                let mut values = Vec::with_capacity(length);
                for i in 0..length {
                    let x = *data.add(i);
                    if (lib.r_isna)(x) != 0 {
                        values.push(None);
                    } else {
                        values.push(Some(x));
                    }
                }
                Ok(values)
            },
            SexpType::IntSxp => Ok(self
                .as_i32_vec()?
                .into_iter()
                .map(|v| v.map(f64::from))
                .collect()),
            other => Err(HarpError::TypeMismatch {
                expected: "double vector".to_string(),
                actual: format!("{:?}", other),
            }),
        }
    }

    /// Extract an integer vector, mapping NA to None.
    pub fn as_i32_vec(&self) -> HarpResult<Vec<Option<i32>>> {
        let lib = r_library()?;
        if self.sexp_type()? != SexpType::IntSxp {
            return Err(HarpError::TypeMismatch {
                expected: "integer vector".to_string(),
                actual: format!("{:?}", self.sexp_type()?),
            });
        }
        let length = self.len()?;
        unsafe {
            let data = (lib.integer)(self.sexp);
            if data.is_null() {
                return Err(HarpError::NullPointer);
            }
            let na = *lib.r_naint;
            let mut values = Vec::with_capacity(length);
            for i in 0..length {
                let x = *data.add(i);
                values.push(if x == na { None } else { Some(x) });
            }
            Ok(values)
        }
    }

    /// Extract a logical vector, mapping NA to None.
    pub fn as_bool_vec(&self) -> HarpResult<Vec<Option<bool>>> {
        let lib = r_library()?;
        if self.sexp_type()? != SexpType::LglSxp {
            return Err(HarpError::TypeMismatch {
                expected: "logical vector".to_string(),
                actual: format!("{:?}", self.sexp_type()?),
            });
        }
        let length = self.len()?;
        unsafe {
            // LOGICAL data is stored as c_int with R_NaInt as the NA sentinel
            let data = (lib.logical)(self.sexp);
            if data.is_null() {
                return Err(HarpError::NullPointer);
            }
            let na = *lib.r_naint;
            let mut values = Vec::with_capacity(length);
            for i in 0..length {
                let x = *data.add(i);
                values.push(if x == na { None } else { Some(x != 0) });
            }
            Ok(values)
        }
    }

    /// Extract a character vector, mapping NA to None.
    pub fn as_string_vec(&self) -> HarpResult<Vec<Option<String>>> {
        let lib = r_library()?;
        if unsafe { (lib.rf_isstring)(self.sexp) } == 0 {
            return Err(HarpError::TypeMismatch {
                expected: "character vector".to_string(),
                actual: format!("{:?}", self.sexp_type()?),
            });
        }
        let length = self.len()?;
        unsafe {
            let na_string = *lib.r_nastring;
            let mut values = Vec::with_capacity(length);
            for i in 0..length {
                let elt = (lib.string_elt)(self.sexp, i as isize);
                if elt == na_string {
                    values.push(None);
                    continue;
                }
                let c_str = (lib.r_charsxp)(elt);
                if c_str.is_null() {
                    return Err(HarpError::NullPointer);
                }
                values.push(Some(CStr::from_ptr(c_str).to_string_lossy().into_owned()));
            }
            Ok(values)
        }
    }
}
