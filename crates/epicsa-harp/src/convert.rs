//! Conversions from Rust values into R objects.
//!
//! Scalars map to length-1 vectors, slices map to atomic vectors, `None`
//! maps to NA inside vectors and to R NULL at argument position, and
//! `chrono::NaiveDate` maps to R's `Date` class (days since 1970-01-01).

use crate::error::{HarpError, HarpResult};
use crate::frame::DataFrame;
use crate::object::RObject;
use crate::protect::RProtect;
use chrono::{Duration, NaiveDate};
use epicsa_libr::{SEXP, SexpType, r_library, r_nil_value};
use std::ffi::CString;
use std::os::raw::c_int;

/// The origin of R's Date class.
pub(crate) fn unix_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).expect("1970-01-01 is a valid date")
}

fn cstring(value: &str) -> HarpResult<CString> {
    CString::new(value).map_err(|_| HarpError::TypeMismatch {
        expected: "string without null bytes".to_string(),
        actual: "string with null byte".to_string(),
    })
}

/// Set the S3 class attribute of a SEXP to a single class name.
///
/// # Safety
/// The caller must ensure that `sexp` is a valid, protected R object.
pub(crate) unsafe fn set_class(sexp: SEXP, class: &str) -> HarpResult<()> {
    let lib = r_library()?;
    let class_cstring = cstring(class)?;
    unsafe {
        let mut protect = RProtect::new();
        let class_sexp = protect.protect((lib.rf_mkstring)(class_cstring.as_ptr()));
        (lib.rf_setattrib)(sexp, *lib.r_classsymbol, class_sexp);
    }
    Ok(())
}

/// R NULL.
pub fn r_null() -> HarpResult<RObject> {
    unsafe { Ok(RObject::new(r_nil_value()?)) }
}

/// A length-1 character vector.
pub fn scalar_string(value: &str) -> HarpResult<RObject> {
    let lib = r_library()?;
    let value_cstring = cstring(value)?;
    unsafe { Ok(RObject::new((lib.rf_mkstring)(value_cstring.as_ptr()))) }
}

/// A length-1 double vector.
pub fn scalar_f64(value: f64) -> HarpResult<RObject> {
    let lib = r_library()?;
    unsafe { Ok(RObject::new((lib.rf_scalarreal)(value))) }
}

/// A length-1 integer vector.
pub fn scalar_i32(value: i32) -> HarpResult<RObject> {
    let lib = r_library()?;
    unsafe { Ok(RObject::new((lib.rf_scalarinteger)(value))) }
}

/// A length-1 logical vector.
pub fn scalar_bool(value: bool) -> HarpResult<RObject> {
    let lib = r_library()?;
    unsafe { Ok(RObject::new((lib.rf_scalarlogical)(if value { 1 } else { 0 }))) }
}

/// A length-1 Date vector.
pub fn scalar_date(value: NaiveDate) -> HarpResult<RObject> {
    let lib = r_library()?;
    let days = value.signed_duration_since(unix_epoch()).num_days() as f64;
    unsafe {
        let object = RObject::new((lib.rf_scalarreal)(days));
        set_class(object.sexp(), "Date")?;
        Ok(object)
    }
}

/// A character vector.
pub fn str_vector<S: AsRef<str>>(values: &[S]) -> HarpResult<RObject> {
    let lib = r_library()?;
    unsafe {
        let vector = RObject::new((lib.rf_allocvector)(
            SexpType::StrSxp as c_int,
            values.len() as isize,
        ));
        for (i, value) in values.iter().enumerate() {
            let value_cstring = cstring(value.as_ref())?;
            let elt = (lib.rf_mkchar)(value_cstring.as_ptr());
            (lib.set_string_elt)(vector.sexp(), i as isize, elt);
        }
        Ok(vector)
    }
}

/// A character vector with NA for None.
pub fn str_vector_na(values: &[Option<String>]) -> HarpResult<RObject> {
    let lib = r_library()?;
    unsafe {
        let vector = RObject::new((lib.rf_allocvector)(
            SexpType::StrSxp as c_int,
            values.len() as isize,
        ));
        for (i, value) in values.iter().enumerate() {
            let elt = match value {
                Some(s) => {
                    let value_cstring = cstring(s)?;
                    (lib.rf_mkchar)(value_cstring.as_ptr())
                }
                None => *lib.r_nastring,
            };
            (lib.set_string_elt)(vector.sexp(), i as isize, elt);
        }
        Ok(vector)
    }
}

/// A double vector.
pub fn f64_vector(values: &[f64]) -> HarpResult<RObject> {
    let lib = r_library()?;
    unsafe {
        let vector = RObject::new((lib.rf_allocvector)(
            SexpType::RealSxp as c_int,
            values.len() as isize,
        ));
        let data = (lib.real)(vector.sexp());
        if data.is_null() {
            return Err(HarpError::NullPointer);
        }
        for (i, value) in values.iter().enumerate() {
            *data.add(i) = *value;
        }
        Ok(vector)
    }
}

/// A double vector with NA for None.
pub fn f64_vector_na(values: &[Option<f64>]) -> HarpResult<RObject> {
    let lib = r_library()?;
    unsafe {
        let vector = RObject::new((lib.rf_allocvector)(
            SexpType::RealSxp as c_int,
            values.len() as isize,
        ));
        let data = (lib.real)(vector.sexp());
        if data.is_null() {
            return Err(HarpError::NullPointer);
        }
        let na = *lib.r_nareal;
        for (i, value) in values.iter().enumerate() {
            *data.add(i) = value.unwrap_or(na);
        }
        Ok(vector)
    }
}

/// An integer vector.
pub fn i32_vector(values: &[i32]) -> HarpResult<RObject> {
    i32_vector_na(&values.iter().map(|v| Some(*v)).collect::<Vec<_>>())
}

/// An integer vector with NA for None.
pub fn i32_vector_na(values: &[Option<i32>]) -> HarpResult<RObject> {
    let lib = r_library()?;
    unsafe {
        let vector = RObject::new((lib.rf_allocvector)(
            SexpType::IntSxp as c_int,
            values.len() as isize,
        ));
        let data = (lib.integer)(vector.sexp());
        if data.is_null() {
            return Err(HarpError::NullPointer);
        }
        let na = *lib.r_naint;
        for (i, value) in values.iter().enumerate() {
            *data.add(i) = value.unwrap_or(na);
        }
        Ok(vector)
    }
}

/// A logical vector with NA for None.
pub fn bool_vector_na(values: &[Option<bool>]) -> HarpResult<RObject> {
    let lib = r_library()?;
    unsafe {
        let vector = RObject::new((lib.rf_allocvector)(
            SexpType::LglSxp as c_int,
            values.len() as isize,
        ));
        let data = (lib.logical)(vector.sexp());
        if data.is_null() {
            return Err(HarpError::NullPointer);
        }
        let na = *lib.r_naint;
        for (i, value) in values.iter().enumerate() {
            *data.add(i) = match value {
                Some(true) => 1,
                Some(false) => 0,
                None => na,
            };
        }
        Ok(vector)
    }
}

/// A Date vector with NA for None.
pub fn date_vector_na(values: &[Option<NaiveDate>]) -> HarpResult<RObject> {
    let epoch = unix_epoch();
    let days: Vec<Option<f64>> = values
        .iter()
        .map(|v| v.map(|d| d.signed_duration_since(epoch).num_days() as f64))
        .collect();
    let vector = f64_vector_na(&days)?;
    unsafe { set_class(vector.sexp(), "Date")? };
    Ok(vector)
}

/// Conversion of a Rust value into an R object, for argument passing.
pub trait IntoRObject {
    fn into_r(self) -> HarpResult<RObject>;
}

impl IntoRObject for RObject {
    fn into_r(self) -> HarpResult<RObject> {
        Ok(self)
    }
}

impl IntoRObject for &str {
    fn into_r(self) -> HarpResult<RObject> {
        scalar_string(self)
    }
}

impl IntoRObject for String {
    fn into_r(self) -> HarpResult<RObject> {
        scalar_string(&self)
    }
}

impl IntoRObject for f64 {
    fn into_r(self) -> HarpResult<RObject> {
        scalar_f64(self)
    }
}

impl IntoRObject for i32 {
    fn into_r(self) -> HarpResult<RObject> {
        scalar_i32(self)
    }
}

impl IntoRObject for bool {
    fn into_r(self) -> HarpResult<RObject> {
        scalar_bool(self)
    }
}

impl IntoRObject for NaiveDate {
    fn into_r(self) -> HarpResult<RObject> {
        scalar_date(self)
    }
}

impl IntoRObject for &[&str] {
    fn into_r(self) -> HarpResult<RObject> {
        str_vector(self)
    }
}

impl IntoRObject for &[String] {
    fn into_r(self) -> HarpResult<RObject> {
        str_vector(self)
    }
}

impl IntoRObject for &[f64] {
    fn into_r(self) -> HarpResult<RObject> {
        f64_vector(self)
    }
}

impl IntoRObject for &[i32] {
    fn into_r(self) -> HarpResult<RObject> {
        i32_vector(self)
    }
}

impl IntoRObject for &[NaiveDate] {
    fn into_r(self) -> HarpResult<RObject> {
        date_vector_na(&self.iter().map(|d| Some(*d)).collect::<Vec<_>>())
    }
}

impl IntoRObject for &DataFrame {
    fn into_r(self) -> HarpResult<RObject> {
        self.to_r()
    }
}

/// None becomes R NULL, so the R side applies its own default.
impl<T: IntoRObject> IntoRObject for Option<T> {
    fn into_r(self) -> HarpResult<RObject> {
        match self {
            Some(value) => value.into_r(),
            None => r_null(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_day_offsets() {
        let epoch = unix_epoch();
        let day = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
        assert_eq!(day.signed_duration_since(epoch).num_days(), 1);

        let before = NaiveDate::from_ymd_opt(1969, 12, 31).unwrap();
        assert_eq!(before.signed_duration_since(epoch).num_days(), -1);

        let later = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!(later.signed_duration_since(epoch).num_days(), 18262);
    }

    #[test]
    fn test_epoch_round_trip() {
        let epoch = unix_epoch();
        let date = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
        let days = date.signed_duration_since(epoch).num_days();
        let back = epoch + Duration::days(days);
        assert_eq!(back, date);
    }
}
