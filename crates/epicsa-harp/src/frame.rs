//! A native tabular data structure convertible to and from R data frames.

use crate::convert::{
    bool_vector_na, date_vector_na, f64_vector_na, i32_vector_na, set_class, str_vector,
    str_vector_na, unix_epoch,
};
use crate::error::{HarpError, HarpResult};
use crate::object::RObject;
use chrono::{Duration, NaiveDate};
use epicsa_libr::{SexpType, r_library};
use std::os::raw::c_int;

/// A typed data frame column. Every element is optional so R's NA survives
/// the round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Double(Vec<Option<f64>>),
    Integer(Vec<Option<i32>>),
    Logical(Vec<Option<bool>>),
    Character(Vec<Option<String>>),
    Date(Vec<Option<NaiveDate>>),
}

impl Column {
    /// Number of rows in this column.
    pub fn len(&self) -> usize {
        match self {
            Column::Double(v) => v.len(),
            Column::Integer(v) => v.len(),
            Column::Logical(v) => v.len(),
            Column::Character(v) => v.len(),
            Column::Date(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rows × named columns, the native Result Value shape for bridge calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFrame {
    columns: Vec<(String, Column)>,
}

impl DataFrame {
    /// An empty data frame.
    pub fn new() -> Self {
        DataFrame {
            columns: Vec::new(),
        }
    }

    /// Append a column, enforcing row-count consistency.
    pub fn push_column(&mut self, name: impl Into<String>, column: Column) -> HarpResult<()> {
        let name = name.into();
        if !self.columns.is_empty() && column.len() != self.n_rows() {
            return Err(HarpError::LengthMismatch {
                column: name,
                expected: self.n_rows(),
                actual: column.len(),
            });
        }
        self.columns.push((name, column));
        Ok(())
    }

    /// Builder-style variant of [`DataFrame::push_column`].
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> HarpResult<Self> {
        self.push_column(name, column)?;
        Ok(self)
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.columns.first().map(|(_, c)| c.len()).unwrap_or(0)
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Column names, in order.
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    /// Convert into an R data.frame.
    ///
    /// The result carries the `names` and `class` attributes plus R's compact
    /// row-names form `c(NA_integer_, -n)`, so no row-name vector is
    /// materialized.
    pub fn to_r(&self) -> HarpResult<RObject> {
        let lib = r_library()?;

        unsafe {
            let frame = RObject::new((lib.rf_allocvector)(
                SexpType::VecSxp as c_int,
                self.columns.len() as isize,
            ));

            for (i, (_, column)) in self.columns.iter().enumerate() {
                let vector = match column {
                    Column::Double(v) => f64_vector_na(v)?,
                    Column::Integer(v) => i32_vector_na(v)?,
                    Column::Logical(v) => bool_vector_na(v)?,
                    Column::Character(v) => str_vector_na(v)?,
                    Column::Date(v) => date_vector_na(v)?,
                };
                (lib.set_vector_elt)(frame.sexp(), i as isize, vector.sexp());
            }

            let names = str_vector(&self.names())?;
            (lib.rf_setattrib)(frame.sexp(), *lib.r_namessymbol, names.sexp());

            // Compact row names: INTSXP of [NA, -n_rows]
            let row_names = i32_vector_na(&[None, Some(-(self.n_rows() as i32))])?;
            (lib.rf_setattrib)(frame.sexp(), *lib.r_rownamessymbol, row_names.sexp());

            set_class(frame.sexp(), "data.frame")?;

            Ok(frame)
        }
    }

    /// Convert an R data.frame (or any named list of columns) back into a
    /// native `DataFrame`.
    ///
    /// Factor columns are decoded to character columns through their levels,
    /// and POSIXct columns are narrowed to dates, matching how results are
    /// expected downstream.
    pub fn from_r(object: &RObject) -> HarpResult<DataFrame> {
        if object.sexp_type()? != SexpType::VecSxp {
            return Err(HarpError::TypeMismatch {
                expected: "data.frame".to_string(),
                actual: format!("{:?}", object.sexp_type()?),
            });
        }

        let names = object.names()?.ok_or_else(|| HarpError::TypeMismatch {
            expected: "data.frame with named columns".to_string(),
            actual: "list without names".to_string(),
        })?;

        let mut frame = DataFrame::new();
        for (i, name) in names.iter().enumerate() {
            let column_object = object.list_elt(i)?;
            let column = column_from_r(&column_object)?;
            frame.push_column(name.clone(), column)?;
        }

        Ok(frame)
    }
}

/// Convert one R column vector into a typed native column.
fn column_from_r(object: &RObject) -> HarpResult<Column> {
    // S3 classes first: these refine the underlying atomic type
    if object.inherits("factor")? {
        return Ok(Column::Character(decode_factor(object)?));
    }
    if object.inherits("Date")? {
        let epoch = unix_epoch();
        let days = object.as_f64_vec()?;
        return Ok(Column::Date(
            days.into_iter()
                .map(|d| d.map(|d| epoch + Duration::days(d as i64)))
                .collect(),
        ));
    }
    if object.inherits("POSIXct")? {
        // Narrow timestamps (seconds since epoch) to dates
        let epoch = unix_epoch();
        let seconds = object.as_f64_vec()?;
        return Ok(Column::Date(
            seconds
                .into_iter()
                .map(|s| s.map(|s| epoch + Duration::days((s / 86_400.0).floor() as i64)))
                .collect(),
        ));
    }

    match object.sexp_type()? {
        SexpType::RealSxp => Ok(Column::Double(object.as_f64_vec()?)),
        SexpType::IntSxp => Ok(Column::Integer(object.as_i32_vec()?)),
        SexpType::LglSxp => Ok(Column::Logical(object.as_bool_vec()?)),
        SexpType::StrSxp => Ok(Column::Character(object.as_string_vec()?)),
        other => Err(HarpError::TypeMismatch {
            expected: "atomic data.frame column".to_string(),
            actual: format!("{:?}", other),
        }),
    }
}

/// Decode a factor column to its string labels.
///
/// Factor codes are 1-based indexes into the levels attribute; NA codes stay
/// NA.
fn decode_factor(object: &RObject) -> HarpResult<Vec<Option<String>>> {
    let levels_object = object
        .attribute("levels")?
        .ok_or_else(|| HarpError::TypeMismatch {
            expected: "factor with levels".to_string(),
            actual: "factor without levels attribute".to_string(),
        })?;
    let levels = levels_object.as_string_vec()?;

    let codes = object.as_i32_vec()?;
    let mut labels = Vec::with_capacity(codes.len());
    for code in codes {
        match code {
            None => labels.push(None),
            Some(code) => {
                let index = (code - 1) as usize;
                let label = levels
                    .get(index)
                    .ok_or(HarpError::IndexOutOfBounds {
                        index,
                        length: levels.len(),
                    })?
                    .clone();
                labels.push(label);
            }
        }
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_column_tracks_shape() {
        let mut frame = DataFrame::new();
        assert_eq!(frame.n_rows(), 0);
        assert_eq!(frame.n_cols(), 0);

        frame
            .push_column("year", Column::Integer(vec![Some(2020), Some(2021)]))
            .unwrap();
        frame
            .push_column(
                "rain",
                Column::Double(vec![Some(812.4), None]),
            )
            .unwrap();

        assert_eq!(frame.n_rows(), 2);
        assert_eq!(frame.n_cols(), 2);
        assert_eq!(frame.names(), vec!["year", "rain"]);
    }

    #[test]
    fn test_push_column_rejects_ragged_input() {
        let mut frame = DataFrame::new();
        frame
            .push_column("station", Column::Character(vec![Some("01122".to_string())]))
            .unwrap();

        let err = frame
            .push_column("rain", Column::Double(vec![Some(1.0), Some(2.0)]))
            .unwrap_err();
        assert!(matches!(
            err,
            HarpError::LengthMismatch {
                expected: 1,
                actual: 2,
                ..
            }
        ));

        // The bad column must not have been appended
        assert_eq!(frame.n_cols(), 1);
    }

    #[test]
    fn test_column_lookup() {
        let frame = DataFrame::new()
            .with_column("g", Column::Character(vec![Some("a".to_string())]))
            .unwrap();

        assert!(frame.column("g").is_some());
        assert!(frame.column("missing").is_none());
    }
}
