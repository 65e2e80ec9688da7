//! Argument validation performed before any conversion or R call.

use crate::error::{EpicsaError, EpicsaResult};

/// Reject empty country or station identifiers.
pub(crate) fn station(country: &str, station_id: &str) -> EpicsaResult<()> {
    if country.trim().is_empty() {
        return Err(EpicsaError::InvalidArgument(
            "country must not be empty".to_string(),
        ));
    }
    if station_id.trim().is_empty() {
        return Err(EpicsaError::InvalidArgument(
            "station_id must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Reject an empty summary list or blank summary names.
pub(crate) fn summary_names(summaries: &[&str]) -> EpicsaResult<()> {
    if summaries.is_empty() {
        return Err(EpicsaError::InvalidArgument(
            "summaries must not be empty".to_string(),
        ));
    }
    if let Some(blank) = summaries.iter().find(|s| s.trim().is_empty()) {
        return Err(EpicsaError::InvalidArgument(format!(
            "summary name must not be blank (got {:?})",
            blank
        )));
    }
    Ok(())
}

/// Reject empty or non-finite numeric parameter vectors.
///
/// `None` is fine (the R side applies its default); an explicitly supplied
/// vector must be non-empty and contain no NaN or infinity.
pub(crate) fn finite_values(name: &str, values: Option<&[f64]>) -> EpicsaResult<()> {
    let Some(values) = values else {
        return Ok(());
    };
    if values.is_empty() {
        return Err(EpicsaError::InvalidArgument(format!(
            "{} must not be empty",
            name
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(EpicsaError::InvalidArgument(format!(
            "{} must contain only finite values",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_rejects_empty_identifiers() {
        assert!(matches!(
            station("", "01122"),
            Err(EpicsaError::InvalidArgument(_))
        ));
        assert!(matches!(
            station("zm", "  "),
            Err(EpicsaError::InvalidArgument(_))
        ));
        assert!(station("zm", "01122").is_ok());
    }

    #[test]
    fn test_summary_names_rejects_empty_and_blank() {
        assert!(matches!(
            summary_names(&[]),
            Err(EpicsaError::InvalidArgument(_))
        ));
        assert!(matches!(
            summary_names(&["annual_rain", ""]),
            Err(EpicsaError::InvalidArgument(_))
        ));
        assert!(summary_names(&["annual_rain", "start_rains"]).is_ok());
    }

    #[test]
    fn test_finite_values() {
        assert!(finite_values("water_requirements", None).is_ok());
        assert!(finite_values("water_requirements", Some(&[100.0, 300.0])).is_ok());
        assert!(matches!(
            finite_values("water_requirements", Some(&[])),
            Err(EpicsaError::InvalidArgument(_))
        ));
        assert!(matches!(
            finite_values("water_requirements", Some(&[1.0, f64::NAN])),
            Err(EpicsaError::InvalidArgument(_))
        ));
        assert!(matches!(
            finite_values("planting_dates", Some(&[f64::INFINITY])),
            Err(EpicsaError::InvalidArgument(_))
        ));
    }
}
