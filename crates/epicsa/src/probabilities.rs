//! Wrappers for the `epicsawrap` probability functions.

use crate::error::EpicsaResult;
use crate::summaries::summary_frame;
use crate::{session, validate};
use epicsa_harp::{DataFrame, RFunction};

/// Probabilities of crop success for combinations of water requirement,
/// planting date and planting length.
///
/// Every optional parameter passes through as R NULL when `None`, so the
/// package applies the definitions stored for the station.
pub fn crop_success_probabilities(
    country: &str,
    station_id: &str,
    water_requirements: Option<&[f64]>,
    planting_dates: Option<&[f64]>,
    planting_length: Option<&[f64]>,
    start_before_season: Option<bool>,
) -> EpicsaResult<DataFrame> {
    validate::station(country, station_id)?;
    validate::finite_values("water_requirements", water_requirements)?;
    validate::finite_values("planting_dates", planting_dates)?;
    validate::finite_values("planting_length", planting_length)?;
    session::ensure_ready()?;

    let result = RFunction::from_package("epicsawrap", "crop_success_probabilities")
        .arg("country", country)
        .arg("station_id", station_id)
        .arg("water_requirements", water_requirements)
        .arg("planting_dates", planting_dates)
        .arg("planting_length", planting_length)
        .arg("start_before_season", start_before_season)
        .call()?;
    summary_frame(&result)
}

/// Probabilities of the season starting on or before each given day of year.
pub fn season_start_probabilities(
    country: &str,
    station_id: &str,
    start_dates: Option<&[f64]>,
) -> EpicsaResult<DataFrame> {
    validate::station(country, station_id)?;
    validate::finite_values("start_dates", start_dates)?;
    session::ensure_ready()?;

    let result = RFunction::from_package("epicsawrap", "season_start_probabilities")
        .arg("country", country)
        .arg("station_id", station_id)
        .arg("start_dates", start_dates)
        .call()?;
    summary_frame(&result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EpicsaError;

    #[test]
    fn test_crop_success_rejects_empty_station() {
        let result = crop_success_probabilities("zm", "", None, None, None, None);
        assert!(matches!(result, Err(EpicsaError::InvalidArgument(_))));
    }

    #[test]
    fn test_crop_success_rejects_nan_requirement() {
        let result = crop_success_probabilities(
            "zm",
            "01122",
            Some(&[100.0, f64::NAN]),
            None,
            None,
            None,
        );
        assert!(matches!(result, Err(EpicsaError::InvalidArgument(_))));
    }

    #[test]
    fn test_crop_success_rejects_empty_planting_dates() {
        let result = crop_success_probabilities("zm", "01122", None, Some(&[]), None, None);
        assert!(matches!(result, Err(EpicsaError::InvalidArgument(_))));
    }

    #[test]
    fn test_season_start_rejects_empty_country() {
        let result = season_start_probabilities("", "01122", None);
        assert!(matches!(result, Err(EpicsaError::InvalidArgument(_))));
    }

    #[test]
    fn test_season_start_rejects_infinite_start_date() {
        let result = season_start_probabilities("zm", "01122", Some(&[f64::INFINITY]));
        assert!(matches!(result, Err(EpicsaError::InvalidArgument(_))));
    }
}
