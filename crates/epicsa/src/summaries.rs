//! Wrappers for the `epicsawrap` summary functions.
//!
//! Each wrapper validates its arguments, ensures the R session and data
//! environment are ready, calls the package function by its namespace, and
//! converts the returned data frame into a [`DataFrame`].

use crate::error::EpicsaResult;
use crate::{session, validate};
use epicsa_harp::{DataFrame, RFunction, RObject};

/// Summaries computed by [`annual_rainfall_summaries`] when none are given.
pub const DEFAULT_RAINFALL_SUMMARIES: &[&str] = &["annual_rain", "start_rains", "end_rains"];

/// Summaries computed by the temperature wrappers when none are given.
pub const DEFAULT_TEMPERATURE_SUMMARIES: &[&str] =
    &["mean_tmin", "mean_tmax", "min_tmin", "max_tmax"];

/// Summaries computed by [`extremes_summaries`] when none are given.
pub const DEFAULT_EXTREMES_SUMMARIES: &[&str] =
    &["extremes_rain", "extremes_tmin", "extremes_tmax"];

/// The package functions return a two-element list: the summary definitions
/// first, the summary data frame second. Only the data frame is exposed.
pub(crate) fn summary_frame(result: &RObject) -> EpicsaResult<DataFrame> {
    Ok(DataFrame::from_r(&result.list_elt(1)?)?)
}

/// Annual rainfall summaries for one station.
///
/// `summaries` selects which statistics to compute; `None` requests
/// [`DEFAULT_RAINFALL_SUMMARIES`].
pub fn annual_rainfall_summaries(
    country: &str,
    station_id: &str,
    summaries: Option<&[&str]>,
) -> EpicsaResult<DataFrame> {
    let summaries = summaries.unwrap_or(DEFAULT_RAINFALL_SUMMARIES);
    validate::station(country, station_id)?;
    validate::summary_names(summaries)?;
    session::ensure_ready()?;

    let result = RFunction::from_package("epicsawrap", "annual_rainfall_summaries")
        .arg("country", country)
        .arg("station_id", station_id)
        .arg("summaries", summaries)
        .call()?;
    summary_frame(&result)
}

/// Annual temperature summaries for one station.
pub fn annual_temperature_summaries(
    country: &str,
    station_id: &str,
    summaries: Option<&[&str]>,
) -> EpicsaResult<DataFrame> {
    let summaries = summaries.unwrap_or(DEFAULT_TEMPERATURE_SUMMARIES);
    validate::station(country, station_id)?;
    validate::summary_names(summaries)?;
    session::ensure_ready()?;

    let result = RFunction::from_package("epicsawrap", "annual_temperature_summaries")
        .arg("country", country)
        .arg("station_id", station_id)
        .arg("summaries", summaries)
        .call()?;
    summary_frame(&result)
}

/// Monthly temperature summaries for one station.
pub fn monthly_temperature_summaries(
    country: &str,
    station_id: &str,
    summaries: Option<&[&str]>,
) -> EpicsaResult<DataFrame> {
    let summaries = summaries.unwrap_or(DEFAULT_TEMPERATURE_SUMMARIES);
    validate::station(country, station_id)?;
    validate::summary_names(summaries)?;
    session::ensure_ready()?;

    let result = RFunction::from_package("epicsawrap", "monthly_temperature_summaries")
        .arg("country", country)
        .arg("station_id", station_id)
        .arg("summaries", summaries)
        .call()?;
    summary_frame(&result)
}

/// Extreme rainfall and temperature summaries for one station.
pub fn extremes_summaries(
    country: &str,
    station_id: &str,
    summaries: Option<&[&str]>,
) -> EpicsaResult<DataFrame> {
    let summaries = summaries.unwrap_or(DEFAULT_EXTREMES_SUMMARIES);
    validate::station(country, station_id)?;
    validate::summary_names(summaries)?;
    session::ensure_ready()?;

    let result = RFunction::from_package("epicsawrap", "extremes_summaries")
        .arg("country", country)
        .arg("station_id", station_id)
        .arg("summaries", summaries)
        .call()?;
    summary_frame(&result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EpicsaError;

    // Validation failures must be reported without touching R.

    #[test]
    fn test_rainfall_rejects_empty_country() {
        let result = annual_rainfall_summaries("", "01122", None);
        assert!(matches!(result, Err(EpicsaError::InvalidArgument(_))));
    }

    #[test]
    fn test_rainfall_rejects_empty_station() {
        let result = annual_rainfall_summaries("zm", "", None);
        assert!(matches!(result, Err(EpicsaError::InvalidArgument(_))));
    }

    #[test]
    fn test_temperature_rejects_empty_summaries() {
        let result = annual_temperature_summaries("zm", "01122", Some(&[]));
        assert!(matches!(result, Err(EpicsaError::InvalidArgument(_))));
    }

    #[test]
    fn test_monthly_rejects_blank_summary_name() {
        let result = monthly_temperature_summaries("zm", "01122", Some(&["mean_tmin", " "]));
        assert!(matches!(result, Err(EpicsaError::InvalidArgument(_))));
    }

    #[test]
    fn test_extremes_rejects_empty_station() {
        let result = extremes_summaries("zm", "", None);
        assert!(matches!(result, Err(EpicsaError::InvalidArgument(_))));
    }
}
