//! Integration tests for the wrapper functions.
//!
//! The wrappers need a local R installation with the `epicsawrap` package
//! (and its data environment) installed. Tests that call into the package
//! are skipped with a message when either is missing; validation tests run
//! everywhere.

use epicsa::{annual_rainfall_summaries, season_start_probabilities, EpicsaError};
use epicsa_harp::RFunction;
use once_cell::sync::OnceCell;
use std::sync::Mutex;

/// Global lock to ensure R tests run serially (R is not thread-safe).
static R_LOCK: OnceCell<Mutex<()>> = OnceCell::new();

/// Initialize R once for all tests.
fn ensure_r_initialized() -> bool {
    static R_INITIALIZED: OnceCell<bool> = OnceCell::new();

    *R_INITIALIZED.get_or_init(|| {
        let _ = env_logger::builder().is_test(true).try_init();
        unsafe {
            match epicsa_libr::initialize_r() {
                Ok(()) => true,
                Err(e) => {
                    eprintln!("Skipping R tests, failed to initialize R: {}", e);
                    false
                }
            }
        }
    })
}

/// Run a test with the R lock held.
fn with_r<F, T>(f: F) -> Option<T>
where
    F: FnOnce() -> T,
{
    if !ensure_r_initialized() {
        return None;
    }

    let lock = R_LOCK.get_or_init(|| Mutex::new(()));
    let _guard = lock.lock().unwrap();
    Some(f())
}

/// True when the `epicsawrap` package is installed in the local R library.
fn epicsawrap_is_installed() -> bool {
    RFunction::new("requireNamespace")
        .push("epicsawrap")
        .arg("quietly", true)
        .call()
        .ok()
        .and_then(|r| r.as_bool().ok())
        .unwrap_or(false)
}

#[test]
fn test_annual_rainfall_summaries_shape() {
    with_r(|| {
        if !epicsawrap_is_installed() {
            eprintln!("Skipping test_annual_rainfall_summaries_shape: epicsawrap not installed");
            return;
        }

        let frame = annual_rainfall_summaries("zm", "01122", None)
            .expect("annual_rainfall_summaries should succeed");

        assert!(frame.n_rows() > 0, "summary frame should have rows");
        assert!(
            frame.names().iter().any(|n| *n == "year"),
            "summary frame should carry a year column, got: {:?}",
            frame.names()
        );
    });
}

#[test]
fn test_season_start_probabilities_shape() {
    with_r(|| {
        if !epicsawrap_is_installed() {
            eprintln!("Skipping test_season_start_probabilities_shape: epicsawrap not installed");
            return;
        }

        let frame = season_start_probabilities("zm", "16", Some(&[110.0, 120.0, 130.0]))
            .expect("season_start_probabilities should succeed");
        assert!(frame.n_rows() > 0, "probability frame should have rows");
    });
}

#[test]
fn test_unknown_station_surfaces_r_error() {
    with_r(|| {
        if !epicsawrap_is_installed() {
            eprintln!("Skipping test_unknown_station_surfaces_r_error: epicsawrap not installed");
            return;
        }

        // Fails either in the data-environment bootstrap or in the package
        // call itself, depending on what the local setup provides.
        let result = annual_rainfall_summaries("zz", "no_such_station", None);
        assert!(result.is_err(), "unknown station must not return a frame");
    });
}

#[test]
fn test_validation_runs_before_r() {
    // No with_r: invalid arguments must be rejected without initializing R.
    let result = annual_rainfall_summaries("", "", None);
    assert!(matches!(result, Err(EpicsaError::InvalidArgument(_))));
}
