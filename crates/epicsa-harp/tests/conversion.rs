//! Integration tests for R value conversion and call invocation.
//!
//! These tests verify that:
//! - Rust values survive the trip into R and back (NA included)
//! - `DataFrame` round-trips through an R data.frame unchanged
//! - Named and positional call arguments reach the R function
//! - R-level errors surface as `Err` carrying the R error message
//!
//! All tests require a local R installation and are skipped (with a message)
//! when R cannot be initialized.

use epicsa_harp::{Column, DataFrame, RFunction, eval_string, f64_vector_na, str_vector};
use once_cell::sync::OnceCell;
use std::env;
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

/// Check if LD_LIBRARY_PATH includes the R library directory.
/// Loading package shared objects (e.g. stats.so) requires it.
fn ld_library_path_is_set() -> bool {
    let Ok(lib_path) = epicsa_libr::find_r_library() else {
        return false;
    };
    let Some(lib_dir) = lib_path.parent() else {
        return false;
    };
    let lib_dir_str = lib_dir.to_string_lossy();
    let current = env::var("LD_LIBRARY_PATH").unwrap_or_default();
    current.split(':').any(|p| p == lib_dir_str.as_ref())
}

#[test]
fn test_eval_scalar_arithmetic() {
    with_r(|| {
        let result = eval_string("1 + 1").expect("eval should succeed");
        assert_eq!(result.as_f64().expect("scalar double"), 2.0);
    });
}

#[test]
fn test_eval_error_carries_r_message() {
    with_r(|| {
        let err = eval_string("stop('rainfall data unavailable')")
            .expect_err("stop() must surface as Err");
        assert!(
            err.to_string().contains("rainfall data unavailable"),
            "error should carry the R message, got: {}",
            err
        );
    });
}

#[test]
fn test_undefined_function_is_an_error() {
    with_r(|| {
        let result = eval_string("definitely_not_a_function_xyz()");
        assert!(result.is_err(), "calling an undefined function must fail");
    });
}

#[test]
fn test_call_with_positional_and_named_args() {
    with_r(|| {
        let result = RFunction::new("paste")
            .push("a")
            .push("b")
            .arg("sep", "-")
            .call()
            .expect("paste should succeed");
        assert_eq!(result.as_string().expect("scalar string"), "a-b");
    });
}

#[test]
fn test_namespaced_call_without_attach() {
    with_r(|| {
        let result = RFunction::from_package("base", "sum")
            .push(&[1.0, 2.0, 3.5][..])
            .call()
            .expect("base::sum should succeed");
        assert_eq!(result.as_f64().expect("scalar double"), 6.5);
    });
}

#[test]
fn test_call_error_carries_r_message() {
    with_r(|| {
        let err = RFunction::new("stop")
            .push("station not found")
            .call()
            .expect_err("stop() must surface as Err");
        assert!(
            err.to_string().contains("station not found"),
            "error should carry the R message, got: {}",
            err
        );
    });
}

#[test]
fn test_string_vector_round_trip() {
    with_r(|| {
        let vector = str_vector(&["annual_rain", "start_rains", "end_rains"])
            .expect("conversion should succeed");
        let back = vector.as_string_vec().expect("extraction should succeed");
        assert_eq!(
            back,
            vec![
                Some("annual_rain".to_string()),
                Some("start_rains".to_string()),
                Some("end_rains".to_string()),
            ]
        );
    });
}

#[test]
fn test_double_na_round_trip() {
    with_r(|| {
        let values = vec![Some(1.5), None, Some(-3.25)];
        let vector = f64_vector_na(&values).expect("conversion should succeed");
        let back = vector.as_f64_vec().expect("extraction should succeed");
        assert_eq!(back, values);

        // NA must be a real R NA, not a NaN smuggled through
        let is_na = RFunction::new("is.na")
            .push(vector)
            .call()
            .expect("is.na should succeed")
            .as_bool_vec()
            .expect("logical vector");
        assert_eq!(is_na, vec![Some(false), Some(true), Some(false)]);
    });
}

#[test]
fn test_data_frame_round_trip() {
    with_r(|| {
        let frame = DataFrame::new()
            .with_column(
                "station_id",
                Column::Character(vec![
                    Some("01122".to_string()),
                    Some("01122".to_string()),
                    None,
                ]),
            )
            .unwrap()
            .with_column(
                "year",
                Column::Integer(vec![Some(2019), Some(2020), Some(2021)]),
            )
            .unwrap()
            .with_column(
                "annual_rain",
                Column::Double(vec![Some(812.4), None, Some(655.0)]),
            )
            .unwrap();

        let r_frame = frame.to_r().expect("to_r should succeed");

        // R must agree on the shape
        let n_rows = RFunction::new("nrow")
            .push(&frame)
            .call()
            .expect("nrow should succeed")
            .as_f64()
            .expect("scalar");
        assert_eq!(n_rows, 3.0);

        let back = DataFrame::from_r(&r_frame).expect("from_r should succeed");
        assert_eq!(back, frame);
    });
}

#[test]
fn test_factor_column_decodes_to_labels() {
    with_r(|| {
        let result = eval_string("data.frame(g = factor(c('wet', 'dry', 'wet', NA)))")
            .expect("eval should succeed");
        let frame = DataFrame::from_r(&result).expect("from_r should succeed");

        assert_eq!(
            frame.column("g"),
            Some(&Column::Character(vec![
                Some("wet".to_string()),
                Some("dry".to_string()),
                Some("wet".to_string()),
                None,
            ]))
        );
    });
}

#[test]
fn test_date_column_round_trip() {
    with_r(|| {
        let result = eval_string("data.frame(d = as.Date(c('2020-01-01', NA, '1969-12-31')))")
            .expect("eval should succeed");
        let frame = DataFrame::from_r(&result).expect("from_r should succeed");

        let expected = Column::Date(vec![
            chrono::NaiveDate::from_ymd_opt(2020, 1, 1),
            None,
            chrono::NaiveDate::from_ymd_opt(1969, 12, 31),
        ]);
        assert_eq!(frame.column("d"), Some(&expected));
    });
}

#[test]
fn test_posixct_column_narrows_to_date() {
    with_r(|| {
        let result =
            eval_string("data.frame(t = as.POSIXct('2020-01-02 10:30:00', tz = 'UTC'))")
                .expect("eval should succeed");
        let frame = DataFrame::from_r(&result).expect("from_r should succeed");

        assert_eq!(
            frame.column("t"),
            Some(&Column::Date(vec![chrono::NaiveDate::from_ymd_opt(
                2020, 1, 2
            )]))
        );
    });
}

#[test]
fn test_aggregate_returns_one_row_per_group() {
    // stats must load its shared object, which needs LD_LIBRARY_PATH.
    if !ld_library_path_is_set() {
        eprintln!(
            "Skipping test_aggregate_returns_one_row_per_group: LD_LIBRARY_PATH not set.\n\
             Run tests with: LD_LIBRARY_PATH=$(R RHOME)/lib cargo test"
        );
        return;
    }

    with_r(|| {
        let frame = DataFrame::new()
            .with_column(
                "g",
                Column::Character(vec![
                    Some("a".to_string()),
                    Some("b".to_string()),
                    Some("a".to_string()),
                ]),
            )
            .unwrap()
            .with_column("v", Column::Double(vec![Some(1.0), Some(2.0), Some(3.0)]))
            .unwrap();

        RFunction::new("assign")
            .push(".epicsa_test_df")
            .push(&frame)
            .call()
            .expect("assign should succeed");

        let result =
            eval_string("stats::aggregate(v ~ g, data = .epicsa_test_df, FUN = mean)")
                .expect("aggregate should succeed");
        let summary = DataFrame::from_r(&result).expect("from_r should succeed");

        // One row per grouping key present in the input
        assert_eq!(summary.n_rows(), 2);
        assert_eq!(summary.names(), vec!["g", "v"]);
    });
}
