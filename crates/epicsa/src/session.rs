//! Lazy per-process R session and data-environment bootstrap.
//!
//! The embedded R runtime is process-wide shared state: it is initialized
//! once, on the first wrapper call, and torn down at process exit. The data
//! environment (GCS credentials, working data folder) is likewise set up
//! exactly once, because `epicsawrap::setup` resolves against the working
//! directory the process started in.

use crate::error::{EpicsaError, EpicsaResult};
use epicsa_harp::RFunction;
use once_cell::sync::OnceCell;
use std::env;
use std::path::Path;

/// Initialization outcomes are cached as strings: a failed bootstrap fails
/// every subsequent call with the same message instead of retrying.
static R_SESSION: OnceCell<Result<(), String>> = OnceCell::new();
static DATA_ENV: OnceCell<Result<(), String>> = OnceCell::new();

/// File consumed by downstream R logic for Google Cloud Storage access.
/// The bridge only resolves its path; it never reads the file.
const SERVICE_ACCOUNT_FILE: &str = "service-account.json";

/// Folder `epicsawrap` uses for downloaded and intermediate data.
const WORKING_DATA_FOLDER: &str = "working_data";

/// Initialize the embedded R interpreter and the epicsawrap data
/// environment, once per process.
pub(crate) fn ensure_ready() -> EpicsaResult<()> {
    ensure_r()?;
    init_data_env()
}

fn ensure_r() -> EpicsaResult<()> {
    R_SESSION
        .get_or_init(|| {
            log::info!("initializing embedded R");
            // SAFETY: OnceCell guarantees this runs once per process
            unsafe { epicsa_libr::initialize_r() }.map_err(|e| e.to_string())
        })
        .clone()
        .map_err(EpicsaError::Session)
}

fn init_data_env() -> EpicsaResult<()> {
    DATA_ENV
        .get_or_init(|| {
            let working_folder = env::current_dir()
                .map_err(|e| format!("cannot resolve working directory: {}", e))?;

            let service_file = normalize_path(&working_folder.join(SERVICE_ACCOUNT_FILE));
            RFunction::from_package("epicsadata", "gcs_auth_file")
                .push(service_file.as_str())
                .call()
                .map_err(|e| e.to_string())?;

            let data_folder = normalize_path(&working_folder.join(WORKING_DATA_FOLDER));
            log::info!("epicsawrap data folder: {}", data_folder);
            RFunction::from_package("epicsawrap", "setup")
                .push(data_folder.as_str())
                .call()
                .map_err(|e| e.to_string())?;

            Ok(())
        })
        .clone()
        .map_err(EpicsaError::Session)
}

/// Render a path with forward slashes, the separator R expects on every
/// platform.
fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_normalize_path_forward_slashes() {
        let path = PathBuf::from("/home/user/project").join(SERVICE_ACCOUNT_FILE);
        assert_eq!(
            normalize_path(&path),
            "/home/user/project/service-account.json"
        );
    }

    #[test]
    fn test_normalize_path_replaces_backslashes() {
        let path = PathBuf::from(r"C:\Users\steph\project\working_data");
        assert_eq!(normalize_path(&path), "C:/Users/steph/project/working_data");
    }
}
