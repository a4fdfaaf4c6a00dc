//! Backend routes and client defaults

use std::time::Duration;

/// Backend API root used when no base URL is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api/v1";

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const LOGOUT_ALL_PATH: &str = "/auth/logout-all";
pub const REFRESH_PATH: &str = "/auth/refresh";

pub const ME_PATH: &str = "/users/me";
pub const UPDATE_NAME_PATH: &str = "/users/update-name";
pub const CHANGE_PASSWORD_PATH: &str = "/users/change-password";

pub const ANALYZE_PATH: &str = "/resume/analyze";
pub const HISTORY_PATH: &str = "/analysis/history";
/// Prefix for per-analysis routes (`/analysis/{id}`)
pub const ANALYSIS_PATH: &str = "/analysis";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Resume analysis runs model inference server-side and needs longer
pub const ANALYZE_TIMEOUT: Duration = Duration::from_secs(60);

pub const DEFAULT_HISTORY_PAGE: u32 = 1;
pub const DEFAULT_HISTORY_LIMIT: u32 = 10;

/// Multipart field names expected by the analyze endpoint
pub const RESUME_FIELD: &str = "resume";
pub const JOB_DESCRIPTION_FIELD: &str = "jobDescription";
