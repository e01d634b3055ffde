use serde::Serialize;
use strum::{Display, IntoStaticStr};

/// Name shown in the stats record while the client sits on the login screen.
pub const LOGIN_PLACEHOLDER: &str = "Đăng nhập";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr, Serialize)]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn from_percent(percent: i32) -> Self {
        if percent > 70 {
            HealthStatus::Healthy
        } else if percent > 30 {
            HealthStatus::Warning
        } else {
            HealthStatus::Critical
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr, Serialize)]
pub enum LoginState {
    #[strum(serialize = "Not Logged In")]
    LoginScreen,
    #[strum(serialize = "In Game")]
    InGame,
    /// The stats chain did not resolve.
    Unavailable,
}

impl LoginState {
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            None => LoginState::Unavailable,
            Some(LOGIN_PLACEHOLDER) => LoginState::LoginScreen,
            Some(_) => LoginState::InGame,
        }
    }
}

/// `current` as a percentage of `max`, truncated. 100 when `max` is not positive.
pub fn percent(current: i32, max: i32) -> i32 {
    if max <= 0 {
        return 100;
    }
    (current as f32 * 100.0 / max as f32) as i32
}
