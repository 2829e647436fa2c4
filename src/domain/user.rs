use serde::{Deserialize, Serialize};

/// State of a login session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Disconnected,
    Unknown,
}

impl SessionStatus {
    /// Map the state column of `who` or `query user`
    pub fn from_state(state: Option<&str>) -> Self {
        match state.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("active") => Self::Active,
            Some("disc") | Some("disconnected") => Self::Disconnected,
            _ => Self::Unknown,
        }
    }
}

/// A user currently logged in to the machine, one entry per session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub name: String,
    /// Terminal or session name such as `tty2` or `console`
    pub terminal: String,
    /// Remote host or display, when the session has one
    pub host: Option<String>,
    pub login_time: String,
    pub status: SessionStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_state() {
        assert_eq!(SessionStatus::from_state(Some("Active")), SessionStatus::Active);
        assert_eq!(SessionStatus::from_state(Some("Disc")), SessionStatus::Disconnected);
        assert_eq!(SessionStatus::from_state(Some("Listen")), SessionStatus::Unknown);
        assert_eq!(SessionStatus::from_state(None), SessionStatus::Unknown);
    }
}
