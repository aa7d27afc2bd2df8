use serde::Serialize;

use crate::services::profiles::ProfileView;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: ProfileView,
}
