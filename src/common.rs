/// Common types shared across repositories and services
use serde::{Deserialize, Serialize};

/// Caller identity resolved by the auth layer in front of the engine.
///
/// Trusted as given: every query the engine issues is filtered by
/// `team_id`, and every document and flow row records `user_id` as creator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub team_id: i32,
    pub user_id: i32,
}

impl RequestContext {
    pub fn new(team_id: i32, user_id: i32) -> Self {
        Self { team_id, user_id }
    }
}
