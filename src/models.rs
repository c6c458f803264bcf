use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Taps in one mala.
pub const MALA_SIZE: u32 = 108;

/// Local tap progress for a single practice.
///
/// `current_taps` always stays below [`MALA_SIZE`]; reaching it resets to zero
/// in the same transition that bumps `completed_units`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PracticeProgress {
    #[serde(alias = "count")]
    pub current_taps: u32,
    #[serde(alias = "malaCount")]
    pub completed_units: u64,
    #[serde(alias = "totalJap")]
    pub lifetime_taps: u64,
}

impl PracticeProgress {
    pub fn is_valid(&self) -> bool {
        self.current_taps < MALA_SIZE
    }
}

/// A trackable practice as reported by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Practice {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "totalCount", default)]
    pub total_count: u64,
}

/// Per-user counts used for the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAggregate {
    pub user_id: String,
    pub name: String,
    pub per_practice_counts: BTreeMap<String, u64>,
    pub total_count: u64,
}

impl UserAggregate {
    pub fn counted_total(&self) -> u64 {
        self.per_practice_counts
            .values()
            .fold(0u64, |acc, count| acc.saturating_add(*count))
    }
}

/// One row of the remote daily aggregate.
#[derive(Debug, Clone, Deserialize)]
pub struct DailyEntry {
    pub product: Option<DailyProduct>,
    pub count: u64,
    pub date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyProduct {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "user".to_string()
}

impl SessionUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct NewPracticeRequest {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDispatch {
    Dispatched,
    Suppressed,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TapResponse {
    pub practice_id: String,
    #[serde(flatten)]
    pub progress: PracticeProgress,
    pub completed: bool,
    pub sync: Option<SyncDispatch>,
    pub persisted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub practice_id: String,
    #[serde(flatten)]
    pub progress: PracticeProgress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeTotal {
    pub id: String,
    pub name: String,
    pub total_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub user_id: String,
    pub name: String,
    pub counts: Vec<u64>,
    pub total: u64,
    pub reported_total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub practices: Vec<PracticeTotal>,
    pub leaderboard: Vec<LeaderboardRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyRow {
    pub date: String,
    pub practice: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub practice_id: String,
    pub unit: Option<u64>,
    pub message: String,
    pub at: String,
}
