//! Store delivery status for a release on one platform

use serde::{Deserialize, Serialize};

/// Simulated delivery pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DistributionStatus {
    Pending,
    Processing,
    #[serde(rename = "In Review")]
    InReview,
    Live,
    Error,
}

impl DistributionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionStatus::Pending => "Pending",
            DistributionStatus::Processing => "Processing",
            DistributionStatus::InReview => "In Review",
            DistributionStatus::Live => "Live",
            DistributionStatus::Error => "Error",
        }
    }
}
