//! Request-side payload types: food requests, claims, matches, feedback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::donation::{FoodCategory, FoodDonation, Location};
use super::user::UserSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Fulfilled,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodRequest {
    pub id: i64,
    pub requester: UserSummary,
    #[serde(default)]
    pub category_detail: Option<FoodCategory>,
    #[serde(default)]
    pub description: String,
    /// Quantity in kilograms.
    pub quantity: f64,
    #[serde(default)]
    pub location: Option<Location>,
    pub request_date: DateTime<Utc>,
    pub status: RequestStatus,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub preferred_tags: String,
}

/// Payload for `POST requests/`.
#[derive(Debug, Clone, Serialize)]
pub struct NewRequest {
    pub category: String,
    pub description: String,
    pub quantity: f64,
    pub preferred_tags: String,
    pub location: Location,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimedDonation {
    pub id: i64,
    pub donation_details: FoodDonation,
    pub claimed_by: UserSummary,
    pub claim_date: DateTime<Utc>,
}

/// One scored match from `GET requests/{id}/matches/`. The nested donation
/// is a slim projection built by the matching endpoint, not the full
/// donation serializer.
#[derive(Debug, Clone, Deserialize)]
pub struct DonationMatch {
    pub id: i64,
    pub donation: MatchedDonation,
    pub score: f64,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchedDonation {
    pub id: i64,
    pub category: MatchedCategory,
    pub quantity: f64,
    pub location: MatchedLocation,
    pub donor: MatchedDonor,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchedCategory {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchedLocation {
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchedDonor {
    pub username: String,
}

/// Payload for `POST feedback/`; one feedback entry per claimed donation.
#[derive(Debug, Clone, Serialize)]
pub struct NewFeedback {
    pub claimed_donation: i64,
    /// 1 through 5.
    pub rating: u8,
    pub comments: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feedback {
    pub id: i64,
    pub claimed_donation: i64,
    pub rating: u8,
    #[serde(default)]
    pub comments: String,
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_match_payload() {
        let json = r#"[{
            "id": 9,
            "donation": {
                "id": 9,
                "category": {"name": "Bakery"},
                "quantity": 4.0,
                "location": {"city": "Springfield", "state": "IL"},
                "donor": {"username": "cornerbakery"},
                "expiry_date": "2025-06-02T08:00:00Z"
            },
            "score": 0.87,
            "distance": 2.41,
            "summary": "Good match"
        }]"#;

        let matches: Vec<DonationMatch> = serde_json::from_str(json).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].donation.category.name, "Bakery");
        assert!(matches[0].score > 0.8);
    }
}
