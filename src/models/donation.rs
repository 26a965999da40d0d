//! Donation-side payload types, mirroring the platform's REST serializers.
//! Server-internal ML bookkeeping fields are not exposed by the API and are
//! not modeled here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserSummary;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodCategory {
    pub id: i64,
    pub name: String,
}

/// Pickup/dropoff point. `id` is assigned server-side and omitted on input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Pending,
    Collected,
    Cancelled,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodDonation {
    pub id: i64,
    pub donor: UserSummary,
    #[serde(default)]
    pub category_detail: Option<FoodCategory>,
    #[serde(default)]
    pub description: String,
    /// Quantity in kilograms.
    pub quantity: f64,
    /// Comma-separated tags, e.g. "vegetarian,gluten-free".
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub location: Option<Location>,
    pub donation_date: DateTime<Utc>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    pub status: DonationStatus,
    #[serde(default)]
    pub image: Option<String>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub ai_freshness_score: Option<f64>,
    #[serde(default)]
    pub ai_category_prediction: Option<String>,
    #[serde(default)]
    pub ai_confidence_score: Option<f64>,
}

/// Payload for `POST donations/`. The category is free text; the server
/// creates it on first use.
#[derive(Debug, Clone, Serialize)]
pub struct NewDonation {
    pub category: String,
    pub description: String,
    pub quantity: f64,
    pub tags: String,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Partial update for `PATCH donations/{id}/`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DonationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DonationStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_donation_from_api_shape() {
        let json = r#"{
            "id": 7,
            "donor": {"id": 3, "username": "greengrocer", "email": "g@example.org"},
            "category_detail": {"id": 1, "name": "Produce"},
            "description": "Crates of apples",
            "quantity": 12.5,
            "tags": "vegetarian,fresh",
            "location": {
                "id": 4,
                "address_line": "12 Market St",
                "city": "Springfield",
                "state": "IL",
                "zipcode": "62701",
                "latitude": 39.78,
                "longitude": -89.65
            },
            "donation_date": "2025-06-01T10:00:00Z",
            "expiry_date": "2025-06-03T10:00:00Z",
            "status": "pending",
            "image": null,
            "updated_at": "2025-06-01T10:00:00Z",
            "ai_freshness_score": 0.92
        }"#;

        let donation: FoodDonation = serde_json::from_str(json).unwrap();
        assert_eq!(donation.status, DonationStatus::Pending);
        assert_eq!(donation.donor.username, "greengrocer");
        assert_eq!(donation.ai_freshness_score, Some(0.92));
        assert!(donation.ai_category_prediction.is_none());
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = DonationPatch {
            status: Some(DonationStatus::Cancelled),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"status": "cancelled"}));
    }
}
