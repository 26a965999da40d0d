//! Payload types exchanged with the MealBridge REST API.
//!
//! These mirror the backend serializers closely enough to round-trip; the
//! domain logic itself (matching, expiry, claims) lives server-side.

pub mod demand;
pub mod donation;
pub mod request;
pub mod user;

pub use demand::{DemandDataPoint, ForecastPoint};
pub use donation::{DonationPatch, DonationStatus, FoodCategory, FoodDonation, Location, NewDonation};
pub use request::{
    ClaimedDonation, DonationMatch, Feedback, FoodRequest, NewFeedback, NewRequest, RequestStatus,
};
pub use user::{ProfileUpdate, Registration, UserProfile, UserSummary};
