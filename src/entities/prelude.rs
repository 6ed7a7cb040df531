#![allow(unused_imports)]

pub use super::app_user::Entity as AppUser;
pub use super::booth::Entity as Booth;
pub use super::booth_assignment::Entity as BoothAssignment;
pub use super::campaign::Entity as Campaign;
pub use super::campaign_member::Entity as CampaignMember;
pub use super::constituency::Entity as Constituency;
pub use super::party::Entity as Party;
pub use super::prediction::Entity as Prediction;
