pub mod app_user;
pub mod booth;
pub mod booth_assignment;
pub mod campaign;
pub mod campaign_member;
pub mod constituency;
pub mod party;
pub mod prediction;
pub mod prelude;
