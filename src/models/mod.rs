pub mod assessment;
pub mod daily_record;
pub mod mood;
pub mod score;
pub mod user;
