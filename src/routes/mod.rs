pub mod ai;
pub mod appointments;
pub mod auth;
pub mod diary;
pub mod medical;
pub mod period;
pub mod resources;
pub mod symptoms;
pub mod wellness;
