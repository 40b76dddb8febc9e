pub mod account;
pub mod email_address;
pub mod phone_number;
pub mod query;
