//! sea-orm entities for the accounts service tables.

pub mod account;
pub mod email_address;
pub mod phone_number;
