pub mod events;
pub mod qr_codes;
pub mod tickets;
pub mod validations;
