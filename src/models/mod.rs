pub mod event;
pub mod qr_code;
pub mod ticket;
pub mod user;
pub mod validation;

pub use event::{Event, EventStatus};
pub use qr_code::{QrCode, QrCodeStatus};
pub use ticket::{Ticket, TicketStatus, TicketType};
pub use user::User;
pub use validation::{TicketValidation, TicketValidationMethod, TicketValidationStatus};
