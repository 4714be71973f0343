//! Email adapters.

pub mod resend_sender;

pub use resend_sender::ResendNotificationSender;
