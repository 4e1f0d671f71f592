pub mod account;
pub mod mailer;
pub mod password;
