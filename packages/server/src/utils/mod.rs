pub mod attachments;
pub mod contest;
pub mod jwt;
