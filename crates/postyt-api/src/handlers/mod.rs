pub mod accounts;
pub mod health;
pub mod oauth;
pub mod upload;
