pub mod auth;
pub mod catalog;
pub mod customer;
pub mod inventory;
pub mod purchase;
pub mod sales;
