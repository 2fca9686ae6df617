pub mod activity;
pub mod config;
pub mod db;
pub mod error;
pub mod gate;
pub mod loyalty;
pub mod models;
pub mod params;
pub mod pricing;
pub mod response;
pub mod session;
pub mod state;
pub mod store;

pub mod dto {
    pub mod auth;
    pub mod cart;
    pub mod customers;
    pub mod orders;
    pub mod products;
    pub mod profile;
}

pub mod services {
    pub mod admin_service;
    pub mod auth_service;
    pub mod cart_service;
    pub mod catalog_service;
    pub mod checkout_service;
    pub mod profile_service;
}
