pub mod dtos;
pub mod ports;
pub mod services;
pub mod transactions;
