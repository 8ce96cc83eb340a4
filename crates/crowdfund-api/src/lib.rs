pub mod campaigns;
pub mod envelope;
pub mod error;
pub mod middleware;
pub mod payment;
pub mod router;
pub mod service;
pub mod state;
pub mod storage;
pub mod token;
pub mod transactions;
pub mod upload;
pub mod users;
pub mod web;
