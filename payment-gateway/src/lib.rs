pub mod app;
pub mod bank;
pub mod config;
pub mod payment_handlers;
pub mod processor;
pub mod repo;
pub mod validation;

use processor::PaymentProcessor;

#[derive(Clone)]
pub struct AppState {
    pub processor: PaymentProcessor,
}
