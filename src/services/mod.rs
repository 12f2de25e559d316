pub mod account_service;
pub mod auth_service;
pub mod health_service;
pub mod inventory_service;
pub mod order_service;
pub mod prescription_service;
pub mod rate_limit_service;
pub mod supplier_service;
pub mod transaction_service;
