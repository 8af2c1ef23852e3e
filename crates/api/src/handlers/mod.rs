pub mod notifications;
pub mod products;
