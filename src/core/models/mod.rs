pub mod audit;
pub mod balance;
pub mod notification;
pub mod payment;
pub mod person;
pub mod subscription;
