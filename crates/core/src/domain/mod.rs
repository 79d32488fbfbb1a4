pub mod customer;
pub mod purchase;
pub mod statistics;
pub mod subscription;
