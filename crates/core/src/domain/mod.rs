pub mod order;
pub mod product;
pub mod shop;
pub mod view;
