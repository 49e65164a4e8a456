pub mod member;
pub mod register;
