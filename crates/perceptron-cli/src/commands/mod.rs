pub mod check;
pub mod perceive;
