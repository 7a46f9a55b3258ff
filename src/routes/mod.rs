pub mod newsletters;
pub mod recipes;
