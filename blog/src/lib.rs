pub mod agents;
pub mod config;
pub mod console;
pub mod files;
pub mod mealdb;
pub mod nutrition;
pub mod tools;
