pub mod prelude;
pub mod priority;
pub mod todo;
