pub use super::priority::Priority;
pub use super::todo::Entity as Todo;
