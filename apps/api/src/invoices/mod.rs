// Invoice CRUD for the authenticated user.

pub mod handlers;
pub mod store;
