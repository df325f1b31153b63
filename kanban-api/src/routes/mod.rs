/// API route handlers
///
/// - `index`: Index page
/// - `health`: Health check endpoint
/// - `persons`: Person accounts
/// - `boards`: Boards
/// - `tasks`: Tasks (read-only)
/// - `tags`: Tags (read-only)

pub mod boards;
pub mod health;
pub mod index;
pub mod persons;
pub mod tags;
pub mod tasks;
