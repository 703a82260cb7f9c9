pub mod error;
pub mod messages;
pub mod routes;
pub mod state;
pub mod uploads;
pub mod votes;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, AppStateInner};
