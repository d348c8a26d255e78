mod prompt;
mod resolver;
mod selector;
mod session;

pub use prompt::pick;
pub use selector::{Field, SelectError};
pub use session::{FitmentSession, LoadStatus, SessionError, SessionHandle};
