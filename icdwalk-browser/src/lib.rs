pub mod error;
pub mod node;
pub mod session;

pub use error::BrowserError;
pub use node::CdpNode;
pub use session::{Session, SessionConfig};
