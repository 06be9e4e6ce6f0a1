pub mod node;
pub mod session;

pub use node::*;
pub use node::preorder::serialize;
pub use session::Session;
