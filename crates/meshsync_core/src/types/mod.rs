pub mod requests;
pub mod responses;
pub mod scene;

pub use requests::*;
pub use responses::*;
pub use scene::*;
