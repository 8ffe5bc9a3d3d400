pub mod mock_api;
pub mod scene;

pub use mock_api::*;
pub use scene::*;
