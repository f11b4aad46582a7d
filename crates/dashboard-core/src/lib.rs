pub mod error;
pub mod sentiment;
pub mod traits;
pub mod types;

pub use error::*;
pub use sentiment::Sentiment;
pub use traits::*;
pub use types::*;
