// Library interface for newsbrief modules
// This allows tests and the binary to import modules

pub mod aggregator;
pub mod article;
pub mod desk;
pub mod error;
pub mod llm;
pub mod search;
pub mod server;
pub mod summarize;
pub mod timeframe;
pub mod topics;

pub use article::Article;
pub use desk::NewsDesk;
pub use error::{SearchError, SummarizeError};
pub use timeframe::Timeframe;
