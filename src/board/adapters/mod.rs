//! Adapter implementations for the board ports.

pub mod file;
pub mod gemini;
pub mod memory;
pub mod render;
pub mod trello;

pub use file::FileCacheStorage;
pub use gemini::{GeminiTitleInference, clean_title};
pub use memory::{GatewayOperation, InMemoryBoardGateway, InMemoryCacheStorage};
pub use render::{ReportRenderError, render_report};
pub use trello::{TrelloBoardGateway, TrelloCredentials};
