pub mod browser;
pub mod extract;
pub mod flatmates;
pub mod http;
pub mod traits;
pub mod types;

pub use browser::BrowserPageSource;
pub use flatmates::FlatmatesScraper;
pub use http::HttpPageSource;
pub use traits::PageSource;
