mod error;
mod initializer;
mod screenshot;
mod session;

pub use error::{Error, Result};
pub use initializer::BrowserInitializer;
pub use screenshot::ScreenshotRecorder;
pub use session::BrowserSession;
