//! Screenshot Transformer
//!
//! Build hooks that capture a screenshot of every site node: the page is
//! rendered by a remote screenshot service, the image is downloaded into the
//! host's file store, and a `Screenshot` node pointing at it is registered as
//! a child of the site node. Expired screenshots are re-captured at startup.

pub mod capture;
pub mod cli;
pub mod clock;
pub mod config;
pub mod digest;
pub mod error;
pub mod hooks;
pub mod host;
pub mod ids;
pub mod logging;
pub mod materialize;
pub mod node;
pub mod provider;
pub mod store;
pub mod types;

pub use capture::ScreenshotPlugin;
pub use hooks::ReconcileSummary;
pub use host::HostContext;
