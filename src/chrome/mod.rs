//! Chrome debug-mode control: a managed child process plus the DevTools
//! HTTP probes shared by the scraper and the status endpoints.

pub mod cdp;
pub mod controller;

pub use controller::{ChromeController, ChromeStatus};
