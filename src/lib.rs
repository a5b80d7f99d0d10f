// Tres Ejes: trade, investment and tourism reports per geographic slice.
pub mod config;
pub mod download;
pub mod duck;
pub mod error;
pub mod excel;
pub mod fetch;
pub mod output;
pub mod params;
pub mod process;
pub mod report;
pub mod types;
pub mod util;
pub mod verify;
pub mod warehouse;
pub mod word;
