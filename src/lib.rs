#![forbid(unsafe_code)]

pub mod book;
pub mod cli;
pub mod crawl;
pub mod discover;
pub mod export;
pub mod fetch;
pub mod formats;
pub mod locate;
pub mod logging;
pub mod noise;
pub mod scrape;
pub mod text;
