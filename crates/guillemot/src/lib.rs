#![doc = include_str!("../README.md")]

pub mod config;
pub mod content;
pub mod markdown;
pub mod render;
pub mod search;
pub mod sitemap;

mod origin;
mod permalink;
mod robots;
mod site;
mod storage;

pub use origin::*;
pub use permalink::*;
pub use robots::*;
pub use site::*;
