#![allow(async_fn_in_trait)]
#![allow(clippy::redundant_closure)]

pub mod commands;
pub mod context;
pub mod logs;
pub mod oauth;
pub mod osu;
pub mod osu_api;
pub mod user;
