pub mod beatmap;
pub mod cache;
pub mod calculator;
pub mod metrics;
pub mod mods;
pub mod score;
