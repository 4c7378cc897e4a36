pub mod api;
pub mod cloudflare;
