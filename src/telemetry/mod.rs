pub mod config;
pub mod ctx;
pub mod ops;

use ctx::LogCtx;

// Factory helpers, one per command
pub fn audit() -> LogCtx<ops::audit::Audit> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn sitemap() -> LogCtx<ops::sitemap::Sitemap> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
