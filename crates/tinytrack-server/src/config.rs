/// Re-export `Config` from `tinytrack-core` for use within this crate.
///
/// All environment-variable parsing lives in `tinytrack-core` so it can be
/// shared with integration tests without depending on the full server.
pub use tinytrack_core::config::Config;
