// Session security core: session lifecycle, brute-force lockout,
// and activity risk classification over pluggable storage backends.

pub mod activity;
pub mod config;
pub mod error;
pub mod lockout;
pub mod session;
pub mod sync;

pub use config::SecurityConfig;
pub use error::SecurityError;
