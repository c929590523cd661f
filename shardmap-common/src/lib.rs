// shardmap-common - configuration and error types shared by the store crate.

pub mod error;
pub mod profile;

pub use error::CopyError;
pub use profile::Profile;
