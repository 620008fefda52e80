//! Social platform integrations.
//!
//! Every platform sits behind [`PlatformProvider`], which covers the OAuth
//! token lifecycle and publishing. [`PlatformRegistry`] maps platform names
//! to providers; only the simulated [`MockProvider`] exists today.

pub mod error;
pub mod mock;
pub mod provider;
pub mod registry;

pub use error::PlatformError;
pub use mock::MockProvider;
pub use provider::{AccountInfo, OAuthTokens, PlatformProvider, PublishContent, PublishResult};
pub use registry::PlatformRegistry;
