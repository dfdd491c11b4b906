pub mod codec;
pub mod gatekeeper;
pub mod issuer;
pub mod password;
pub mod refresher;

pub use codec::{TokenClass, TokenCodec, TokenError};
pub use gatekeeper::{ensure_role, require_auth, Gatekeeper, Identity};
pub use issuer::{AuthSession, CredentialIssuer, LoginRequest, RegisterRequest};
pub use refresher::{CredentialRefresher, RefreshRequest};
