//! deskview Auth - Credential check and login sessions
//!
//! The host is protected by a single fixed username/password pair read once
//! at startup. A successful login issues an opaque session token that gates
//! the viewer page and the viewer WebSocket.
//!
//! # Example
//!
//! ```no_run
//! use deskview_auth::{Credentials, SessionStore};
//!
//! async fn example() {
//!     let credentials = Credentials::load(&Credentials::default_path().unwrap()).unwrap();
//!     let sessions = SessionStore::new();
//!
//!     if credentials.authenticate("admin", "secret") {
//!         let token = sessions.create("admin").await;
//!         assert!(sessions.is_valid(&token).await);
//!     }
//! }
//! ```

pub mod credentials;
pub mod session;

pub use credentials::{AuthError, AuthResult, Credentials};
pub use session::{SessionStore, SESSION_COOKIE};
