//! # lia-cli: Operator CLI for LIA Admin
//!
//! Provides the `lia` command-line interface.
//!
//! ## Subcommands
//!
//! - `lia token issue`: sign a bearer token for a user id.
//! - `lia token verify`: check a token's signature and expiry offline.
//!
//! ```bash
//! JWT_SECRET=... lia token issue --subject u1 --ttl-secs 3600
//! JWT_SECRET=... lia token verify eyJhbGciOi...
//! ```

pub mod token;
