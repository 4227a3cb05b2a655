//! # neVPN Account Testkit
//!
//! Testing utilities for neVPN accounts.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Digest vectors**: Known SHA-256 outputs the password digest must reproduce
//! - **Generators**: Proptest strategies for emails, passwords and identifiers
//! - **Fixtures**: A ready-made service over an in-memory store
//!
//! ## Digest Vectors
//!
//! ```rust
//! use nevpn_account_testkit::vectors::verify_all_vectors;
//!
//! assert!(verify_all_vectors().is_empty());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use nevpn_account_testkit::generators::{email, password};
//!
//! proptest! {
//!     #[test]
//!     fn digest_is_deterministic(p in password()) {
//!         prop_assert_eq!(nevpn_account::digest(&p), nevpn_account::digest(&p));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use nevpn_account_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let user = fixture.register_random().await;
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{TestAccount, TestFixture};
pub use generators::{email, identifier, mixed_case_email, password};
pub use vectors::{all_vectors, verify_all_vectors, DigestVector};
