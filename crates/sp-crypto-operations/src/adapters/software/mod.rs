//! # Software Backend
//!
//! Reference [`CryptoBackend`](crate::ports::CryptoBackend) built on the
//! RustCrypto crates.
//!
//! | Family | Algorithms | Streaming |
//! |--------|------------|-----------|
//! | Hash | SHA-224, SHA-256, SHA-384, SHA-512 | yes |
//! | MAC | HMAC-SHA256, HMAC-SHA512 | yes |
//! | Cipher | ChaCha20, AES-256-CTR | yes |
//! | AEAD | AES-256-GCM, ChaCha20-Poly1305 | buffered |
//! | Key derivation | HKDF-SHA256 | yes |
//!
//! The backend is stateless. Everything an operation needs lives in the
//! slot's workspace (see [`layout`]), so any number of operations can be in
//! flight and a workspace can be copied to fork a digest. AEAD buffers its
//! input and fails with `InsufficientMemory` once the workspace is full.
//!
//! Workspaces are wiped by the backend itself on finish, on abort and on any
//! failed update.

mod aead;
mod cipher;
mod hash;
mod kdf;
pub(crate) mod layout;
mod mac;
mod sha2_state;

/// RustCrypto-based backend for every family.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareBackend;

impl SoftwareBackend {
    /// Creates the backend.
    pub fn new() -> Self {
        Self
    }
}
