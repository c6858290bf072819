//! # Operation Families
//!
//! Every multipart protocol follows `setup → update* → finish | abort`.
//! A family fixes the kind a slot is recorded with, the payload the backend
//! works on, and the shapes of the requests flowing through each phase.
//!
//! | Family | Setup | Update steps | Finish |
//! |--------|-------|--------------|--------|
//! | [`CipherFamily`] | key, algorithm, direction | generate IV, set IV, data | trailing output |
//! | [`HashFamily`] | algorithm | data | digest or verify |
//! | [`MacFamily`] | key, algorithm, direction | data | sign or verify |
//! | [`AeadFamily`] | key, algorithm, direction | generate nonce, set nonce, additional data, data | seal or open |
//! | [`KeyDerivationFamily`] | algorithm | inputs, capacity, output | done |

use zeroize::{Zeroize, Zeroizing};

use super::context::{
    AeadContext, BackendContext, BackendDerivationContext, CipherContext, HashContext,
    KeyDerivationContext, MacContext,
};
use super::entities::{
    AeadAlgorithm, CipherAlgorithm, CipherDirection, DerivationInput, HashAlgorithm,
    KeyDerivationAlgorithm, KeyMaterial, MacAlgorithm, MacDirection, OperationKind,
};

/// Static description of one protocol family.
pub trait OperationFamily: Send + Sync + 'static {
    /// Kind recorded in slots of this family.
    const KIND: OperationKind;

    /// Payload the backend operates on.
    type Context: Zeroize + Send;

    /// Arguments of `setup`.
    type SetupRequest;

    /// One update step.
    type Step<'a>;

    /// Result of an update step.
    type StepOutput;

    /// Arguments of `finish`.
    type FinishRequest<'a>;

    /// Result of `finish`.
    type FinishOutput;

    /// Typed view of a slot payload, if it belongs to this family.
    fn project(context: &mut BackendContext) -> Option<&mut Self::Context>;
}

// =============================================================================
// CIPHER
// =============================================================================

/// Streaming cipher family.
#[derive(Debug, Clone, Copy)]
pub struct CipherFamily;

/// Cipher setup arguments.
#[derive(Debug, Clone)]
pub struct CipherSetup {
    /// Resolved key.
    pub key: KeyMaterial,
    /// Cipher algorithm.
    pub algorithm: CipherAlgorithm,
    /// Encrypt or decrypt.
    pub direction: CipherDirection,
}

/// Cipher update steps.
#[derive(Debug, Clone, Copy)]
pub enum CipherStep<'a> {
    /// Generate a random IV and return it; encrypt only.
    GenerateIv,
    /// Use a caller-chosen IV.
    SetIv(&'a [u8]),
    /// Process a chunk of data.
    Update(&'a [u8]),
}

impl OperationFamily for CipherFamily {
    const KIND: OperationKind = OperationKind::Cipher;
    type Context = CipherContext;
    type SetupRequest = CipherSetup;
    type Step<'a> = CipherStep<'a>;
    type StepOutput = Vec<u8>;
    type FinishRequest<'a> = ();
    type FinishOutput = Vec<u8>;

    fn project(context: &mut BackendContext) -> Option<&mut Self::Context> {
        match context {
            BackendContext::Cipher(ctx) => Some(ctx),
            _ => None,
        }
    }
}

// =============================================================================
// HASH
// =============================================================================

/// Message digest family.
#[derive(Debug, Clone, Copy)]
pub struct HashFamily;

/// Hash setup arguments.
#[derive(Debug, Clone, Copy)]
pub struct HashSetup {
    /// Digest algorithm.
    pub algorithm: HashAlgorithm,
}

/// Ways to complete a hash.
#[derive(Debug, Clone, Copy)]
pub enum HashFinish<'a> {
    /// Return the digest.
    Digest,
    /// Compare against an expected digest; returns an empty output on match.
    Verify(&'a [u8]),
}

impl OperationFamily for HashFamily {
    const KIND: OperationKind = OperationKind::Hash;
    type Context = HashContext;
    type SetupRequest = HashSetup;
    type Step<'a> = &'a [u8];
    type StepOutput = ();
    type FinishRequest<'a> = HashFinish<'a>;
    type FinishOutput = Vec<u8>;

    fn project(context: &mut BackendContext) -> Option<&mut Self::Context> {
        match context {
            BackendContext::Hash(ctx) => Some(ctx),
            _ => None,
        }
    }
}

// =============================================================================
// MAC
// =============================================================================

/// Message authentication family.
#[derive(Debug, Clone, Copy)]
pub struct MacFamily;

/// MAC setup arguments.
#[derive(Debug, Clone)]
pub struct MacSetup {
    /// Resolved key.
    pub key: KeyMaterial,
    /// MAC algorithm.
    pub algorithm: MacAlgorithm,
    /// Sign or verify.
    pub direction: MacDirection,
}

/// Ways to complete a MAC.
#[derive(Debug, Clone, Copy)]
pub enum MacFinish<'a> {
    /// Return the tag; sign operations only.
    Sign,
    /// Compare against an expected tag; verify operations only.
    Verify(&'a [u8]),
}

impl OperationFamily for MacFamily {
    const KIND: OperationKind = OperationKind::Mac;
    type Context = MacContext;
    type SetupRequest = MacSetup;
    type Step<'a> = &'a [u8];
    type StepOutput = ();
    type FinishRequest<'a> = MacFinish<'a>;
    type FinishOutput = Vec<u8>;

    fn project(context: &mut BackendContext) -> Option<&mut Self::Context> {
        match context {
            BackendContext::Mac(ctx) => Some(ctx),
            _ => None,
        }
    }
}

// =============================================================================
// AEAD
// =============================================================================

/// Authenticated encryption family.
#[derive(Debug, Clone, Copy)]
pub struct AeadFamily;

/// AEAD setup arguments.
#[derive(Debug, Clone)]
pub struct AeadSetup {
    /// Resolved key.
    pub key: KeyMaterial,
    /// AEAD algorithm.
    pub algorithm: AeadAlgorithm,
    /// Seal or open.
    pub direction: CipherDirection,
}

/// AEAD update steps. A nonce must be in place before any data.
#[derive(Debug, Clone, Copy)]
pub enum AeadStep<'a> {
    /// Generate a random nonce and return it; seal only.
    GenerateNonce,
    /// Use a caller-chosen nonce.
    SetNonce(&'a [u8]),
    /// Additional authenticated data; only before any payload data.
    UpdateAd(&'a [u8]),
    /// Payload data.
    Update(&'a [u8]),
}

/// Ways to complete an AEAD operation.
#[derive(Debug, Clone, Copy)]
pub enum AeadFinish<'a> {
    /// Seal: return ciphertext followed by the tag.
    Finish,
    /// Open: check `tag` and return the plaintext.
    Verify(&'a [u8]),
}

impl OperationFamily for AeadFamily {
    const KIND: OperationKind = OperationKind::Aead;
    type Context = AeadContext;
    type SetupRequest = AeadSetup;
    type Step<'a> = AeadStep<'a>;
    type StepOutput = Vec<u8>;
    type FinishRequest<'a> = AeadFinish<'a>;
    type FinishOutput = Vec<u8>;

    fn project(context: &mut BackendContext) -> Option<&mut Self::Context> {
        match context {
            BackendContext::Aead(ctx) => Some(ctx),
            _ => None,
        }
    }
}

// =============================================================================
// KEY DERIVATION
// =============================================================================

/// Key derivation family as seen by callers.
///
/// The payload is tagged with the delegate chosen at setup.
#[derive(Debug, Clone, Copy)]
pub struct KeyDerivationFamily;

/// Key derivation as seen by a crypto backend: the backend's own workspace.
#[derive(Debug, Clone, Copy)]
pub struct BackendDerivationFamily;

/// Key derivation setup arguments.
#[derive(Debug, Clone, Copy)]
pub struct KeyDerivationSetup {
    /// Derivation algorithm; selects the delegate.
    pub algorithm: KeyDerivationAlgorithm,
}

/// Key derivation update steps.
#[derive(Debug, Clone, Copy)]
pub enum DerivationStep<'a> {
    /// Provide one input.
    Input {
        /// Which input.
        step: DerivationInput,
        /// Input bytes.
        data: &'a [u8],
    },
    /// Lower the total output capacity.
    SetCapacity(usize),
    /// Report the remaining output capacity.
    GetCapacity,
    /// Produce the next `n` bytes of output.
    Output(usize),
}

/// Result of a key derivation step.
#[derive(Debug, Default, PartialEq, Eq)]
pub enum DerivationOutput {
    /// Input or capacity change accepted.
    #[default]
    Accepted,
    /// Remaining capacity in bytes.
    Capacity(usize),
    /// Derived bytes.
    Bytes(Zeroizing<Vec<u8>>),
}

impl OperationFamily for KeyDerivationFamily {
    const KIND: OperationKind = OperationKind::KeyDerivation;
    type Context = KeyDerivationContext;
    type SetupRequest = KeyDerivationSetup;
    type Step<'a> = DerivationStep<'a>;
    type StepOutput = DerivationOutput;
    type FinishRequest<'a> = ();
    type FinishOutput = ();

    fn project(context: &mut BackendContext) -> Option<&mut Self::Context> {
        match context {
            BackendContext::KeyDerivation(ctx) => Some(ctx),
            _ => None,
        }
    }
}

impl OperationFamily for BackendDerivationFamily {
    const KIND: OperationKind = OperationKind::KeyDerivation;
    type Context = BackendDerivationContext;
    type SetupRequest = KeyDerivationSetup;
    type Step<'a> = DerivationStep<'a>;
    type StepOutput = DerivationOutput;
    type FinishRequest<'a> = ();
    type FinishOutput = ();

    fn project(context: &mut BackendContext) -> Option<&mut Self::Context> {
        match context {
            BackendContext::KeyDerivation(KeyDerivationContext::Backend(ctx)) => Some(ctx),
            _ => None,
        }
    }
}
