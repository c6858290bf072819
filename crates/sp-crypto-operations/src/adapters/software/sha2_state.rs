//! Resumable SHA-2 state kept in workspace bytes.
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 64 | chaining words, little-endian |
//! | 64 | 128 | pending block bytes |
//! | 192 | 1 | pending length |
//! | 200 | 16 | message length in bytes |
//!
//! Full blocks go straight through the `sha2` compression functions, so a
//! message of any length fits in one state area.

use sha2::digest::generic_array::GenericArray;
use zeroize::Zeroize;

use crate::domain::{BackendError, HashAlgorithm};

/// Bytes used by one state area.
pub(crate) const STATE_LEN: usize = 216;

const CHAIN: usize = 0;
const PENDING: usize = 64;
const PENDING_LEN: usize = 192;
const TOTAL: usize = 200;

const SHA224_IV: [u32; 8] = [
    0xc1059ed8, 0x367cd507, 0x3070dd17, 0xf70e5939, 0xffc00b31, 0x68581511, 0x64f98fa7,
    0xbefa4fa4,
];

const SHA256_IV: [u32; 8] = [
    0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a, 0x510e527f, 0x9b05688c, 0x1f83d9ab,
    0x5be0cd19,
];

const SHA384_IV: [u64; 8] = [
    0xcbbb9d5dc1059ed8,
    0x629a292a367cd507,
    0x9159015a3070dd17,
    0x152fecd8f70e5939,
    0x67332667ffc00b31,
    0x8eb44a8768581511,
    0xdb0c2e0d64f98fa7,
    0x47b5481dbefa4fa4,
];

const SHA512_IV: [u64; 8] = [
    0x6a09e667f3bcc908,
    0xbb67ae8584caa73b,
    0x3c6ef372fe94f82b,
    0xa54ff53a5f1d36f1,
    0x510e527fade682d1,
    0x9b05688c2b3e6c1f,
    0x1f83d9abfb41bd6b,
    0x5be0cd19137e2179,
];

/// Compression block size in bytes.
pub(crate) const fn block_len(algorithm: HashAlgorithm) -> usize {
    match algorithm {
        HashAlgorithm::Sha224 | HashAlgorithm::Sha256 => 64,
        HashAlgorithm::Sha384 | HashAlgorithm::Sha512 => 128,
    }
}

/// Borrows state area `index` of a workspace buffer.
pub(crate) fn area(buffer: &mut [u8], index: usize) -> Result<&mut [u8], BackendError> {
    buffer
        .get_mut(index * STATE_LEN..(index + 1) * STATE_LEN)
        .ok_or(BackendError::InsufficientMemory)
}

/// Resets `state` to the initial hash value of `algorithm`.
pub(crate) fn init(algorithm: HashAlgorithm, state: &mut [u8]) {
    state.zeroize();
    match algorithm {
        HashAlgorithm::Sha224 => store_words32(&mut state[CHAIN..PENDING], &SHA224_IV),
        HashAlgorithm::Sha256 => store_words32(&mut state[CHAIN..PENDING], &SHA256_IV),
        HashAlgorithm::Sha384 => store_words64(&mut state[CHAIN..PENDING], &SHA384_IV),
        HashAlgorithm::Sha512 => store_words64(&mut state[CHAIN..PENDING], &SHA512_IV),
    }
}

/// Feeds `input` into `state`.
pub(crate) fn absorb(algorithm: HashAlgorithm, state: &mut [u8], mut input: &[u8]) {
    let block = block_len(algorithm);
    let total = read_total(state).wrapping_add(input.len() as u128);
    state[TOTAL..TOTAL + 16].copy_from_slice(&total.to_le_bytes());

    let mut pending = state[PENDING_LEN] as usize;
    if pending > 0 {
        let take = (block - pending).min(input.len());
        state[PENDING + pending..PENDING + pending + take].copy_from_slice(&input[..take]);
        pending += take;
        input = &input[take..];
        if pending == block {
            let (chain, rest) = state.split_at_mut(PENDING);
            compress(algorithm, chain, &rest[..block]);
            pending = 0;
        }
    }

    while input.len() >= block {
        compress(algorithm, &mut state[CHAIN..PENDING], &input[..block]);
        input = &input[block..];
    }

    if !input.is_empty() {
        state[PENDING..PENDING + input.len()].copy_from_slice(input);
        pending = input.len();
    }
    state[PENDING_LEN] = pending as u8;
}

/// Pads the message and returns the digest. `state` is left spent.
pub(crate) fn finalize(algorithm: HashAlgorithm, state: &mut [u8]) -> Vec<u8> {
    let block = block_len(algorithm);
    let length_len = block / 8;
    let bits = read_total(state).wrapping_mul(8).to_be_bytes();

    let pending = state[PENDING_LEN] as usize;
    let pad_len = if pending + 1 + length_len <= block {
        block - pending
    } else {
        2 * block - pending
    };
    let mut tail = [0u8; 256];
    tail[0] = 0x80;
    tail[pad_len - length_len..pad_len].copy_from_slice(&bits[16 - length_len..]);
    absorb(algorithm, state, &tail[..pad_len]);

    let mut out = Vec::with_capacity(64);
    let chain = &state[CHAIN..PENDING];
    match algorithm {
        HashAlgorithm::Sha224 | HashAlgorithm::Sha256 => {
            for raw in chain.chunks_exact(4) {
                out.extend_from_slice(&u32::from_le_bytes(word4(raw)).to_be_bytes());
            }
        }
        HashAlgorithm::Sha384 | HashAlgorithm::Sha512 => {
            for raw in chain.chunks_exact(8) {
                out.extend_from_slice(&u64::from_le_bytes(word8(raw)).to_be_bytes());
            }
        }
    }
    out.truncate(algorithm.digest_len());
    out
}

fn compress(algorithm: HashAlgorithm, chain: &mut [u8], block: &[u8]) {
    match algorithm {
        HashAlgorithm::Sha224 | HashAlgorithm::Sha256 => {
            let mut words = [0u32; 8];
            for (word, raw) in words.iter_mut().zip(chain.chunks_exact(4)) {
                *word = u32::from_le_bytes(word4(raw));
            }
            sha2::compress256(&mut words, core::slice::from_ref(GenericArray::from_slice(block)));
            store_words32(chain, &words);
            words.zeroize();
        }
        HashAlgorithm::Sha384 | HashAlgorithm::Sha512 => {
            let mut words = [0u64; 8];
            for (word, raw) in words.iter_mut().zip(chain.chunks_exact(8)) {
                *word = u64::from_le_bytes(word8(raw));
            }
            sha2::compress512(&mut words, core::slice::from_ref(GenericArray::from_slice(block)));
            store_words64(chain, &words);
            words.zeroize();
        }
    }
}

fn store_words32(chain: &mut [u8], words: &[u32; 8]) {
    for (raw, word) in chain.chunks_exact_mut(4).zip(words) {
        raw.copy_from_slice(&word.to_le_bytes());
    }
}

fn store_words64(chain: &mut [u8], words: &[u64; 8]) {
    for (raw, word) in chain.chunks_exact_mut(8).zip(words) {
        raw.copy_from_slice(&word.to_le_bytes());
    }
}

fn word4(raw: &[u8]) -> [u8; 4] {
    let mut word = [0u8; 4];
    word.copy_from_slice(raw);
    word
}

fn word8(raw: &[u8]) -> [u8; 8] {
    let mut word = [0u8; 8];
    word.copy_from_slice(raw);
    word
}

fn read_total(state: &[u8]) -> u128 {
    let mut raw = [0u8; 16];
    raw.copy_from_slice(&state[TOTAL..TOTAL + 16]);
    u128::from_le_bytes(raw)
}
