//! Field layout of a software-backend workspace.
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 1 | state (0 blank, 1 active) |
//! | 1 | 1 | algorithm tag |
//! | 2 | 1 | direction tag |
//! | 3 | 1 | key length |
//! | 4 | 1 | nonce length |
//! | 5 | 1 | step flags |
//! | 8 | 4 | prefix length (AD or salt) |
//! | 12 | 4 | data length |
//! | 16 | 8 | counter (stream position or bytes produced) |
//! | 24 | 8 | limit (output capacity) |
//! | 32 | 64 | key |
//! | 96 | 16 | nonce |
//! | 112 | rest | buffer: prefix bytes, then data bytes, or family state |
//!
//! The key field holds at most 64 bytes. HMAC keys longer than one block are
//! hashed down first and HKDF keeps only its 32-byte pseudorandom key, so
//! neither family is bound by it.
//!
//! A failed update leaves the workspace zeroed: the slot is released right
//! after without a pool-level wipe.

use zeroize::Zeroize;

use crate::domain::BackendError;

const STATE: usize = 0;
const ALGORITHM: usize = 1;
const DIRECTION: usize = 2;
const KEY_LEN: usize = 3;
const NONCE_LEN: usize = 4;
const FLAGS: usize = 5;
const PREFIX_LEN: usize = 8;
const DATA_LEN: usize = 12;
const COUNTER: usize = 16;
const LIMIT: usize = 24;
const KEY: usize = 32;
const NONCE: usize = 96;
const BUFFER: usize = 112;

/// Longest key a workspace can hold.
pub(crate) const MAX_KEY_LEN: usize = NONCE - KEY;
/// Longest nonce a workspace can hold.
pub(crate) const MAX_NONCE_LEN: usize = BUFFER - NONCE;

const ACTIVE: u8 = 1;

/// Typed access to the bytes of one workspace.
pub(crate) struct Workspace<'a> {
    bytes: &'a mut [u8],
}

impl<'a> Workspace<'a> {
    /// Wraps a workspace large enough for the header.
    pub(crate) fn new(bytes: &'a mut [u8]) -> Result<Self, BackendError> {
        if bytes.len() < BUFFER {
            return Err(BackendError::InsufficientMemory);
        }
        Ok(Self { bytes })
    }

    /// Wraps a workspace that has been set up.
    pub(crate) fn active(bytes: &'a mut [u8]) -> Result<Self, BackendError> {
        let workspace = Self::new(bytes)?;
        workspace.require_active()?;
        Ok(workspace)
    }

    fn require_active(&self) -> Result<(), BackendError> {
        if self.bytes[STATE] != ACTIVE {
            return Err(BackendError::BadState);
        }
        Ok(())
    }

    /// Marks the workspace set up for `algorithm` and `direction`.
    pub(crate) fn activate(&mut self, algorithm: u8, direction: u8) {
        self.bytes[STATE] = ACTIVE;
        self.bytes[ALGORITHM] = algorithm;
        self.bytes[DIRECTION] = direction;
    }

    pub(crate) fn algorithm(&self) -> u8 {
        self.bytes[ALGORITHM]
    }

    pub(crate) fn direction(&self) -> u8 {
        self.bytes[DIRECTION]
    }

    pub(crate) fn has_flag(&self, flag: u8) -> bool {
        self.bytes[FLAGS] & flag != 0
    }

    pub(crate) fn set_flag(&mut self, flag: u8) {
        self.bytes[FLAGS] |= flag;
    }

    pub(crate) fn key(&self) -> &[u8] {
        let len = self.bytes[KEY_LEN] as usize;
        &self.bytes[KEY..KEY + len]
    }

    pub(crate) fn set_key(&mut self, key: &[u8]) -> Result<(), BackendError> {
        if key.is_empty() || key.len() > MAX_KEY_LEN {
            return Err(BackendError::InvalidArgument);
        }
        self.bytes[KEY..KEY + key.len()].copy_from_slice(key);
        self.bytes[KEY_LEN] = key.len() as u8;
        Ok(())
    }

    pub(crate) fn nonce(&self) -> &[u8] {
        let len = self.bytes[NONCE_LEN] as usize;
        &self.bytes[NONCE..NONCE + len]
    }

    pub(crate) fn set_nonce(&mut self, nonce: &[u8]) -> Result<(), BackendError> {
        if nonce.len() > MAX_NONCE_LEN {
            return Err(BackendError::InvalidArgument);
        }
        self.bytes[NONCE..NONCE + nonce.len()].copy_from_slice(nonce);
        self.bytes[NONCE_LEN] = nonce.len() as u8;
        Ok(())
    }

    pub(crate) fn counter(&self) -> u64 {
        read_u64(&*self.bytes, COUNTER)
    }

    pub(crate) fn set_counter(&mut self, value: u64) {
        self.bytes[COUNTER..COUNTER + 8].copy_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn limit(&self) -> u64 {
        read_u64(&*self.bytes, LIMIT)
    }

    pub(crate) fn set_limit(&mut self, value: u64) {
        self.bytes[LIMIT..LIMIT + 8].copy_from_slice(&value.to_le_bytes());
    }

    fn prefix_len(&self) -> usize {
        read_u32(&*self.bytes, PREFIX_LEN) as usize
    }

    fn data_len(&self) -> usize {
        read_u32(&*self.bytes, DATA_LEN) as usize
    }

    /// Buffer area, for families keeping their own state there.
    pub(crate) fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[BUFFER..]
    }

    /// Bytes buffered before any data.
    pub(crate) fn prefix(&self) -> &[u8] {
        &self.bytes[BUFFER..BUFFER + self.prefix_len()]
    }

    /// Data bytes buffered after the prefix.
    pub(crate) fn data(&self) -> &[u8] {
        let start = BUFFER + self.prefix_len();
        &self.bytes[start..start + self.data_len()]
    }

    /// Appends to the prefix. Only allowed while no data is buffered.
    pub(crate) fn append_prefix(&mut self, input: &[u8]) -> Result<(), BackendError> {
        if self.data_len() != 0 {
            return Err(BackendError::BadState);
        }
        let start = BUFFER + self.prefix_len();
        self.copy_into_buffer(start, input)?;
        let len = self.prefix_len() + input.len();
        self.bytes[PREFIX_LEN..PREFIX_LEN + 4].copy_from_slice(&(len as u32).to_le_bytes());
        Ok(())
    }

    /// Appends to the data.
    pub(crate) fn append_data(&mut self, input: &[u8]) -> Result<(), BackendError> {
        let start = BUFFER + self.prefix_len() + self.data_len();
        self.copy_into_buffer(start, input)?;
        let len = self.data_len() + input.len();
        self.bytes[DATA_LEN..DATA_LEN + 4].copy_from_slice(&(len as u32).to_le_bytes());
        Ok(())
    }

    fn copy_into_buffer(&mut self, start: usize, input: &[u8]) -> Result<(), BackendError> {
        let end = start
            .checked_add(input.len())
            .filter(|end| *end <= self.bytes.len())
            .ok_or(BackendError::InsufficientMemory)?;
        self.bytes[start..end].copy_from_slice(input);
        Ok(())
    }

    /// Clears the whole workspace.
    pub(crate) fn wipe(&mut self) {
        self.bytes.zeroize();
    }
}

/// Runs one update step on an active workspace, wiping it if the step fails.
pub(crate) fn update_step<T>(
    bytes: &mut [u8],
    step: impl FnOnce(&mut Workspace<'_>) -> Result<T, BackendError>,
) -> Result<T, BackendError> {
    let mut workspace = Workspace::new(bytes)?;
    let result = workspace
        .require_active()
        .and_then(|()| step(&mut workspace));
    if result.is_err() {
        workspace.wipe();
    }
    result
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(raw)
}
