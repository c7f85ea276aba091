//! # GEM Protocol Module
//!
//! Implementation of the Brultech GEM ASCII status-report protocol.
//!
//! This module handles:
//! - Status-report grammar (`&`-joined `key=value` fields)
//! - Per-channel energy / pulse / temperature samples
//! - Tolerant decoding (malformed fields are recorded, never fatal)
//! - Keepalive poll constant

pub mod protocol;
pub mod decoder;
