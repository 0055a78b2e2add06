//! Deterministic board account addresses.

use sha2::{Digest, Sha256};

/// Seed shared with the program for board accounts.
pub const BOARD_SEED: &[u8] = b"feedback_board";

/// base58(SHA-256(program_id ‖ seed ‖ creator ‖ board_id)).
///
/// The same (creator, board_id) pair always lands on the same account, so
/// a second `createFeedbackBoard` for it fails on-chain.
pub fn board_account(program_id: &str, creator: &str, board_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(program_id.as_bytes());
    hasher.update(BOARD_SEED);
    hasher.update(creator.as_bytes());
    hasher.update(board_id.as_bytes());
    bs58::encode(hasher.finalize()).into_string()
}
