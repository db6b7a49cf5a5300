//! # Ledger Module
//!
//! The wallet's view of the LUMEN ledger: addresses, transaction
//! construction, and the signed-transaction wire codec. The airgap
//! subsystem treats these as its "external collaborator" surfaces —
//! it builds transactions here, and it hands raw signed bytes back here
//! to be taken apart for verification.
//!
//! ```text
//! address.rs     — Bech32 addresses derived from BLAKE3(public key)
//! transaction.rs — LedgerTransaction, canonical bytes, TransactionBuilder
//! signing.rs     — sign-in-place + signed-transaction wire codec
//! ```
//!
//! Nothing in this module talks to the network. Broadcast, balance
//! queries, and block state belong to the node RPC layer, which the
//! airgap verification flow deliberately never touches.

pub mod address;
pub mod signing;
pub mod transaction;

pub use address::{AddressError, LumenAddress};
pub use signing::{decode_signed, decode_txn, encode_txn, sign_transaction, DecodedSignedTxn, SignedTxnError};
pub use transaction::{LedgerTransaction, TransactionBuilder};
