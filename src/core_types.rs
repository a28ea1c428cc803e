//! Core types used throughout the ledger
//!
//! Type aliases that give the integer columns of the store a meaning at
//! every call site.

/// Account ID - internal primary key of an account row.
///
/// # Constraints:
/// - **Immutable**: assigned once at onboarding, never reused
/// - **Ordered**: lock acquisition follows ascending `AccountId` to keep
///   concurrent multi-account writes deadlock free
pub type AccountId = i64;

/// Transaction ID - key of an audit row.
///
/// Monotonically increasing in creation order (BIGSERIAL in PostgreSQL,
/// an atomic counter in the in-memory store).
pub type TransactionId = i64;

/// Monetary amount in minor units (kobo / cents).
///
/// Signed so a single column can hold both credits (positive) and debits
/// (negative). Balances are always `>= 0`.
pub type Amount = i64;

/// Opaque owner identity issued by the external identity provider.
pub type OwnerId = String;
