//! Consensus constants for transaction-level validation

/// Maximum money supply: 21,000,000 coins in base units
pub const MAX_MONEY: i64 = 21_000_000 * 100_000_000;

/// Base units per coin
pub const COIN: i64 = 100_000_000;

/// Coinbase outputs may only be spent this many blocks after creation
pub const COINBASE_MATURITY: i32 = 100;

/// Lock time threshold: lock times below this are block heights, otherwise Unix times
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;

/// Sequence number for final inputs; also disables lock time when set on every input
pub const SEQUENCE_FINAL: u32 = 0xffffffff;

/// Sequence numbers with this bit set carry no relative lock time
pub const SEQUENCE_LOCKTIME_DISABLE_FLAG: u32 = 1 << 31;

/// Selects time-based (set) or height-based (clear) relative lock time
pub const SEQUENCE_LOCKTIME_TYPE_FLAG: u32 = 1 << 22;

/// Bits of the sequence number holding the relative lock magnitude
pub const SEQUENCE_LOCKTIME_MASK: u32 = 0x0000ffff;

/// Time-based relative locks are in units of 2^9 = 512 seconds
pub const SEQUENCE_LOCKTIME_GRANULARITY: u32 = 9;

/// Number of blocks used to compute median-time-past
pub const MEDIAN_TIME_SPAN: usize = 11;

/// Lock-time flag: enforce BIP68 relative lock times
pub const LOCKTIME_VERIFY_SEQUENCE: u32 = 1 << 0;

/// Script flag: evaluate P2SH redeem scripts
pub const SCRIPT_VERIFY_P2SH: u32 = 1 << 0;

/// Script flag: evaluate segregated witness programs
pub const SCRIPT_VERIFY_WITNESS: u32 = 1 << 11;

/// Legacy and P2SH sig-ops are weighted by this factor, witness sig-ops are not
pub const WITNESS_SCALE_FACTOR: i64 = 4;

/// Maximum sig-op cost per block
pub const MAX_BLOCK_SIGOPS_COST: i64 = 80_000;

/// Sig-ops charged for a bare CHECKMULTISIG when the key count is not known
pub const MAX_PUBKEYS_PER_MULTISIG: u32 = 20;

/// Number of stack elements in a well-formed peg-in witness
pub const PEGIN_WITNESS_ITEMS: usize = 6;

/// Index of the claim script within a peg-in witness
pub const PEGIN_CLAIM_SCRIPT_INDEX: usize = 3;
