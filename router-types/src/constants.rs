/// A channel is only considered stale once its funding transaction is at
/// least this many blocks old (~2 weeks at 144 blocks/day). Hard-coded per
/// §4.5/§6 rather than exposed in [`RouterConfig`](crate::config::RouterConfig),
/// since eclair never made these configurable either.
pub const STALE_CHANNEL_BLOCKS: u32 = 2016;

/// A channel is only considered stale once every known directional update is
/// at least this many seconds old (14 days). See [`STALE_CHANNEL_BLOCKS`].
pub const STALE_CHANNEL_SECONDS: u64 = 14 * 24 * 60 * 60;

/// The fixed payment amount (in millisatoshi) used to compute edge weights
/// for path finding. A deliberate simplification: real amount-aware,
/// cumulative-fee-aware weighting is delegated to a higher layer. See §4.2.
pub const REFERENCE_AMOUNT_MSAT: u64 = 10_000_000;
