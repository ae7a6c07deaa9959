use ethers::abi::Token;
use ethers::types::{Address, U256};

// ─────────────────── AutoInvest constructor arguments ───────────────────

/// Uniswap V3 `SwapRouter`, the ISwapRouter instance the Kovan deployment used.
pub const SWAP_ROUTER: [u8; 20] = [
    0xe5, 0x92, 0x42, 0x7a, 0x0a, 0xec, 0xe9, 0x2d, 0xe3, 0xed,
    0xee, 0x1f, 0x18, 0xe0, 0x15, 0x7c, 0x05, 0x86, 0x15, 0x64,
];

pub const BUY_START_TIME: u64 = 1_672_502_400; // 2023-01-01 00:00:00
pub const BUY_END_TIME: u64 = 1_735_660_800; // 2024-12-31 24:00:00
pub const WAITING_PERIOD: u64 = 15_638_400; // ~half a year before selling opens
pub const MIN_BUY_INTERVAL: u64 = 604_800; // 1 week
pub const MAX_BUY_INTERVAL: u64 = 1_814_400; // 3 weeks
pub const MIN_SELL_INTERVAL: u64 = 604_800; // 1 week
pub const MAX_SELL_INTERVAL: u64 = 1_209_600; // 2 weeks

/// The eight positional arguments of the `AutoInvest` constructor.
///
/// Timestamps and durations are in seconds. The date comments next to the
/// constants are informational only; nothing checks them against the values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AutoInvestParams {
    pub swap_router: Address,
    pub buy_start_time: U256,
    pub buy_end_time: U256,
    pub waiting_period: U256,
    pub min_buy_interval: U256,
    pub max_buy_interval: U256,
    pub min_sell_interval: U256,
    pub max_sell_interval: U256,
}

impl Default for AutoInvestParams {
    fn default() -> Self {
        Self {
            swap_router: Address::from(SWAP_ROUTER),
            buy_start_time: BUY_START_TIME.into(),
            buy_end_time: BUY_END_TIME.into(),
            waiting_period: WAITING_PERIOD.into(),
            min_buy_interval: MIN_BUY_INTERVAL.into(),
            max_buy_interval: MAX_BUY_INTERVAL.into(),
            min_sell_interval: MIN_SELL_INTERVAL.into(),
            max_sell_interval: MAX_SELL_INTERVAL.into(),
        }
    }
}

impl AutoInvestParams {
    /// ABI tokens in constructor order.
    pub fn into_tokens(self) -> Vec<Token> {
        vec![
            Token::Address(self.swap_router),
            Token::Uint(self.buy_start_time),
            Token::Uint(self.buy_end_time),
            Token::Uint(self.waiting_period),
            Token::Uint(self.min_buy_interval),
            Token::Uint(self.max_buy_interval),
            Token::Uint(self.min_sell_interval),
            Token::Uint(self.max_sell_interval),
        ]
    }
}
