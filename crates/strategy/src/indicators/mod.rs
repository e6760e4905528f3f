//! Pure indicator functions over a price series (oldest first).
//!
//! Every function is recomputed in full from the trailing window on each
//! call and returns a defined sentinel instead of failing when there is not
//! enough history.

pub mod bollinger;
pub mod ma;
pub mod rsi;
pub mod stochastic;

pub use bollinger::{bollinger_bands, Bands};
pub use ma::sma;
pub use rsi::{rsi, RSI_NEUTRAL};
pub use stochastic::{stochastic, STOCHASTIC_NEUTRAL};
