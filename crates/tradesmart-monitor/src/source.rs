//! Candle source seam for the monitor loop.

use std::future::Future;

use tradesmart_core::{OhlcvCandle, Timeframe};
use tradesmart_quotes::{QuoteClient, QuoteResult};

/// Supplier of the most recent 1-minute candle for a symbol.
///
/// The monitor is generic over this trait so the loop can be exercised
/// with scripted prices in tests.
pub trait CandleSource: Send + Sync {
    fn latest_candle(
        &self,
        symbol: &str,
    ) -> impl Future<Output = QuoteResult<Option<OhlcvCandle>>> + Send;
}

impl CandleSource for QuoteClient {
    async fn latest_candle(&self, symbol: &str) -> QuoteResult<Option<OhlcvCandle>> {
        let candles = self.fetch_candles(symbol, Timeframe::Min1, 1).await?;
        Ok(candles.into_iter().next())
    }
}
