//! Wire types for Binance market data messages
//!
//! Handles deserialization of depth deltas, trade events, and REST book
//! snapshots. Prices and quantities arrive as decimal strings and are parsed
//! once here, so snapshot and delta paths produce identical price keys.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

use crate::orderbook::Level;

/// Incremental depth delta from the `<symbol>@depth` stream
#[derive(Debug, Clone, Deserialize)]
pub struct DepthUpdate {
    /// First update ID in event (`U`)
    #[serde(rename = "U")]
    pub first_update_id: u64,

    /// Final update ID in event (`u`)
    #[serde(rename = "u")]
    pub last_update_id: u64,

    /// Bid levels to overwrite
    #[serde(rename = "b", default, deserialize_with = "deserialize_levels")]
    pub bids: Vec<Level>,

    /// Ask levels to overwrite
    #[serde(rename = "a", default, deserialize_with = "deserialize_levels")]
    pub asks: Vec<Level>,
}

/// Book snapshot from the REST `/depth` endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DepthSnapshot {
    #[serde(rename = "lastUpdateId")]
    pub last_update_id: u64,

    #[serde(deserialize_with = "deserialize_levels")]
    pub bids: Vec<Level>,

    #[serde(deserialize_with = "deserialize_levels")]
    pub asks: Vec<Level>,
}

/// Trade event from the `<symbol>@trade` stream
#[derive(Debug, Clone, Deserialize)]
pub struct TradeEvent {
    /// Trade price
    #[serde(rename = "p", deserialize_with = "deserialize_decimal")]
    pub price: Decimal,

    /// Trade quantity
    #[serde(rename = "q", deserialize_with = "deserialize_decimal")]
    pub qty: Decimal,

    /// True when the resting order was the buy side (aggressor sold)
    #[serde(rename = "m")]
    pub is_buyer_maker: bool,
}

fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let s: &str = Deserialize::deserialize(deserializer)?;
    Decimal::from_str(s).map_err(serde::de::Error::custom)
}

/// Decodes `[["price", "qty"], ...]` pairs
fn deserialize_levels<'de, D>(deserializer: D) -> Result<Vec<Level>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Vec<String>> = Deserialize::deserialize(deserializer)?;
    raw.into_iter()
        .map(|pair| {
            if pair.len() != 2 {
                return Err(serde::de::Error::custom("invalid price level format"));
            }
            Ok(Level {
                price: Decimal::from_str(&pair[0]).map_err(serde::de::Error::custom)?,
                qty: Decimal::from_str(&pair[1]).map_err(serde::de::Error::custom)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_depth_update() {
        let raw = r#"{
            "e": "depthUpdate",
            "E": 1672531200000,
            "s": "BTCUSDT",
            "U": 100,
            "u": 105,
            "b": [["50000.00", "1.5"], ["49999.00", "0"]],
            "a": [["50001.00", "1.0"]]
        }"#;

        let update: DepthUpdate = serde_json::from_str(raw).unwrap();
        assert_eq!(update.first_update_id, 100);
        assert_eq!(update.last_update_id, 105);
        assert_eq!(update.bids.len(), 2);
        assert_eq!(update.bids[0].price, dec!(50000.00));
        assert_eq!(update.bids[1].qty, Decimal::ZERO);
        assert_eq!(update.asks.len(), 1);
    }

    #[test]
    fn depth_update_sides_default_to_empty() {
        let update: DepthUpdate = serde_json::from_str(r#"{"U": 7, "u": 9}"#).unwrap();
        assert!(update.bids.is_empty());
        assert!(update.asks.is_empty());
    }

    #[test]
    fn rejects_depth_update_without_ids() {
        assert!(serde_json::from_str::<DepthUpdate>(r#"{"u": 9}"#).is_err());
        assert!(serde_json::from_str::<DepthUpdate>(r#"{"U": 7}"#).is_err());
    }

    #[test]
    fn parses_snapshot() {
        let raw = r#"{
            "lastUpdateId": 160,
            "bids": [["100.10", "2"], ["100.00", "1"]],
            "asks": [["100.20", "3"]]
        }"#;

        let snapshot: DepthSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.last_update_id, 160);
        assert_eq!(snapshot.bids[1].price, dec!(100.00));
        assert_eq!(snapshot.asks[0].qty, dec!(3));
    }

    #[test]
    fn rejects_malformed_level_pair() {
        let raw = r#"{"lastUpdateId": 1, "bids": [["100.10"]], "asks": []}"#;
        assert!(serde_json::from_str::<DepthSnapshot>(raw).is_err());
    }

    #[test]
    fn parses_trade_event() {
        let raw = r#"{
            "e": "trade",
            "E": 1672531200000,
            "s": "BTCUSDT",
            "t": 12345,
            "p": "50000.50",
            "q": "0.5",
            "T": 1672531200000,
            "m": true
        }"#;

        let trade: TradeEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(trade.price, dec!(50000.50));
        assert_eq!(trade.qty, dec!(0.5));
        assert!(trade.is_buyer_maker);
    }

    #[test]
    fn rejects_trade_without_maker_flag() {
        assert!(serde_json::from_str::<TradeEvent>(r#"{"p": "1.0", "q": "2.0"}"#).is_err());
    }
}
