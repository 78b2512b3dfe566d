//! Reply text selection.

use tracing::warn;

use crate::gold::GoldPriceClient;

/// Sent when a gold quote was requested but could not be fetched.
pub const GOLD_UNAVAILABLE: &str = "ไม่สามารถดึงข้อมูลราคาทองได้ในขณะนี้";

/// Sent when an incoming message could not be recorded.
pub const PROCESSING_FAILED: &str = "ขออภัย เกิดข้อผิดพลาดในการประมวลผลข้อความ";

const GOLD_KEYWORDS: [&str; 2] = ["gold", "ทอง"];

/// Chooses the reply for an incoming text message.
///
/// Messages asking about gold get the latest quote; everything else is
/// acknowledged by echoing the text back.
#[derive(Debug, Clone)]
pub struct ReplyComposer {
    gold: GoldPriceClient,
}

impl ReplyComposer {
    /// Creates a composer that answers gold requests from `gold`.
    pub fn new(gold: GoldPriceClient) -> Self {
        Self { gold }
    }

    /// Returns the reply text for `text`.
    ///
    /// Never fails: quote service errors become [`GOLD_UNAVAILABLE`].
    pub async fn compose(&self, text: &str) -> String {
        if !mentions_gold(text) {
            return echo(text);
        }

        match self.gold.latest().await {
            Ok(Some(quote)) => quote.to_message(),
            Ok(None) => GOLD_UNAVAILABLE.to_string(),
            Err(e) => {
                warn!(error = %e, "Gold price lookup failed");
                GOLD_UNAVAILABLE.to_string()
            },
        }
    }
}

/// Returns whether the message asks about the gold price.
pub fn mentions_gold(text: &str) -> bool {
    let lowered = text.to_lowercase();
    GOLD_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

/// Acknowledgement reply for ordinary messages.
pub fn echo(text: &str) -> String {
    format!("ได้รับข้อความ: {text}")
}
