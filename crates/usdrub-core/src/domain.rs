use std::fmt;

/// Telegram chat id (numeric). Also the requester key for page cursors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Region slug of the branch listing (`moskva`, `sankt-peterburg`, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Region(String);

impl Region {
    pub const DEFAULT: &'static str = "moskva";

    /// Blank input falls back to [`Region::DEFAULT`].
    pub fn new(slug: &str) -> Self {
        let slug = slug.trim();
        if slug.is_empty() {
            return Self(Self::DEFAULT.to_string());
        }
        Self(slug.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Region {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side of the quote a view is ranked by.
///
/// `Buy` is the rate at which a branch buys currency from a customer, so the
/// best offer is the highest one. `Sell` is the rate a customer pays, so the
/// best offer is the lowest one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Side::Buy => "Buy cash",
            Side::Sell => "Sell cash",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_region_falls_back_to_default() {
        assert_eq!(Region::new("").as_str(), "moskva");
        assert_eq!(Region::new("   ").as_str(), "moskva");
        assert_eq!(Region::new(" sankt-peterburg ").as_str(), "sankt-peterburg");
    }
}
