//! Status enums for orders and the display language.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown status or language code.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

/// Order delivery status.
///
/// Statuses are assigned by the server and only ever move forward:
/// `pending -> confirmed -> out_for_delivery -> delivered`. The client reads
/// them; it never writes them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    OutForDelivery,
    Delivered,
}

impl OrderStatus {
    /// All statuses in delivery order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Confirmed,
        Self::OutForDelivery,
        Self::Delivered,
    ];

    /// Position in the delivery sequence (0 for `pending`).
    #[must_use]
    pub const fn step(self) -> usize {
        match self {
            Self::Pending => 0,
            Self::Confirmed => 1,
            Self::OutForDelivery => 2,
            Self::Delivered => 3,
        }
    }

    /// The status that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Confirmed),
            Self::Confirmed => Some(Self::OutForDelivery),
            Self::OutForDelivery => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }

    /// Whether the order has reached its final status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Whether moving to `to` respects forward-only progression.
    ///
    /// Skipping steps is allowed (the server may confirm and dispatch between
    /// two syncs); going backwards or staying put is not a transition.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        to.step() > self.step()
    }

    /// Tracking timeline: each status paired with whether it has been reached.
    #[must_use]
    pub fn progress_steps(self) -> [(Self, bool); 4] {
        Self::ALL.map(|status| (status, status.step() <= self.step()))
    }

    /// Wire code (`out_for_delivery`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
        }
    }

    /// Human-readable label in the given language.
    #[must_use]
    pub const fn label(self, language: Language) -> &'static str {
        match (self, language) {
            (Self::Pending, Language::En) => "Order Placed",
            (Self::Pending, Language::Ar) => "تم تقديم الطلب",
            (Self::Confirmed, Language::En) => "Order Confirmed",
            (Self::Confirmed, Language::Ar) => "تم تأكيد الطلب",
            (Self::OutForDelivery, Language::En) => "Out for Delivery",
            (Self::OutForDelivery, Language::Ar) => "في الطريق",
            (Self::Delivered, Language::En) => "Delivered",
            (Self::Delivered, Language::Ar) => "تم التوصيل",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "order status",
                value: s.to_owned(),
            })
    }
}

/// Display language of the app. Arabic is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ar,
    En,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ar => write!(f, "ar"),
            Self::En => write!(f, "en"),
        }
    }
}

impl std::str::FromStr for Language {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ar" => Ok(Self::Ar),
            "en" => Ok(Self::En),
            _ => Err(ParseEnumError {
                kind: "language",
                value: s.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_progression_is_forward_only() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Confirmed));
        assert_eq!(OrderStatus::OutForDelivery.next(), Some(OrderStatus::Delivered));
        assert_eq!(OrderStatus::Delivered.next(), None);
        assert!(OrderStatus::Delivered.is_terminal());
    }

    #[test]
    fn test_status_ordering_matches_steps() {
        let mut shuffled = [
            OrderStatus::Delivered,
            OrderStatus::Pending,
            OrderStatus::OutForDelivery,
            OrderStatus::Confirmed,
        ];
        shuffled.sort();
        assert_eq!(shuffled, OrderStatus::ALL);
    }

    #[test]
    fn test_progress_steps() {
        let steps = OrderStatus::Confirmed.progress_steps();
        let reached: Vec<bool> = steps.iter().map(|(_, done)| *done).collect();
        assert_eq!(reached, vec![true, true, false, false]);
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&OrderStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"out_for_delivery\"");
        assert_eq!(
            "out_for_delivery".parse::<OrderStatus>().unwrap(),
            OrderStatus::OutForDelivery
        );
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_language_roundtrip() {
        assert_eq!(Language::default(), Language::Ar);
        assert_eq!("en".parse::<Language>().unwrap(), Language::En);
        assert_eq!(Language::En.to_string(), "en");
        assert!("fr".parse::<Language>().is_err());
    }
}
