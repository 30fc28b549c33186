//! Generated record types.

use crate::types::{Country, MessageId, RefId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    #[serde(rename = "SMS")]
    Sms,
    #[serde(rename = "WhatsApp")]
    WhatsApp,
    #[serde(rename = "RCS")]
    Rcs,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Normal,
    Otp,
    Spam,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DeliveryStatus {
    Delivered,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FraudType {
    None,
    OtpAbuse,
    CodeMisuse,
    SpoofedId,
    LinkFraud,
    BrandImpersonation,
}

macro_rules! labels {
    ($ty:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($ty::$variant),)+
                    other => Err(format!("unknown {} '{}'", stringify!($ty), other)),
                }
            }
        }
    };
}

labels!(Channel { Sms => "SMS", WhatsApp => "WhatsApp", Rcs => "RCS" });
labels!(ContentKind { Normal => "normal", Otp => "otp", Spam => "spam" });
labels!(DeliveryStatus { Delivered => "Delivered", Failed => "Failed" });
labels!(FraudType {
    None => "none",
    OtpAbuse => "otp_abuse",
    CodeMisuse => "code_misuse",
    SpoofedId => "spoofed_id",
    LinkFraud => "link_fraud",
    BrandImpersonation => "brand_impersonation",
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageRecord {
    pub message_id: MessageId,
    pub customer_id: RefId,
    pub timestamp: NaiveDateTime,
    pub mobile_number: String,
    pub destination_country: Country,
    pub sender_id: String,
    pub message_content: String,
    pub regex_pattern_match: Option<String>,
    pub error_code: RefId,
    pub delivery_status: DeliveryStatus,
    pub is_fraud: bool,
    pub fraud_type: FraudType,
    pub channel_type: Channel,
    pub content_type: ContentKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillingRecord {
    pub message_id: MessageId,
    pub aggregator_id: RefId,
    pub route_hops: u8,
    pub hop_details: String,
    pub total_cost_gbp: f64,
    pub direct_route: bool,
    pub fraud_reported_by_agg: bool,
    pub aggregator_error_code: Option<RefId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_back() {
        for c in Channel::ALL {
            assert_eq!(c.as_str().parse::<Channel>().unwrap(), *c);
        }
        for f in FraudType::ALL {
            assert_eq!(f.as_str().parse::<FraudType>().unwrap(), *f);
        }
        assert!("sms".parse::<Channel>().is_err());
    }
}
