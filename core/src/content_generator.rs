//! Deterministic message content, sender ids and mobile numbers.
//!
//! All generation is deterministic (same RNG seed = same text).

use crate::{record::ContentKind, rng::StreamRng};

/// Deterministic content generator using curated word lists
pub struct ContentGenerator;

impl ContentGenerator {
    /// Message body for a content classification.
    pub fn message_text(kind: ContentKind, rng: &mut StreamRng) -> String {
        match kind {
            ContentKind::Normal => Self::sentence(rng),
            ContentKind::Otp => Self::otp_text(rng),
            ContentKind::Spam => Self::spam_text(rng),
        }
    }

    /// A plain transactional sentence: "Subject verb object when."
    pub fn sentence(rng: &mut StreamRng) -> String {
        format!(
            "{} {} {} {}.",
            pick(rng, Self::subjects()),
            pick(rng, Self::verbs()),
            pick(rng, Self::objects()),
            pick(rng, Self::whens()),
        )
    }

    pub fn otp_text(rng: &mut StreamRng) -> String {
        let code = rng.range_inclusive(100_000, 999_999);
        match rng.next_u64_below(4) {
            0 => format!("Your OTP is {code}"),
            1 => format!("Your OTP for login is {code}. Do not share it."),
            2 => format!("Use code {code} to verify your account"),
            _ => format!("{code} is your verification code"),
        }
    }

    pub fn spam_text(rng: &mut StreamRng) -> String {
        let domain = pick(rng, Self::shady_domains());
        let slug = rng.next_u64_below(10_000);
        match rng.next_u64_below(5) {
            0 => "WIN A FREE GIFT NOW!".to_string(),
            1 => format!("URGENT: your parcel is on hold, pay the fee at http://{domain}/p{slug}"),
            2 => format!("Your BANK account is locked. Verify now at www.{domain}"),
            3 => "Claim your PRIZE today, reply YES to opt in".to_string(),
            _ => format!("Amazon: your order failed, update payment at https://{domain}/u{slug}"),
        }
    }

    /// Alphanumeric sender handle, e.g. "mgarcia481".
    pub fn sender_id(rng: &mut StreamRng) -> String {
        let first = pick(rng, Self::first_names());
        let last = pick(rng, Self::last_names());
        let initial = first.chars().next().unwrap_or('x').to_ascii_lowercase();
        format!("{initial}{}{}", last.to_lowercase(), rng.next_u64_below(1000))
    }

    /// Mobile number in the destination country's numbering plan.
    pub fn mobile_number(country: &str, rng: &mut StreamRng) -> String {
        let (prefix, digits) = match country {
            "United Kingdom" => ("+44 7", 9),
            "USA" => ("+1 ", 10),
            "Japan" => ("+81 90", 8),
            "Germany" => ("+49 15", 9),
            "India" => ("+91 9", 9),
            "Brazil" => ("+55 11 9", 8),
            "Palestine" => ("+970 59", 7),
            "Nigeria" => ("+234 80", 8),
            _ => ("+00 ", 10),
        };
        let mut number = String::with_capacity(prefix.len() + digits);
        number.push_str(prefix);
        for _ in 0..digits {
            number.push(char::from(b'0' + rng.next_u64_below(10) as u8));
        }
        number
    }

    fn subjects() -> &'static [&'static str] {
        &[
            "Your appointment", "Your delivery", "The team meeting", "Your order",
            "Your prescription", "The invoice", "Your table reservation", "The webinar",
            "Your subscription", "The store pickup", "Your flight", "The service visit",
        ]
    }

    fn verbs() -> &'static [&'static str] {
        &[
            "is confirmed", "has moved", "will arrive", "is scheduled",
            "is ready", "was updated", "starts", "is due",
        ]
    }

    fn objects() -> &'static [&'static str] {
        &[
            "at the main branch", "with our north office", "at your door",
            "at counter three", "in the usual room", "via the app", "at gate twelve",
        ]
    }

    fn whens() -> &'static [&'static str] {
        &[
            "tomorrow morning", "this afternoon", "on Monday", "next week",
            "later today", "this evening", "on Friday at noon",
        ]
    }

    fn shady_domains() -> &'static [&'static str] {
        &[
            "secure-verify.co", "parcel-fees.info", "bonus-claims.biz",
            "acct-review.net", "gift-centre.top",
        ]
    }

    fn first_names() -> &'static [&'static str] {
        &[
            "James", "Maria", "Aiko", "Lukas", "Priya", "Joao", "Amira", "Chidi",
            "Olivia", "Daniel", "Sofia", "Kenji", "Hannah", "Ravi", "Lucas", "Ngozi",
        ]
    }

    fn last_names() -> &'static [&'static str] {
        &[
            "Smith", "Garcia", "Tanaka", "Muller", "Patel", "Silva", "Haddad", "Okafor",
            "Brown", "Schmidt", "Sato", "Sharma", "Costa", "Nasser", "Adeyemi", "Wilson",
        ]
    }
}

fn pick(rng: &mut StreamRng, items: &'static [&'static str]) -> &'static str {
    items[rng.next_u64_below(items.len() as u64) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_generation_is_deterministic() {
        let mut rng1 = StreamRng::new(12345, 3);
        let mut rng2 = StreamRng::new(12345, 3);
        for kind in [ContentKind::Normal, ContentKind::Otp, ContentKind::Spam] {
            assert_eq!(
                ContentGenerator::message_text(kind, &mut rng1),
                ContentGenerator::message_text(kind, &mut rng2)
            );
        }
    }

    #[test]
    fn otp_text_carries_six_digit_code() {
        let mut rng = StreamRng::new(1, 3);
        for _ in 0..50 {
            let text = ContentGenerator::otp_text(&mut rng);
            let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
            assert_eq!(digits.len(), 6, "{text}");
        }
    }

    #[test]
    fn mobile_numbers_use_country_prefix() {
        let mut rng = StreamRng::new(1, 7);
        let number = ContentGenerator::mobile_number("Nigeria", &mut rng);
        assert!(number.starts_with("+234 80"));
        assert_eq!(number.len(), "+234 80".len() + 8);
    }

    #[test]
    fn sender_ids_are_lowercase_handles() {
        let mut rng = StreamRng::new(2, 7);
        for _ in 0..20 {
            let id = ContentGenerator::sender_id(&mut rng);
            assert!(!id.is_empty());
            assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()), "{id}");
        }
    }
}
