//! Closed status vocabularies.
//!
//! Each enum is a plain tag. Conversions to and from their external string
//! forms live in the sibling modules as free functions.

// ---------------------------------------------------------------------------
// QuoteStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteStatus {
    Cancelled,
    Ordered,
    Sent,
}

pub mod quote_status {
    use super::QuoteStatus;

    pub const ALL: [QuoteStatus; 3] = [
        QuoteStatus::Cancelled,
        QuoteStatus::Ordered,
        QuoteStatus::Sent,
    ];

    pub fn to_display_string(status: QuoteStatus) -> &'static str {
        match status {
            QuoteStatus::Cancelled => "Cancelada",
            QuoteStatus::Ordered => "Pedida",
            QuoteStatus::Sent => "Emitida",
        }
    }

    /// Map a `STATUS_COT` value. Total: anything unrecognised is `Sent`.
    pub fn parse_from_string(raw: &str) -> QuoteStatus {
        match raw.trim().to_uppercase().as_str() {
            "CANCELADA" => QuoteStatus::Cancelled,
            "PEDIDA" => QuoteStatus::Ordered,
            "EMITIDA" => QuoteStatus::Sent,
            _ => QuoteStatus::Sent,
        }
    }
}

// ---------------------------------------------------------------------------
// EmailStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmailStatus {
    Sent,
    NoResponse,
}

pub mod email_status {
    use super::EmailStatus;

    pub fn to_display_string(status: EmailStatus) -> &'static str {
        match status {
            EmailStatus::Sent => "sent",
            EmailStatus::NoResponse => "no_response",
        }
    }
}

// ---------------------------------------------------------------------------
// ResponseType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseType {
    Buy,
    MoreInfo,
    NotInterested,
}

pub mod response_type {
    use super::ResponseType;

    pub const ALL: [ResponseType; 3] = [
        ResponseType::Buy,
        ResponseType::MoreInfo,
        ResponseType::NotInterested,
    ];

    pub fn to_display_string(kind: ResponseType) -> &'static str {
        match kind {
            ResponseType::Buy => "Buy",
            ResponseType::MoreInfo => "More Info",
            ResponseType::NotInterested => "Not Interested",
        }
    }

    /// Case-insensitive; inner spaces are equivalent to underscores.
    pub fn parse_from_string(raw: &str) -> Option<ResponseType> {
        let key = raw.trim().to_uppercase().replace(' ', "_");
        match key.as_str() {
            "BUY" => Some(ResponseType::Buy),
            "MORE_INFO" => Some(ResponseType::MoreInfo),
            "NOT_INTERESTED" => Some(ResponseType::NotInterested),
            _ => None,
        }
    }

    /// `Buy, More Info, Not Interested`
    pub fn valid_values() -> String {
        ALL.iter()
            .map(|k| to_display_string(*k))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_status_mapping_is_total() {
        let cases = [
            ("CANCELADA", QuoteStatus::Cancelled),
            ("PEDIDA", QuoteStatus::Ordered),
            ("EMITIDA", QuoteStatus::Sent),
            ("UNKNOWN", QuoteStatus::Sent),
            ("", QuoteStatus::Sent),
        ];
        for (raw, expected) in cases {
            assert_eq!(quote_status::parse_from_string(raw), expected, "{raw}");
        }
    }

    #[test]
    fn quote_status_mapping_trims_and_ignores_case() {
        assert_eq!(
            quote_status::parse_from_string("  cancelada "),
            QuoteStatus::Cancelled
        );
        assert_eq!(quote_status::parse_from_string("Pedida"), QuoteStatus::Ordered);
    }

    #[test]
    fn quote_status_display_parses_back() {
        for status in quote_status::ALL {
            let shown = quote_status::to_display_string(status);
            assert_eq!(quote_status::parse_from_string(shown), status);
        }
    }

    #[test]
    fn response_type_accepts_spaces_and_case() {
        assert_eq!(
            response_type::parse_from_string("more info"),
            Some(ResponseType::MoreInfo)
        );
        assert_eq!(
            response_type::parse_from_string(" NOT interested "),
            Some(ResponseType::NotInterested)
        );
        assert_eq!(
            response_type::parse_from_string("buy"),
            Some(ResponseType::Buy)
        );
        assert_eq!(response_type::parse_from_string("maybe"), None);
        assert_eq!(response_type::parse_from_string("moreinfo"), None);
    }

    #[test]
    fn response_type_valid_values_lists_display_strings() {
        assert_eq!(response_type::valid_values(), "Buy, More Info, Not Interested");
    }

    #[test]
    fn email_status_strings() {
        assert_eq!(email_status::to_display_string(EmailStatus::Sent), "sent");
        assert_eq!(
            email_status::to_display_string(EmailStatus::NoResponse),
            "no_response"
        );
    }
}
