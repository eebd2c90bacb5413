use super::client::ExchangeError;

const INSUFFICIENT_BALANCE_MARKERS: &[&str] = &[
    "insufficient balance",
    "insufficient funds",
    "balance is insufficient",
    "not enough balance",
    "余额不足",
];

impl ExchangeError {
    /// Classifies a raw exchange failure.
    ///
    /// `status` is the HTTP status when a response was received, `None` when
    /// the request never got one (connect failure, timeout). Balance markers in
    /// the message take precedence over the status code.
    pub fn classify(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();

        if INSUFFICIENT_BALANCE_MARKERS
            .iter()
            .any(|marker| lowered.contains(marker))
        {
            return ExchangeError::InsufficientExchangeBalance { message };
        }

        match status {
            Some(401) | Some(403) => ExchangeError::Unauthorized { message },
            Some(429) => ExchangeError::TransientNetworkError { message },
            Some(code) if (400..500).contains(&code) => ExchangeError::InvalidParameters { message },
            Some(code) if (200..300).contains(&code) => ExchangeError::InvalidParameters { message },
            _ => ExchangeError::TransientNetworkError { message },
        }
    }
}
