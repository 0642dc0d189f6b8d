//! Remote loading errors.

/// Why a remote load failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The transport could not complete the exchange.
    #[error("REMOTE_CONNECTIVITY: could not reach the feed endpoint")]
    Connectivity,

    /// The endpoint answered, but not with a decodable 200 feed payload.
    #[error("REMOTE_INVALID_DATA: response was not a valid feed")]
    InvalidData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_in_message() {
        assert!(RemoteError::Connectivity.to_string().starts_with("REMOTE_CONNECTIVITY"));
        assert!(RemoteError::InvalidData.to_string().starts_with("REMOTE_INVALID_DATA"));
    }
}
