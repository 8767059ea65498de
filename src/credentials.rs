use std::{fmt, num::ParseIntError};

/// API id/hash pair issued at https://my.telegram.org/apps.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredential {
    pub api_id: i32,
    pub api_hash: String,
}

impl ApiCredential {
    pub fn new(api_id: i32, api_hash: impl Into<String>) -> Self {
        Self {
            api_id,
            api_hash: api_hash.into(),
        }
    }

    pub fn parse(api_id: &str, api_hash: &str) -> Result<Self, ParseIntError> {
        Ok(Self::new(api_id.trim().parse()?, api_hash.trim()))
    }
}

// api_hash stays out of logs
impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("api_id", &self.api_id)
            .field("api_hash", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSet {
    /// One pair for every phone number.
    Shared(ApiCredential),
    /// One pair per phone number, by position. Positions without an entry,
    /// including everything past the end of `entries`, use `fallback`.
    PerPhone {
        fallback: ApiCredential,
        entries: Vec<Option<ApiCredential>>,
    },
}

impl CredentialSet {
    /// Builds a set from pairs loaded from the credentials file. More than
    /// one pair switches to per-phone mode.
    pub fn from_loaded(mut credentials: Vec<ApiCredential>) -> Option<Self> {
        match credentials.len() {
            0 => None,
            1 => credentials.pop().map(Self::Shared),
            _ => Some(Self::PerPhone {
                fallback: credentials[0].clone(),
                entries: credentials.into_iter().map(Some).collect(),
            }),
        }
    }

    /// Builds a per-phone set from interactively collected slots. The first
    /// present slot becomes the fallback.
    pub fn per_phone(entries: Vec<Option<ApiCredential>>) -> Option<Self> {
        let fallback = entries.iter().flatten().next()?.clone();
        Some(Self::PerPhone { fallback, entries })
    }

    pub fn is_per_phone(&self) -> bool {
        matches!(self, Self::PerPhone { .. })
    }

    pub fn resolve(&self, index: usize) -> &ApiCredential {
        match self {
            Self::Shared(credential) => credential,
            Self::PerPhone { fallback, entries } => entries
                .get(index)
                .and_then(Option::as_ref)
                .unwrap_or(fallback),
        }
    }

    /// Number of phone numbers out of `phone_count` that resolve to the
    /// fallback pair in per-phone mode.
    pub fn fallback_count(&self, phone_count: usize) -> usize {
        match self {
            Self::Shared(_) => 0,
            Self::PerPhone { entries, .. } => (0..phone_count)
                .filter(|&index| !matches!(entries.get(index), Some(Some(_))))
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(api_id: i32) -> ApiCredential {
        ApiCredential::new(api_id, format!("hash{api_id}"))
    }

    #[test]
    fn shared_resolves_every_index_to_the_same_pair() {
        let set = CredentialSet::Shared(pair(1));
        for index in 0..16 {
            assert_eq!(set.resolve(index), &pair(1));
        }
        assert_eq!(set.fallback_count(16), 0);
    }

    #[test]
    fn per_phone_resolves_by_position_then_falls_back_to_first() {
        let set = CredentialSet::from_loaded(vec![pair(1), pair(2), pair(3)]).unwrap();
        assert!(set.is_per_phone());
        assert_eq!(set.resolve(0), &pair(1));
        assert_eq!(set.resolve(1), &pair(2));
        assert_eq!(set.resolve(2), &pair(3));
        assert_eq!(set.resolve(3), &pair(1));
        assert_eq!(set.resolve(100), &pair(1));
        assert_eq!(set.fallback_count(5), 2);
    }

    #[test]
    fn single_loaded_pair_is_shared() {
        let set = CredentialSet::from_loaded(vec![pair(7)]).unwrap();
        assert_eq!(set, CredentialSet::Shared(pair(7)));
        assert!(CredentialSet::from_loaded(vec![]).is_none());
    }

    #[test]
    fn blank_slots_use_first_present_pair() {
        let set = CredentialSet::per_phone(vec![None, Some(pair(2)), None]).unwrap();
        assert_eq!(set.resolve(0), &pair(2));
        assert_eq!(set.resolve(1), &pair(2));
        assert_eq!(set.resolve(2), &pair(2));
        assert_eq!(set.fallback_count(3), 2);
        assert!(CredentialSet::per_phone(vec![None, None]).is_none());
    }

    #[test]
    fn parse_trims_and_rejects_non_numeric_ids() {
        assert_eq!(ApiCredential::parse(" 123 ", " abc ").unwrap(), ApiCredential::new(123, "abc"));
        assert!(ApiCredential::parse("12a", "abc").is_err());
    }

    #[test]
    fn debug_output_redacts_hash() {
        let debug = format!("{:?}", ApiCredential::new(1, "secret"));
        assert!(!debug.contains("secret"));
    }
}
