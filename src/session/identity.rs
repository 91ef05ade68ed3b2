use serde::{Deserialize, Serialize};

/// The caller as the page sees them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Identity {
    #[default]
    Absent,
    Present {
        name: String,
        image: String,
        /// Every name the caller may have posted under: the display name,
        /// social handle and wallet address.
        aliases: Vec<String>,
    },
}

impl Identity {
    /// A present identity known only by its display name.
    pub fn present(name: impl Into<String>, image: impl Into<String>) -> Self {
        let name = name.into();
        let aliases = if name.is_empty() {
            Vec::new()
        } else {
            vec![name.clone()]
        };
        Identity::Present {
            name,
            image: image.into(),
            aliases,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Identity::Present { .. })
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Identity::Present { name, .. } => Some(name),
            Identity::Absent => None,
        }
    }

    pub fn image(&self) -> Option<&str> {
        match self {
            Identity::Present { image, .. } => Some(image),
            Identity::Absent => None,
        }
    }

    /// Whether `author` is one of the names this caller goes by.
    pub fn is_known_as(&self, author: &str) -> bool {
        match self {
            Identity::Present { aliases, .. } => aliases.iter().any(|a| a == author),
            Identity::Absent => false,
        }
    }
}

/// Provider-neutral view of whatever the auth backend knows about a user.
/// Every auth integration normalizes into this before resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub social_handle: Option<String>,
    pub social_avatar: Option<String>,
    pub wallet_address: Option<String>,
    pub metadata_name: Option<String>,
    pub metadata_avatar: Option<String>,
}

impl Profile {
    pub fn with_handle(handle: impl Into<String>) -> Self {
        Self {
            social_handle: Some(handle.into()),
            ..Self::default()
        }
    }
}

fn non_empty<'a>(
    candidates: impl IntoIterator<Item = &'a Option<String>>,
) -> impl Iterator<Item = &'a str> {
    candidates
        .into_iter()
        .filter_map(|c| c.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
}

fn first_non_empty<'a>(candidates: impl IntoIterator<Item = &'a Option<String>>) -> String {
    non_empty(candidates).next().unwrap_or_default().to_string()
}

/// Resolve display name and avatar from a profile.
///
/// Name: social handle, then wallet address, then metadata name, then empty.
/// Avatar: social avatar, then metadata avatar, then empty.
pub fn resolve(profile: &Profile) -> Identity {
    let name = first_non_empty([
        &profile.social_handle,
        &profile.wallet_address,
        &profile.metadata_name,
    ]);
    let image = first_non_empty([&profile.social_avatar, &profile.metadata_avatar]);

    let mut aliases: Vec<String> = Vec::new();
    let known = non_empty([&profile.social_handle, &profile.wallet_address]);
    for alias in std::iter::once(name.as_str()).chain(known) {
        if !alias.is_empty() && !aliases.iter().any(|a| a == alias) {
            aliases.push(alias.to_string());
        }
    }

    Identity::Present {
        name,
        image,
        aliases,
    }
}

/// `None` (no session) maps to `Absent`.
pub fn resolve_session(profile: Option<&Profile>) -> Identity {
    profile.map(resolve).unwrap_or_default()
}
