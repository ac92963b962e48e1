//! Named collections of the files-manager database.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, IntoStaticStr};

/// Collections whose sizes are reported by the stats endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumIter, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Collection {
    /// Registered users.
    Users,
    /// Uploaded files and folders.
    Files,
}

impl Collection {
    /// Returns the collection name as stored in the database.
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn collection_names() {
        assert_eq!(Collection::Users.name(), "users");
        assert_eq!(Collection::Files.name(), "files");
        assert_eq!(Collection::Files.to_string(), "files");
    }

    #[test]
    fn all_collections_listed() {
        let names: Vec<_> = Collection::iter().map(Collection::name).collect();
        assert_eq!(names, vec!["users", "files"]);
    }
}
