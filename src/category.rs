use std::collections::HashMap;

/// Static metadata for a command category: display name, emoji and the
/// image shown when the help surface focuses on the category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryMeta {
    pub name: &'static str,
    pub emoji: &'static str,
    pub image: &'static str,
    pub enabled: bool,
}

pub static CATEGORIES: &[CategoryMeta] = &[
    CategoryMeta {
        name: "Admin",
        emoji: "⚙️",
        image: "https://icons.iconarchive.com/icons/dakirby309/simply-styled/256/Settings-icon.png",
        enabled: true,
    },
    CategoryMeta {
        name: "Information",
        emoji: "🪧",
        image: "https://icons.iconarchive.com/icons/graphicloads/100-flat/128/information-icon.png",
        enabled: true,
    },
    CategoryMeta {
        name: "Moderation",
        emoji: "🔨",
        image: "https://icons.iconarchive.com/icons/lawyerwordpress/law/128/Gavel-Law-icon.png",
        enabled: true,
    },
    CategoryMeta {
        name: "Owner",
        emoji: "🤴",
        image: "https://www.pinclipart.com/picdir/middle/531-5318253_web-designing-icon-png-clipart.png",
        enabled: true,
    },
    CategoryMeta {
        name: "Utility",
        emoji: "🛠",
        image: "https://icons.iconarchive.com/icons/blackvariant/button-ui-system-folders-alt/128/Utilities-icon.png",
        enabled: true,
    },
];

lazy_static::lazy_static! {
    static ref CATEGORY_INDEX: HashMap<&'static str, &'static CategoryMeta> =
        CATEGORIES.iter().map(|c| (c.name, c)).collect();
}

/// Look up category metadata by name (case-sensitive, matches the
/// `category` attribute on commands).
pub fn find(name: &str) -> Option<&'static CategoryMeta> {
    CATEGORY_INDEX.get(name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_category() {
        let owner = find("Owner").expect("Owner category exists");
        assert_eq!(owner.emoji, "🤴");
        assert!(owner.enabled);
    }

    #[test]
    fn test_lookup_unknown_category() {
        assert!(find("Gardening").is_none());
    }

    #[test]
    fn test_index_covers_all_categories() {
        for category in CATEGORIES {
            assert_eq!(find(category.name), Some(category));
        }
    }

    #[test]
    fn test_no_duplicate_names() {
        assert_eq!(CATEGORY_INDEX.len(), CATEGORIES.len());
    }
}
