//! Read-only registry of supported games and their character rosters.
//!
//! The catalog is built once at startup and passed explicitly to whatever
//! needs to validate routes; tests can build smaller rosters with
//! [`Catalog::new`].

use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub id: String,
    pub name: String,
    /// Display order.
    pub characters: Vec<String>,
}

impl Game {
    pub fn new(id: &str, name: &str, characters: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            characters: characters.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    games: Vec<Game>,
}

impl Catalog {
    pub fn new(games: Vec<Game>) -> Self {
        Self { games }
    }

    /// The rosters shipped with the application.
    pub fn builtin() -> Self {
        Self::new(vec![
            Game::new("mk1", "Mortal Kombat 1", MK1),
            Game::new("sf6", "Street Fighter 6", SF6),
            Game::new("2xko", "2XKO", TWO_XKO),
        ])
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn game(&self, game: &str) -> Option<&Game> {
        self.games.iter().find(|g| g.id == game)
    }

    /// Roster for `game`, or an empty slice when the game is unknown.
    pub fn characters_for(&self, game: &str) -> &[String] {
        self.game(game).map(|g| g.characters.as_slice()).unwrap_or(&[])
    }

    pub fn is_valid_game(&self, game: &str) -> bool {
        self.game(game).is_some()
    }

    pub fn is_valid_character(&self, game: &str, character: &str) -> bool {
        self.characters_for(game).iter().any(|c| c == character)
    }

    pub fn display_name(&self, game: &str) -> Option<&str> {
        self.game(game).map(|g| g.name.as_str())
    }
}

const MK1: &[&str] = &[
    "Scorpion", "Sub-Zero", "Liu Kang", "Raiden", "Kitana",
    "Mileena", "Kung Lao", "Johnny Cage", "Kenshi", "Smoke",
    "Rain", "Reptile", "Ashrah", "Havik", "Baraka",
    "Geras", "General Shao", "Reiko", "Tanya", "Li Mei",
    "Sindel", "Shang Tsung", "Quan Chi", "Ermac", "Takeda",
    "Omni-Man", "Peacemaker", "Homelander", "Ghostface", "Conan",
];

const SF6: &[&str] = &[
    "Ryu", "Ken", "Chun-Li", "Guile", "Blanka", "Dhalsim",
    "E. Honda", "Zangief", "Cammy", "Dee Jay", "Rashid",
    "Juri", "Kimberly", "Lily", "JP", "Marisa", "Manon",
    "Luke", "Jamie", "A.K.I.", "Ed", "Akuma", "Bison",
    "Terry", "Mai", "Elena",
];

const TWO_XKO: &[&str] = &["Ahri", "Braum", "Darius", "Ekko", "Illaoi", "Jinx", "Yasuo"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_roster_sizes() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.characters_for("mk1").len(), 30);
        assert_eq!(catalog.characters_for("sf6").len(), 26);
        assert_eq!(catalog.characters_for("2xko").len(), 7);
    }

    #[test]
    fn test_characters_for_keeps_order() {
        let catalog = Catalog::builtin();
        assert_eq!(
            catalog.characters_for("2xko"),
            ["Ahri", "Braum", "Darius", "Ekko", "Illaoi", "Jinx", "Yasuo"]
        );
        assert!(catalog.characters_for("unknown").is_empty());
    }

    #[test]
    fn test_membership_checks() {
        let catalog = Catalog::builtin();
        assert!(catalog.is_valid_game("sf6"));
        assert!(!catalog.is_valid_game("SF6"));
        assert!(catalog.is_valid_character("sf6", "A.K.I."));
        assert!(!catalog.is_valid_character("sf6", "Scorpion"));
        assert!(!catalog.is_valid_character("unknown", "Ryu"));
        assert_eq!(catalog.display_name("mk1"), Some("Mortal Kombat 1"));
        assert_eq!(catalog.display_name("tekken8"), None);
    }

    #[test]
    fn test_custom_catalog() {
        let catalog = Catalog::new(vec![Game::new("t8", "Tekken 8", &["Jin", "Kazuya"])]);
        assert_eq!(catalog.games().len(), 1);
        assert!(catalog.is_valid_character("t8", "Jin"));
        assert!(!catalog.is_valid_game("mk1"));
    }
}
