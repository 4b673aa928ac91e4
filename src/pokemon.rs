// pokemon.rs
// Wire types for the PokéAPI responses and the domain records built from them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NamedAPIResource {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// Response of `GET /pokemon?limit=&offset=`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub count: u32,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<NamedAPIResource>,
}

/// Response of `GET /pokemon/{name}`, trimmed to what the detail view reads.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Pokemon {
    #[serde(default)]
    pub id: u32,
    pub name: String,
    pub height: u32,
    pub weight: u32,
    pub stats: Vec<PokemonStat>,
    pub types: Vec<PokemonType>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PokemonStat {
    pub base_stat: u32,
    #[serde(default)]
    pub effort: u32,
    pub stat: NamedAPIResource,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PokemonType {
    #[serde(default)]
    pub slot: u32,
    pub r#type: NamedAPIResource,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PokedexListEntry {
    pub name: String,
    pub image_url: String,
    pub pokedex_number: u32,
}

impl PokedexListEntry {
    pub fn new(name: &str, sprite_base: &str, pokedex_number: u32) -> Self {
        Self {
            name: display_name(name),
            image_url: sprite_url(sprite_base, pokedex_number),
            pokedex_number,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PokemonDetail {
    pub name: String,
    /// Decimetres, as reported by the API.
    pub height: u32,
    /// Hectograms, as reported by the API.
    pub weight: u32,
    pub stats: Vec<StatValue>,
    pub types: Vec<TypeName>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StatValue {
    pub stat_name: String,
    pub base_value: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TypeName {
    pub type_name: String,
}

impl From<Pokemon> for PokemonDetail {
    fn from(pokemon: Pokemon) -> Self {
        Self {
            name: pokemon.name,
            height: pokemon.height,
            weight: pokemon.weight,
            stats: pokemon
                .stats
                .into_iter()
                .map(|s| StatValue {
                    stat_name: s.stat.name,
                    base_value: s.base_stat,
                })
                .collect(),
            types: pokemon
                .types
                .into_iter()
                .map(|t| TypeName {
                    type_name: t.r#type.name,
                })
                .collect(),
        }
    }
}

impl PokemonDetail {
    pub fn height_meters(&self) -> f32 {
        self.height as f32 / 10.0
    }

    pub fn weight_kilograms(&self) -> f32 {
        self.weight as f32 / 10.0
    }

    /// Largest base stat, used to scale stat bars.
    pub fn max_base_stat(&self) -> u32 {
        self.stats.iter().map(|s| s.base_value).max().unwrap_or(0)
    }
}

pub fn sprite_url(sprite_base: &str, pokedex_number: u32) -> String {
    format!("{}/{}.png", sprite_base.trim_end_matches('/'), pokedex_number)
}

/// Upper-cases the first character: `"bulbasaur"` -> `"Bulbasaur"`.
pub fn display_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Trailing numeric id of a resource url such as `.../pokemon/25/`.
pub fn pokedex_number_from_url(url: &str) -> Option<u32> {
    let trimmed = url.trim_end_matches('/');
    let digits_start = trimmed
        .rfind(|c: char| !c.is_ascii_digit())
        .map(|i| i + 1)
        .unwrap_or(0);
    trimmed[digits_start..].parse().ok()
}

pub fn stat_abbreviation(stat_name: &str) -> &'static str {
    match stat_name.to_lowercase().as_str() {
        "hp" => "HP",
        "attack" => "Atk",
        "defense" => "Def",
        "special-attack" => "SpAtk",
        "special-defense" => "SpDef",
        "speed" => "Spd",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIKACHU: &str = r#"{
        "id": 25,
        "name": "pikachu",
        "height": 4,
        "weight": 60,
        "base_experience": 112,
        "stats": [
            {"base_stat": 35, "effort": 0, "stat": {"name": "hp", "url": "https://pokeapi.co/api/v2/stat/1/"}},
            {"base_stat": 90, "effort": 2, "stat": {"name": "speed", "url": "https://pokeapi.co/api/v2/stat/6/"}}
        ],
        "types": [
            {"slot": 1, "type": {"name": "electric", "url": "https://pokeapi.co/api/v2/type/13/"}}
        ]
    }"#;

    #[test]
    fn test_detail_from_api_response() {
        let pokemon: Pokemon = serde_json::from_str(PIKACHU).unwrap();
        let detail = PokemonDetail::from(pokemon);

        assert_eq!(detail.name, "pikachu");
        assert_eq!(detail.stats.len(), 2);
        assert_eq!(detail.stats[1].stat_name, "speed");
        assert_eq!(detail.stats[1].base_value, 90);
        assert_eq!(detail.types[0].type_name, "electric");
        assert_eq!(detail.max_base_stat(), 90);
        assert!((detail.height_meters() - 0.4).abs() < f32::EPSILON);
        assert!((detail.weight_kilograms() - 6.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_detail_missing_field_fails() {
        let broken = r#"{"name": "pikachu", "height": 4}"#;
        assert!(serde_json::from_str::<Pokemon>(broken).is_err());
    }

    #[test]
    fn test_page_response_without_links() {
        let page: PageResponse = serde_json::from_str(
            r#"{"count": 1302, "results": [{"name": "bulbasaur", "url": "https://pokeapi.co/api/v2/pokemon/1/"}]}"#,
        )
        .unwrap();
        assert_eq!(page.count, 1302);
        assert!(page.next.is_none());
        assert_eq!(page.results[0].name, "bulbasaur");
    }

    #[test]
    fn test_entry_construction() {
        let entry = PokedexListEntry::new("charmander", "https://img.example/art/", 4);
        assert_eq!(entry.name, "Charmander");
        assert_eq!(entry.image_url, "https://img.example/art/4.png");
        assert_eq!(entry.pokedex_number, 4);
    }

    #[test]
    fn test_number_from_url() {
        assert_eq!(pokedex_number_from_url("https://pokeapi.co/api/v2/pokemon/25/"), Some(25));
        assert_eq!(pokedex_number_from_url("https://pokeapi.co/api/v2/pokemon/151"), Some(151));
        assert_eq!(pokedex_number_from_url("https://pokeapi.co/api/v2/pokemon/"), None);
        assert_eq!(pokedex_number_from_url(""), None);
    }

    #[test]
    fn test_stat_abbreviations() {
        assert_eq!(stat_abbreviation("special-attack"), "SpAtk");
        assert_eq!(stat_abbreviation("HP"), "HP");
        assert_eq!(stat_abbreviation("accuracy"), "");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("squirtle"), "Squirtle");
        assert_eq!(display_name(""), "");
    }
}
