use crate::error::{WorldError, WorldResult};
use crate::world::position::Position;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct House {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub subowners: Vec<String>,
    #[serde(default)]
    pub guests: Vec<String>,
    #[serde(default)]
    pub fields: Vec<Position>,
}

impl House {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            owner: None,
            subowners: Vec::new(),
            guests: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Owner, subowners and guests may walk in. Names compare without case.
    pub fn grants(&self, name: &str) -> bool {
        if self
            .owner
            .as_deref()
            .map_or(false, |owner| owner.eq_ignore_ascii_case(name))
        {
            return true;
        }
        self.subowners
            .iter()
            .chain(self.guests.iter())
            .any(|entry| entry.eq_ignore_ascii_case(name))
    }
}

pub fn load_houses(path: &Path) -> WorldResult<Vec<House>> {
    let content = std::fs::read_to_string(path).map_err(|err| WorldError::io(path, err))?;
    parse_houses(&content)
}

pub fn parse_houses(content: &str) -> WorldResult<Vec<House>> {
    let houses: Vec<House> = serde_yaml::from_str(content)?;
    let mut seen = std::collections::HashSet::new();
    for house in &houses {
        if !seen.insert(house.id) {
            return Err(WorldError::Config(format!("duplicate house id {}", house.id)));
        }
    }
    Ok(houses)
}
