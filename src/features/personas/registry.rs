//! # Feature: Persona Registry
//!
//! Literary personas the user can talk to. The built-in table holds three Korean
//! poets (Yun Dong-ju, Kim So-wol, Han Yong-un); each system prompt is loaded
//! from prompt/*.md at compile time. Additional personas can be supplied in a
//! YAML file at startup.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: YAML persona files can add or replace personas
//! - 1.0.0: Initial release with the three built-in poets

use crate::core::error::{ConfigurationError, UnknownPersonaKind};
use log::info;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Longest persona id accepted from a persona file
const MAX_ID_LEN: usize = 32;

/// Accent colour used when a persona file does not set one
const DEFAULT_COLOR: u32 = 0x95A5A6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    /// Display name shown in the selector and the header
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub system_prompt: String,
    /// Opening assistant message shown when the conversation starts
    pub greeting: String,
    /// Accent colour (0xRRGGBB)
    #[serde(default = "default_color")]
    pub color: u32,
}

fn default_color() -> u32 {
    DEFAULT_COLOR
}

struct BuiltinPersona {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    system_prompt: &'static str,
    greeting: &'static str,
    color: u32,
}

const BUILTIN_PERSONAS: &[BuiltinPersona] = &[
    BuiltinPersona {
        id: "yun-dongju",
        name: "윤동주",
        description: "A shy young poet in 1941 Gyeongseong who finds beauty under the stars",
        system_prompt: include_str!("../../../prompt/yun_dongju.md"),
        greeting: "안녕하세요. 오늘따라 밤바람이 차네요. 당신도 잠 못 이루고 있나요?",
        color: 0x3B5BA5, // Starlit night blue
    },
    BuiltinPersona {
        id: "kim-sowol",
        name: "김소월",
        description: "A 1920s romantic who sings of parting and longing in folk-song rhythm",
        system_prompt: include_str!("../../../prompt/kim_sowol.md"),
        greeting: "그립다 말을 할까 하니 그리워지는 밤입니다. 무슨 일로 저를 찾으셨나요?",
        color: 0xE75480, // Azalea pink
    },
    BuiltinPersona {
        id: "han-yongun",
        name: "한용운",
        description: "A monk and independence activist who speaks of the silent beloved",
        system_prompt: include_str!("../../../prompt/han_yongun.md"),
        greeting: "어서 오십시오. 기다리고 있었습니다. 당신의 '님'은 어디에 있습니까?",
        color: 0x8E6E3B, // Temple robe ochre
    },
];

/// Root of a persona YAML file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PersonaFile {
    pub personas: Vec<Persona>,
}

impl PersonaFile {
    pub fn validate(&self) -> Result<(), String> {
        let id_pattern = Regex::new(r"^[a-z][a-z0-9_-]*$").map_err(|e| e.to_string())?;
        let mut seen = HashSet::new();

        for persona in &self.personas {
            if !id_pattern.is_match(&persona.id) {
                return Err(format!(
                    "persona id must be lowercase letters, digits, '-' or '_': {}",
                    persona.id
                ));
            }
            if persona.id.len() > MAX_ID_LEN {
                return Err(format!(
                    "persona id too long (max {MAX_ID_LEN} chars): {}",
                    persona.id
                ));
            }
            if !seen.insert(persona.id.as_str()) {
                return Err(format!("duplicate persona id: {}", persona.id));
            }
            if persona.name.trim().is_empty() {
                return Err(format!("persona {} has no name", persona.id));
            }
            if persona.system_prompt.trim().is_empty() {
                return Err(format!("persona {} has no system_prompt", persona.id));
            }
            if persona.greeting.trim().is_empty() {
                return Err(format!("persona {} has no greeting", persona.id));
            }
        }
        Ok(())
    }
}

/// Read-only persona table, in selector order.
#[derive(Debug, Clone)]
pub struct PersonaRegistry {
    personas: HashMap<String, Persona>,
    order: Vec<String>,
}

impl Default for PersonaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PersonaRegistry {
    /// Registry holding only the compiled-in personas
    pub fn builtin() -> Self {
        let mut registry = PersonaRegistry {
            personas: HashMap::new(),
            order: Vec::new(),
        };

        for p in BUILTIN_PERSONAS {
            registry.insert(Persona {
                id: p.id.to_string(),
                name: p.name.to_string(),
                description: p.description.to_string(),
                system_prompt: p.system_prompt.trim_end().to_string(),
                greeting: p.greeting.to_string(),
                color: p.color,
            });
        }

        registry
    }

    /// Built-in personas plus those defined in `path`
    pub fn load_file(path: &Path) -> Result<Self, ConfigurationError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigurationError::PersonaFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut registry = Self::builtin();
        let added = registry
            .extend_from_yaml(&contents)
            .map_err(|reason| ConfigurationError::PersonaFile {
                path: path.to_path_buf(),
                reason,
            })?;
        info!("Loaded {added} persona(s) from {}", path.display());
        Ok(registry)
    }

    /// Add personas from a YAML document. A matching id replaces the existing
    /// persona in place. Returns how many personas the document defined.
    pub fn extend_from_yaml(&mut self, yaml: &str) -> Result<usize, String> {
        let file: PersonaFile = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;
        file.validate()?;

        let count = file.personas.len();
        for persona in file.personas {
            self.insert(persona);
        }
        Ok(count)
    }

    fn insert(&mut self, persona: Persona) {
        if !self.personas.contains_key(&persona.id) {
            self.order.push(persona.id.clone());
        }
        self.personas.insert(persona.id.clone(), persona);
    }

    pub fn get_persona(&self, id: &str) -> Result<&Persona, UnknownPersonaKind> {
        self.personas
            .get(id)
            .ok_or_else(|| UnknownPersonaKind(id.to_string()))
    }

    /// Persona ids in selector order
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn list_personas(&self) -> Vec<&Persona> {
        self.order
            .iter()
            .filter_map(|id| self.personas.get(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
