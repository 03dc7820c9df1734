use serde::{Deserialize, Serialize};

use instantpick_db::models::ModuleParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickMethod {
    #[default]
    Random,
    HotCold,
    SkipHit,
}

impl PickMethod {
    /// Correspondance exacte ; toute autre valeur (casse, espaces) retombe sur `Random`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "hotcold" => PickMethod::HotCold,
            "skiphit" => PickMethod::SkipHit,
            _ => PickMethod::Random,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PickMethod::Random => "random",
            PickMethod::HotCold => "hotcold",
            PickMethod::SkipHit => "skiphit",
        }
    }
}

impl std::fmt::Display for PickMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Règles numériques d'un jeu, figées une fois pour toutes à la frontière.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRuleConfig {
    pub main_count: usize,
    pub main_min: u32,
    pub main_max: u32,
    pub extra_enabled: bool,
    pub extra_count: usize,
    pub extra_min: u32,
    pub extra_max: u32,
    pub extra_label: String,
    pub exclude_zero: bool,
}

impl GameRuleConfig {
    pub fn from_params(params: &ModuleParams) -> Self {
        let main_min = to_number(params.main_min);
        let main_max = to_number(params.main_max);
        Self {
            main_count: to_count(params.main_count),
            main_min,
            main_max,
            extra_enabled: params.extra_enabled == 1,
            extra_count: to_count(params.extra_count),
            extra_min: to_number(params.extra_min),
            extra_max: to_number(params.extra_max),
            extra_label: params.extra_label.clone(),
            exclude_zero: excludes_zero(params.main_min, params.main_max),
        }
    }

    pub fn draws_extras(&self) -> bool {
        self.extra_enabled && self.extra_count > 0
    }
}

/// Zéro n'est un numéro légal que pour les jeux à chiffres 0-9.
/// Évalué sur les bornes brutes, avant tout bornage à zéro.
pub fn excludes_zero(min: i64, max: i64) -> bool {
    !(min == 0 && max <= 9)
}

/// Bornes de lignes lues dans les paramètres ; si elles sont inversées, la borne basse l'emporte.
pub fn clamp_lines(requested: i64, min_lines: i64, max_lines: i64) -> usize {
    to_count(requested.min(max_lines).max(min_lines))
}

fn to_number(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

fn to_count(value: i64) -> usize {
    value.max(0) as usize
}
