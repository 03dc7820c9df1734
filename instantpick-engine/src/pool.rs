use serde::Serialize;

/// Candidats ordonnés et distincts utilisés pour biaiser le tirage des numéros principaux.
#[derive(Debug, Clone, PartialEq)]
pub struct Pool {
    pub numbers: Vec<u32>,
    pub meta: PoolMeta,
}

/// Listes de tête exposées au client pour l'affichage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PoolMeta {
    #[serde(rename_all = "camelCase")]
    HotCold { hot_top: Vec<u32>, cold_top: Vec<u32> },
    #[serde(rename_all = "camelCase")]
    SkipHit { top_ranked: Vec<u32> },
}
