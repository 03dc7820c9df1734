use rand::Rng;
use serde::{Deserialize, Serialize};

use instantpick_db::models::{HistoryProvider, ModuleStore, MODULE_KIND};

use crate::payload::{build_picks_payload, PicksPayload};

/// Paramètres de la requête `getPicks`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AjaxRequest {
    pub module_id: i64,
    pub pick_method: String,
    pub lines: i64,
}

impl Default for AjaxRequest {
    fn default() -> Self {
        Self {
            module_id: 0,
            pick_method: "random".to_string(),
            lines: 5,
        }
    }
}

/// Réponse JSON : `{ok: true, meta, rules, picks, now, ajaxUrl}` ou `{ok: false, error}`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AjaxResponse {
    Success {
        ok: bool,
        #[serde(flatten)]
        payload: Box<PicksPayload>,
    },
    Failure {
        ok: bool,
        error: String,
    },
}

impl AjaxResponse {
    fn success(payload: PicksPayload) -> Self {
        AjaxResponse::Success { ok: true, payload: Box::new(payload) }
    }

    fn failure(error: &str) -> Self {
        AjaxResponse::Failure { ok: false, error: error.to_string() }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, AjaxResponse::Success { .. })
    }
}

/// Point d'entrée exposé par la couche web. Seuls un identifiant de module absent
/// ou un module introuvable produisent `ok: false`.
pub fn get_picks(
    store: &impl ModuleStore,
    provider: &impl HistoryProvider,
    request: &AjaxRequest,
    rng: &mut impl Rng,
) -> AjaxResponse {
    if request.module_id <= 0 {
        return AjaxResponse::failure("Missing module_id.");
    }

    let module = match store.load_module(request.module_id) {
        Ok(Some(module)) if module.module == MODULE_KIND => module,
        Ok(_) => return AjaxResponse::failure("Module not found."),
        Err(e) => {
            log::error!("Module {} lookup failed: {e:#}", request.module_id);
            return AjaxResponse::failure("Module lookup failed.");
        }
    };

    let params = module.params();
    let payload = build_picks_payload(&params, &request.pick_method, request.lines, provider, rng);
    AjaxResponse::success(payload)
}
