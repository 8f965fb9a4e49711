//! Multi-engine advanced search.
//!
//! All four engines are queried in parallel through the meta-search API.
//! Engines fail independently: an error populates only that engine's `error`
//! field, and partial success is a valid terminal state. Only when no engine
//! produced anything does the whole response degrade to mock bundles.

use futures::future::join_all;

use xpoxial_core::{
    validate_query, AdvancedOutput, Engine, EngineResultBundle, EngineSearchApi, Result,
};

use crate::mock;

pub async fn advanced_search(api: &dyn EngineSearchApi, query: &str) -> Result<AdvancedOutput> {
    let query = validate_query(query)?;
    let calls = Engine::all().iter().map(|&engine| async move {
        let bundle = match api.engine_search(query, engine).await {
            Ok(bundle) => bundle,
            Err(e) => {
                tracing::warn!(target: "advanced", engine = %engine, error = %e, "engine failed");
                EngineResultBundle::failed(e.to_string())
            }
        };
        (engine.as_str().to_string(), bundle)
    });
    let out: AdvancedOutput = join_all(calls).await.into_iter().collect();

    if out.values().any(EngineResultBundle::has_results) {
        Ok(out)
    } else {
        tracing::info!(target: "advanced", "every engine empty or failed, using mock bundles");
        Ok(mock::mock_engine_bundles(query))
    }
}
