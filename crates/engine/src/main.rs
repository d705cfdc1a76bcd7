use stockflow_engine::{StockEngine, seed};

fn main() -> anyhow::Result<()> {
    stockflow_observability::init();

    let engine = StockEngine::from_env();
    tracing::info!(config = ?engine.config(), "seeding demo data");

    let report = seed::run(&engine)?;
    tracing::info!(
        documents = report.documents.len(),
        moves = report.moves.len(),
        "seed complete"
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
