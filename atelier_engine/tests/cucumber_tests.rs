mod cucumber;

use ::cucumber::{codegen::LocalBoxFuture, event::ScenarioFinished, gherkin, writer, World};
use atelier_engine::{test_utils::prepare_env::drop_database, traits::MarketplaceDatabase};
use futures_util::FutureExt;
use log::*;
use tokio::runtime::Runtime;

use crate::cucumber::MarketWorld;

fn main() {
    dotenvy::from_filename(".env.test").ok();
    env_logger::init();
    let sys = Runtime::new().unwrap();
    sys.block_on(
        MarketWorld::cucumber()
            .with_writer(writer::Libtest::or_basic())
            .after(|_f, _r, scenario, ev, w| post_test_hook(scenario, ev, w))
            .run("tests/features"),
    );
    info!("🚀️ Tests complete");
}

fn post_test_hook<'a>(
    scenario: &'a gherkin::Scenario,
    ev: &'a ScenarioFinished,
    world: Option<&'a mut MarketWorld>,
) -> LocalBoxFuture<'a, ()> {
    let fut = async move {
        trace!("🚀️ After-scenario hook running for \"{}\"", scenario.name);
        let Some(MarketWorld { system: Some(sys), .. }) = world else {
            warn!("🚀️ World was not specified. Cannot clean up database.");
            return;
        };
        let db_path = sys.db_path.clone();
        match ev {
            ScenarioFinished::StepFailed(_, _, _) | ScenarioFinished::StepSkipped => {
                error!("🚀️ Error in scenario, database retained: {db_path}");
            },
            ScenarioFinished::StepPassed => {
                debug!("🚀️ Scenario complete, removing database: {db_path}");
                if let Err(e) = sys.orders.db_mut().close().await {
                    error!("🚀️ Failed to close database: {e}");
                }
                drop_database(&db_path).await;
            },
            _ => trace!("🚀️ Unhandled event: {ev:?}"),
        }
        trace!("🚀️ After-scenario hook complete");
    };
    fut.boxed_local()
}
