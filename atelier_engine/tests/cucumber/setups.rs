use atelier_engine::{
    db_types::{Role, UserId},
    test_utils::seed::{seed_profile, seed_rating_aggregate},
};
use cucumber::given;

use crate::cucumber::{market_world::MarketSystem, MarketWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut MarketWorld) {
    let system = MarketSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a {word} '{word}' named {string}")]
async fn registered_user(world: &mut MarketWorld, role: String, id: String, name: String) {
    let role = match role.as_str() {
        "customer" => Role::Customer,
        "merchant" => Role::Merchant,
        other => panic!("Unknown role: {other}"),
    };
    let profile = seed_profile(world.db(), &id, &name, role).await;
    assert_eq!(profile.id, UserId::from(id));
}

#[given(expr = "merchant '{word}' has a rating of {float} from {int} reviews")]
async fn merchant_rating(world: &mut MarketWorld, merchant: String, rating: f64, count: i64) {
    seed_rating_aggregate(world.db(), &merchant, rating, count).await;
}
