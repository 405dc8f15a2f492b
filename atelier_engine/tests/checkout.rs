use atelier_engine::{
    db_types::{NewCatalogItem, Role, Rupiah, UserId},
    test_utils::{prepare_env::fresh_database, seed::seed_profile},
    traits::{collaborators::FlatRateQuoter, ProfileManagement},
    CheckoutApi,
    CheckoutRequest,
    MarketError,
    SqliteDatabase,
};

async fn setup() -> (CheckoutApi<SqliteDatabase, FlatRateQuoter>, String) {
    let db = fresh_database().await;
    seed_profile(&db, "sari", "Sari", Role::Customer).await;
    seed_profile(&db, "rina", "Rina", Role::Merchant).await;
    let kebaya = NewCatalogItem {
        title: "Kebaya Modern".into(),
        image_url: "https://img.example/kebaya.jpg".into(),
        description: "Brokat, furing satin".into(),
        price: Some(Rupiah::from(450_000)),
    };
    let catalog = db.replace_catalog(&UserId::from("rina"), vec![kebaya]).await.unwrap();
    let item_id = catalog[0].id.clone();
    (CheckoutApi::new(db, FlatRateQuoter), item_id)
}

fn request(item_id: &str, payment_method: &str, proof: Option<&str>) -> CheckoutRequest {
    CheckoutRequest {
        merchant_id: UserId::from("rina"),
        item_id: item_id.to_string(),
        courier: Some("jne".into()),
        service: Some("REG".into()),
        address: "Jl. Mawar 12".into(),
        city: "Bandung".into(),
        payment_method: payment_method.into(),
        payment_proof_url: proof.map(String::from),
        ..Default::default()
    }
}

#[tokio::test]
async fn transfers_need_a_payment_proof() {
    let (checkout, item) = setup().await;
    let sari = UserId::from("sari");
    for proof in [None, Some("  ")] {
        let err = checkout.prepare_order(&sari, request(&item, "Transfer", proof)).await.unwrap_err();
        assert!(matches!(err, MarketError::MissingField("payment_proof_url")), "{err:?}");
    }
    let err = checkout.prepare_order(&sari, request(&item, "E-Wallet", None)).await.unwrap_err();
    assert!(matches!(err, MarketError::MissingField("payment_proof_url")), "{err:?}");

    let order = checkout
        .prepare_order(&sari, request(&item, "Transfer", Some("https://img.example/bukti.jpg")))
        .await
        .unwrap();
    assert_eq!(order.payment_proof_url.as_deref(), Some("https://img.example/bukti.jpg"));
    assert_eq!(order.price, Rupiah::from(472_000));
    assert_eq!(order.shipping_method, "JNE - REG");
    assert_eq!(order.shipping_address, "Jl. Mawar 12, Bandung");
}

#[tokio::test]
async fn cash_on_delivery_needs_no_proof() {
    let (checkout, item) = setup().await;
    let order = checkout.prepare_order(&UserId::from("sari"), request(&item, "COD", None)).await.unwrap();
    assert_eq!(order.payment_method, "COD");
    assert!(order.payment_proof_url.is_none());
    assert_eq!(order.design_name, "Kebaya Modern");
}

#[tokio::test]
async fn pick_up_is_free_and_half_a_courier_choice_is_refused() {
    let (checkout, item) = setup().await;
    let sari = UserId::from("sari");
    let pick_up = CheckoutRequest { courier: None, service: None, ..request(&item, "COD", None) };
    let order = checkout.prepare_order(&sari, pick_up).await.unwrap();
    assert_eq!(order.shipping_method, "Pick Up");
    assert_eq!(order.price, Rupiah::from(450_000));

    let no_service = CheckoutRequest { service: None, ..request(&item, "COD", None) };
    let err = checkout.prepare_order(&sari, no_service).await.unwrap_err();
    assert!(matches!(err, MarketError::MissingField("service")), "{err:?}");
    let err = checkout.prepare_order(&sari, request("nope", "COD", None)).await.unwrap_err();
    assert!(matches!(err, MarketError::NotFound(_)), "{err:?}");
}
