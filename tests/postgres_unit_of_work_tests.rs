//! Unit-of-work behaviour against PostgreSQL, where a failed statement aborts
//! the enclosing transaction. Runs only when `RENTAL_TEST_DATABASE_URL` points
//! at a disposable Postgres database; all fixture data is rolled back.

use migration::{Migrator, MigratorTrait};
use rental_management::{
    auth::Caller,
    models::{MaintenanceRequest, asset},
    roles::Role,
    workflow::{
        MaintenanceRequestWorkflow, SubmitOutcome,
        maintenance::{CreateRequestForm, FORM_ERROR_KEY, SAVE_FAILED_MESSAGE},
    },
};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, EntityTrait, PaginatorTrait, Set,
    TransactionTrait,
};
use uuid::Uuid;

const DATABASE_URL_VAR: &str = "RENTAL_TEST_DATABASE_URL";

#[tokio::test]
async fn rejected_insert_redisplays_and_keeps_transaction_usable() -> anyhow::Result<()> {
    let Ok(url) = std::env::var(DATABASE_URL_VAR) else {
        eprintln!("{DATABASE_URL_VAR} not set; skipping");
        return Ok(());
    };
    let db = Database::connect(&url).await?;
    Migrator::up(&db, None).await?;

    let txn = db.begin().await?;
    let asset = asset::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Unit A".to_string()),
    }
    .insert(&txn)
    .await?;

    let suffix = Uuid::new_v4().simple().to_string();
    txn.execute_unprepared(&format!(
        "CREATE FUNCTION reject_request_{suffix}() RETURNS trigger AS $$ \
         BEGIN RAISE EXCEPTION 'maintenance requests are read-only'; END; \
         $$ LANGUAGE plpgsql"
    ))
    .await?;
    txn.execute_unprepared(&format!(
        "CREATE TRIGGER reject_request_{suffix} BEFORE INSERT ON maintenance_requests \
         FOR EACH ROW EXECUTE FUNCTION reject_request_{suffix}()"
    ))
    .await?;

    let caller = Caller {
        user_id: Uuid::new_v4(),
        role: Role::Staff,
    };
    let form = CreateRequestForm {
        subject: "Leak".to_string(),
        request_detail: "Drip".to_string(),
        asset: None,
        select_asset: Some(asset.id.to_string()),
    };
    let outcome = MaintenanceRequestWorkflow::new(&txn, caller)
        .create(form.clone())
        .await?;

    let SubmitOutcome::Redisplay(page) = outcome else {
        panic!("expected redisplay");
    };
    assert_eq!(page.model.form, form);
    assert!(page.model.assets.iter().any(|option| option.value == asset.id));
    assert_eq!(
        page.errors.get(FORM_ERROR_KEY),
        Some(&[SAVE_FAILED_MESSAGE.to_string()][..])
    );

    // Still usable after the rejected write
    MaintenanceRequest::find().count(&txn).await?;
    txn.rollback().await?;
    Ok(())
}
