mod common;

use std::fs;

use budget_manager::{
    core::{
        manager::Outcome,
        presentation::{item_unique_id, SinkEvent, OVERVIEW_UNIQUE_ID},
    },
    domain::ItemId,
    BudgetError,
};
use common::{activate, call, overview_total, registry_path, storage_path, temp_home};

#[test]
fn shared_rent_and_personal_subscription_split() {
    let home = temp_home();
    let mut manager = activate(&home);
    call(
        &mut manager,
        r#"{"service": "add_item", "data": {"name": "Rent", "amount": 9000}}"#,
    );
    call(
        &mut manager,
        r#"{"service": "add_item", "data": {"name": "Netflix", "amount": "129", "payer": "Christian"}}"#,
    );

    let overview = manager
        .with_sink(|sink| sink.overview().cloned())
        .unwrap()
        .expect("overview published");
    assert_eq!(overview.state, Some(9129.0));
    let totals = &overview.overview_attributes().unwrap().totals;
    assert_eq!(totals.get("Christian"), Some(4629.0));
    assert_eq!(totals.get("Yasmin"), Some(4500.0));

    let rent = &manager.store().items()[0];
    assert_eq!(rent.payer, "Begge");
}

#[test]
fn yearly_and_quarterly_items_are_normalized() {
    let home = temp_home();
    let mut manager = activate(&home);
    call(
        &mut manager,
        r#"{"service": "add_item", "data": {"name": "Insurance", "amount": 1200, "frequency": "yearly"}}"#,
    );
    call(
        &mut manager,
        r#"{"service": "add_item", "data": {"name": "Water", "amount": 600, "frequency": "Quarterly"}}"#,
    );
    assert_eq!(overview_total(&manager), 300.0);
}

#[test]
fn unknown_frequency_counts_as_monthly() {
    let home = temp_home();
    let mut manager = activate(&home);
    call(
        &mut manager,
        r#"{"service": "add_item", "data": {"name": "Gym", "amount": 250, "frequency": "weekly"}}"#,
    );
    assert_eq!(overview_total(&manager), 250.0);
    assert_eq!(manager.store().items()[0].frequency.as_str(), "weekly");
}

#[test]
fn update_by_name_touches_every_match() {
    let home = temp_home();
    let mut manager = activate(&home);
    for amount in [100, 200, 300] {
        call(
            &mut manager,
            &format!(r#"{{"service": "add_item", "data": {{"name": "Rent", "amount": {amount}}}}}"#),
        );
    }
    call(
        &mut manager,
        r#"{"service": "add_item", "data": {"name": "Power", "amount": 50}}"#,
    );

    let sent_before = manager.store().broadcaster().sent();
    call(
        &mut manager,
        r#"{"service": "update_item_by_name", "data": {"name": " rent ", "amount": 1000}}"#,
    );
    assert_eq!(manager.store().broadcaster().sent(), sent_before + 1);
    let rents: Vec<f64> = manager
        .store()
        .items()
        .iter()
        .filter(|item| item.name == "Rent")
        .map(|item| item.amount)
        .collect();
    assert_eq!(rents, vec![1000.0, 1000.0, 1000.0]);
    assert_eq!(overview_total(&manager), 3050.0);
}

#[test]
fn soft_failures_leave_state_and_file_untouched() {
    let home = temp_home();
    let mut manager = activate(&home);
    call(
        &mut manager,
        r#"{"service": "add_item", "data": {"name": "Rent", "amount": 9000}}"#,
    );
    let saved = fs::read_to_string(storage_path(&home)).unwrap();

    let outcome = call(
        &mut manager,
        r#"{"service": "update_item_by_name", "data": {"name": "Nothing", "amount": 1}}"#,
    );
    assert!(matches!(outcome, Outcome::Ignored(BudgetError::NoMatchingName(_))));

    let outcome = call(
        &mut manager,
        r#"{"service": "update_item_by_name", "data": {"name": "Rent"}}"#,
    );
    assert!(matches!(outcome, Outcome::Ignored(BudgetError::NoChanges(_))));

    let outcome = call(
        &mut manager,
        r#"{"service": "set_participants", "data": {"names": ["  ", ""]}}"#,
    );
    assert!(matches!(outcome, Outcome::Ignored(BudgetError::EmptyParticipants)));

    assert_eq!(fs::read_to_string(storage_path(&home)).unwrap(), saved);
    assert_eq!(manager.store().participants().len(), 2);
}

#[test]
fn three_participants_relabel_shared_items() {
    let home = temp_home();
    let mut manager = activate(&home);
    call(
        &mut manager,
        r#"{"service": "add_item", "data": {"name": "Rent", "amount": 9000}}"#,
    );
    call(
        &mut manager,
        r#"{"service": "set_participants", "data": {"names": ["Christian", "Yasmin", "Alex"]}}"#,
    );

    assert_eq!(manager.store().items()[0].payer, "Alle");
    let totals = manager
        .with_sink(|sink| {
            sink.overview()
                .and_then(|state| state.overview_attributes())
                .map(|attributes| attributes.totals.clone())
        })
        .unwrap()
        .unwrap();
    assert_eq!(totals.get("Alex"), Some(3000.0));
    assert_eq!(totals.get("Christian"), Some(3000.0));
}

#[test]
fn items_survive_a_restart() {
    let home = temp_home();
    let id = {
        let mut manager = activate(&home);
        call(
            &mut manager,
            r#"{"service": "add_item", "data": {"name": "Rent", "amount": 9000}}"#,
        );
        let id = manager.store().items()[0].id.clone();
        manager.unload().unwrap();
        id
    };

    let manager = activate(&home);
    assert_eq!(manager.store().items().len(), 1);
    let published = manager
        .with_sink(|sink| sink.get(&item_unique_id(&id)).map(|state| state.name.clone()))
        .unwrap();
    assert_eq!(published.as_deref(), Some("Budget – Rent"));
}

#[test]
fn orphaned_registry_records_are_removed_on_startup() {
    let home = temp_home();
    {
        let mut manager = activate(&home);
        call(
            &mut manager,
            r#"{"service": "add_item", "data": {"name": "Rent", "amount": 9000}}"#,
        );
        manager.unload().unwrap();
    }

    // Simulate an item deleted while the registry file was not updated.
    let mut records: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(registry_path(&home)).unwrap()).unwrap();
    records.push(serde_json::json!({
        "unique_id": "budget_item_stale",
        "name": "Budget – Old",
        "platform": "sensor"
    }));
    fs::write(registry_path(&home), serde_json::to_string(&records).unwrap()).unwrap();

    let manager = activate(&home);
    let (ids, removed_stale) = manager
        .with_sink(|sink| {
            let removed = sink
                .events()
                .contains(&SinkEvent::Unpublished("budget_item_stale".into()));
            (sink.registry().unique_ids(), removed)
        })
        .unwrap();
    assert!(removed_stale);
    assert!(!ids.contains(&"budget_item_stale".to_string()));
    assert!(ids.contains(&OVERVIEW_UNIQUE_ID.to_string()));
    assert_eq!(ids.len(), 2);

    let on_disk = fs::read_to_string(registry_path(&home)).unwrap();
    assert!(!on_disk.contains("budget_item_stale"));
}

#[test]
fn failed_save_keeps_state_and_skips_broadcast() {
    let home = temp_home();
    let mut manager = activate(&home);
    call(
        &mut manager,
        r#"{"service": "add_item", "data": {"name": "Rent", "amount": 9000}}"#,
    );
    let sent_before = manager.store().broadcaster().sent();

    // A directory in place of the staging file makes the next save fail.
    let mut blocker = storage_path(&home);
    blocker.set_extension("json.tmp");
    fs::create_dir_all(&blocker).unwrap();

    let command = budget_manager::core::Command::from_json(
        r#"{"service": "add_item", "data": {"name": "Power", "amount": 400}}"#,
    )
    .unwrap();
    let err = manager.handle(command).unwrap_err();
    assert!(matches!(err, BudgetError::Persistence(_)));
    assert_eq!(manager.store().items().len(), 1);
    assert_eq!(manager.store().broadcaster().sent(), sent_before);
    assert_eq!(overview_total(&manager), 9000.0);
}

#[test]
fn removing_unknown_id_is_ignored() {
    let home = temp_home();
    let mut manager = activate(&home);
    let outcome = call(
        &mut manager,
        r#"{"service": "remove_item", "data": {"id": "does-not-exist"}}"#,
    );
    assert!(matches!(outcome, Outcome::Ignored(BudgetError::ItemNotFound(_))));
    assert!(!storage_path(&home).exists());
    assert!(manager.store().item(&ItemId::from("does-not-exist")).is_none());
}

#[test]
fn non_numeric_amounts_never_reach_the_stored_document() {
    let home = temp_home();
    {
        let mut manager = activate(&home);
        call(
            &mut manager,
            r#"{"service": "add_item", "data": {"name": "Rent", "amount": 9000}}"#,
        );
        for raw in ["NaN", "inf", "Infinity"] {
            let json = format!(
                r#"{{"service": "add_item", "data": {{"name": "Broken", "amount": "{raw}"}}}}"#
            );
            let err = budget_manager::core::Command::from_json(&json).unwrap_err();
            assert!(err.is_soft(), "{raw}: {err:?}");
        }
        let outcome = call(
            &mut manager,
            r#"{"service": "update_item_by_name", "data": {"name": "Rent", "amount": "1000"}}"#,
        );
        assert!(matches!(outcome, Outcome::Applied));
        manager.unload().unwrap();
    }

    let stored = fs::read_to_string(storage_path(&home)).unwrap();
    assert!(!stored.contains("null"));

    let manager = activate(&home);
    assert_eq!(manager.store().items().len(), 1);
    assert_eq!(overview_total(&manager), 1000.0);
}
