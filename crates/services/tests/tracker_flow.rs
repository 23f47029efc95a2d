use std::sync::Arc;

use services::{AppServices, Clock, Command, CommandOutcome, LogNotifier, ReminderOutcome};
use tracker_core::model::UnitDraft;
use tracker_core::progress::{Status, Summary, UnitFilter};
use tracker_core::reminder::ReminderSettings;
use tracker_core::state::TrackerState;
use tracker_core::time::fixed_now;

#[tokio::test]
async fn tracker_flow_create_toggle_edit_delete() {
    let services = AppServices::new_sqlite(
        "sqlite:file:memdb_tracker_flow?mode=memory&cache=shared",
        Clock::fixed(fixed_now()),
        Arc::new(LogNotifier),
        ReminderSettings::default(),
    )
    .await
    .expect("open services");
    let tracker = services.tracker();
    let mut state = TrackerState::new();

    let draft = UnitDraft::new("Math", "Algebra", ["Matrices", "Groups", "", "Rings"]);
    let CommandOutcome::UnitCreated(algebra) = tracker
        .dispatch(&mut state, Command::CreateUnit(draft))
        .await
        .expect("create unit")
    else {
        panic!("expected UnitCreated");
    };
    tracker
        .dispatch(
            &mut state,
            Command::CreateUnit(UnitDraft::new("Physics", "Optics", ["Lenses"])),
        )
        .await
        .expect("create second unit");

    for index in [0, 1] {
        tracker
            .dispatch(
                &mut state,
                Command::ToggleTopic {
                    unit_id: algebra,
                    topic_index: index,
                },
            )
            .await
            .expect("toggle");
    }
    assert_eq!(state.require(algebra).unwrap().covered(), 67);
    assert_eq!(state.require(algebra).unwrap().status(), Status::OnTrack);

    // A fresh load from disk sees the same progress.
    let mut reloaded = TrackerState::new();
    assert_eq!(tracker.refresh(&mut reloaded).await.unwrap(), 2);
    assert_eq!(reloaded.require(algebra).unwrap().covered(), 67);
    assert_eq!(reloaded.summary(), Summary::Average { units: 2, tenths: 335 });

    let mut draft = state.begin_edit(algebra).unwrap();
    draft.topics = vec!["Groups".into(), "Fields".into()];
    tracker
        .dispatch(&mut state, Command::EditUnit { unit_id: algebra, draft })
        .await
        .expect("edit");
    assert_eq!(state.require(algebra).unwrap().covered(), 50);

    state.set_filter(UnitFilter::all().with_subject("Math"));
    assert_eq!(state.summary().to_string(), "Avg Covered: 50.0%");

    tracker
        .dispatch(&mut state, Command::DeleteUnit(algebra))
        .await
        .expect("delete");
    assert_eq!(state.summary(), Summary::NoData);

    let mut reloaded = TrackerState::new();
    tracker.refresh(&mut reloaded).await.unwrap();
    assert_eq!(reloaded.units().len(), 1);
    assert_eq!(reloaded.units()[0].name(), "Optics");

    let outcome = services.reminders().check_once().await.unwrap();
    assert!(matches!(outcome, ReminderOutcome::Sent { .. }));
}
