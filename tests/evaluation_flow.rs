mod common;

use common::{FakeTransport, client, evaluation_json};
use roster_terminal::api::{ApiError, Method, RequestBody};
use roster_terminal::evaluation::{Evaluation, SaveRequest};
use roster_terminal::evaluation_view::{EvaluationView, Mode, ViewError, ViewKey};
use roster_terminal::month::Month;
use roster_terminal::rating::{PLACEHOLDER, Rating, format_rating};
use roster_terminal::skills::Skill;

fn may_2024() -> Month {
    "2024-05".parse().unwrap()
}

fn key() -> ViewKey {
    ViewKey::new(7, may_2024())
}

fn record(ratings: &[(Skill, u8)]) -> Evaluation {
    serde_json::from_value(evaluation_json(41, 7, "2024-05", ratings)).unwrap()
}

fn empty_view() -> EvaluationView {
    let mut view = EvaluationView::new(key());
    assert!(view.apply_fetch(key(), Ok(None)));
    assert_eq!(view.mode(), Mode::NoEvaluation);
    view
}

fn viewing(ratings: &[(Skill, u8)]) -> EvaluationView {
    let mut view = EvaluationView::new(key());
    view.apply_fetch(key(), Ok(Some(record(ratings))));
    assert_eq!(view.mode(), Mode::Viewing);
    view
}

fn created_skills(request: &SaveRequest) -> &roster_terminal::skills::SkillRatings {
    match request {
        SaveRequest::Create(payload) => &payload.skills,
        other => panic!("expected a create request, got {other:?}"),
    }
}

#[test]
fn above_scale_draft_is_stored_as_five() {
    let mut view = empty_view();
    view.begin_create().unwrap();
    view.set_skill(Skill::BallControl, Some(6.0)).unwrap();
    let request = view.prepare_save().unwrap();
    assert_eq!(
        created_skills(&request).get(Skill::BallControl),
        Some(Rating::Excellent)
    );
}

#[test]
fn below_scale_draft_is_stored_as_one() {
    let mut view = empty_view();
    view.begin_create().unwrap();
    view.set_skill(Skill::Passing, Some(0.0)).unwrap();
    let request = view.prepare_save().unwrap();
    assert_eq!(created_skills(&request).get(Skill::Passing), Some(Rating::Bad));
}

#[test]
fn cleared_draft_is_stored_as_absent() {
    let mut view = empty_view();
    view.begin_create().unwrap();
    view.set_skill(Skill::Shooting, Some(3.0)).unwrap();
    view.set_skill(Skill::Shooting, None).unwrap();
    let request = view.prepare_save().unwrap();
    assert_eq!(created_skills(&request).get(Skill::Shooting), None);
    assert_eq!(format_rating(None), PLACEHOLDER);
    assert_eq!(view.skill_line(Skill::Shooting), PLACEHOLDER);
}

#[test]
fn average_label_rounds_to_the_nearest_rating() {
    let mut eval = record(&[(Skill::Passing, 4)]);
    eval.average_rating = Some(3.6);
    let mut view = EvaluationView::new(key());
    view.apply_fetch(key(), Ok(Some(eval)));
    assert_eq!(view.average_label(), "Very Good (3.60)");
}

#[test]
fn create_payload_has_the_wire_shape() {
    let mut view = empty_view();
    view.begin_create().unwrap();
    view.set_skill(Skill::Teamwork, Some(4.0)).unwrap();
    view.set_notes("  Keeps improving  ").unwrap();
    let SaveRequest::Create(payload) = view.prepare_save().unwrap() else {
        panic!("expected a create request");
    };
    let body = serde_json::to_value(&payload).unwrap();
    assert_eq!(body["player"], 7);
    assert_eq!(body["evaluated_at"], "2024-05-01");
    assert_eq!(body["teamwork"], 4);
    assert!(body["passing"].is_null());
    assert_eq!(body["notes"], "Keeps improving");
    let skill_keys = Skill::ALL
        .iter()
        .filter(|s| body.get(s.key()).is_some())
        .count();
    assert_eq!(skill_keys, 18);
    assert!(body.get("average_rating").is_none());
}

#[test]
fn network_failure_keeps_the_edit_open() {
    let fake = FakeTransport::new();
    fake.unreachable(Method::Post, "/api/evaluations/");
    let client = client(&fake);

    let mut view = empty_view();
    view.begin_create().unwrap();
    view.set_skill(Skill::Speed, Some(4.0)).unwrap();
    view.set_skill(Skill::Agility, Some(7.0)).unwrap();

    let err = view.save(&client).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(view.mode(), Mode::Creating);
    assert!(!view.is_saving());
    assert_eq!(view.error(), Some("Network error: could not reach the server"));
    let draft = view.draft().expect("draft survives the failure");
    assert_eq!(draft.skills.get(Skill::Speed), Some(4.0));
    assert_eq!(draft.skills.get(Skill::Agility), Some(7.0));
    assert_eq!(view.confirmed(), None);
}

#[test]
fn rejected_save_surfaces_the_server_message() {
    let fake = FakeTransport::new();
    fake.on(
        Method::Patch,
        "/api/evaluations/41/",
        400,
        r#"{"notes": ["Ensure this field has no more than 500 characters."]}"#,
    );
    let client = client(&fake);

    let mut view = viewing(&[(Skill::Passing, 3)]);
    view.begin_edit_notes().unwrap();
    view.set_notes("x".repeat(600)).unwrap();
    view.save(&client).unwrap_err();
    assert_eq!(view.mode(), Mode::EditingNotes);
    assert_eq!(
        view.error(),
        Some("notes: Ensure this field has no more than 500 characters.")
    );
    assert_eq!(view.draft().map(|d| d.notes.len()), Some(600));
}

#[test]
fn saving_unchanged_values_twice_is_stable() {
    let ratings = [(Skill::Passing, 3), (Skill::Respect, 5)];
    let fake = FakeTransport::new();
    fake.on_json(
        Method::Patch,
        "/api/evaluations/41/",
        &evaluation_json(41, 7, "2024-05", &ratings),
    );
    let client = client(&fake);

    let mut view = viewing(&ratings);
    view.begin_edit_skills().unwrap();
    view.save(&client).unwrap();
    let first = view.confirmed().cloned();

    view.begin_edit_skills().unwrap();
    view.save(&client).unwrap();
    assert_eq!(view.confirmed().cloned(), first);
    assert_eq!(view.mode(), Mode::Viewing);

    let sent = fake.sent_to(Method::Patch, "/api/evaluations/41/");
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].body, sent[1].body);
    let RequestBody::Json(body) = &sent[0].body else {
        panic!("skills update is JSON");
    };
    assert_eq!(body["passing"], 3);
    assert_eq!(body["notes"], "Works hard");
}

#[test]
fn notes_edit_only_sends_notes() {
    let fake = FakeTransport::new();
    fake.on_json(
        Method::Patch,
        "/api/evaluations/41/",
        &evaluation_json(41, 7, "2024-05", &[(Skill::Passing, 3)]),
    );
    let client = client(&fake);

    let mut view = viewing(&[(Skill::Passing, 3)]);
    view.begin_edit_notes().unwrap();
    view.set_notes(" Better first touch ").unwrap();
    view.save(&client).unwrap();

    let sent = fake.sent_to(Method::Patch, "/api/evaluations/41/");
    let RequestBody::Json(body) = &sent[0].body else {
        panic!("notes update is JSON");
    };
    assert_eq!(body, &serde_json::json!({ "notes": "Better first touch" }));
}

#[test]
fn edits_are_guarded_by_mode() {
    let mut view = EvaluationView::new(key());
    assert_eq!(view.begin_create(), Err(ViewError::Loading));

    let mut view_empty = empty_view();
    assert_eq!(view_empty.begin_edit_skills(), Err(ViewError::NoEvaluation));
    assert_eq!(
        view_empty.set_skill(Skill::Speed, Some(3.0)),
        Err(ViewError::NotEditing)
    );

    view = viewing(&[(Skill::Speed, 2)]);
    assert_eq!(view.begin_create(), Err(ViewError::AlreadyExists));
    view.begin_edit_skills().unwrap();
    assert_eq!(view.begin_edit_notes(), Err(ViewError::Busy));
    assert_eq!(view.set_notes("nope"), Err(ViewError::NotEditing));

    view.prepare_save().unwrap();
    assert_eq!(view.prepare_save(), Err(ViewError::SaveInFlight));
    assert_eq!(view.cancel(), Err(ViewError::SaveInFlight));
}

#[test]
fn cancel_discards_the_draft() {
    let mut view = viewing(&[(Skill::Speed, 2)]);
    view.begin_edit_skills().unwrap();
    view.set_skill(Skill::Speed, Some(5.0)).unwrap();
    assert_eq!(view.skill_line(Skill::Speed), "5 (Excellent)");
    view.cancel().unwrap();
    assert_eq!(view.mode(), Mode::Viewing);
    assert_eq!(view.skill_line(Skill::Speed), "2 (Not bad)");

    let mut view = empty_view();
    view.begin_create().unwrap();
    view.cancel().unwrap();
    assert_eq!(view.mode(), Mode::NoEvaluation);
    assert!(view.draft().is_none());
}

#[test]
fn stale_fetch_does_not_touch_the_current_month() {
    let mut view = viewing(&[(Skill::Speed, 2)]);
    let june = ViewKey::new(7, may_2024().next());
    view.set_key(june);
    assert_eq!(view.mode(), Mode::Loading);

    assert!(!view.apply_fetch(key(), Ok(Some(record(&[(Skill::Speed, 4)])))));
    assert_eq!(view.mode(), Mode::Loading);
    assert!(view.confirmed().is_none());

    assert!(view.apply_fetch(june, Ok(None)));
    assert_eq!(view.mode(), Mode::NoEvaluation);
}

#[test]
fn refetch_during_edit_keeps_the_draft() {
    let mut view = viewing(&[(Skill::Speed, 2)]);
    view.begin_edit_skills().unwrap();
    view.set_skill(Skill::Speed, Some(4.0)).unwrap();

    view.apply_fetch(key(), Ok(Some(record(&[(Skill::Speed, 3)]))));
    assert_eq!(view.mode(), Mode::EditingSkills);
    assert_eq!(view.skill_value(Skill::Speed), Some(4.0));
    assert_eq!(
        view.confirmed().and_then(|e| e.skills.get(Skill::Speed)),
        Some(Rating::Good)
    );
}

#[test]
fn failed_fetch_keeps_confirmed_values() {
    let mut view = viewing(&[(Skill::Speed, 2)]);
    view.apply_fetch(key(), Err(ApiError::Transport("timeout".to_string())));
    assert_eq!(view.mode(), Mode::Viewing);
    assert_eq!(view.skill_line(Skill::Speed), "2 (Not bad)");
    assert_eq!(view.error(), Some("Network error: could not reach the server"));
}

#[test]
fn edits_are_refused_while_a_save_is_in_flight() {
    let mut view = empty_view();
    view.begin_create().unwrap();
    view.set_skill(Skill::Passing, Some(3.0)).unwrap();
    let request = view.prepare_save().unwrap();
    assert_eq!(created_skills(&request).get(Skill::Passing), Some(Rating::Good));

    assert_eq!(
        view.set_skill(Skill::Shooting, Some(4.0)),
        Err(ViewError::SaveInFlight)
    );
    assert_eq!(view.set_notes("late note"), Err(ViewError::SaveInFlight));
    let draft = view.draft().expect("draft kept while saving");
    assert_eq!(draft.skills.get(Skill::Shooting), None);
    assert_eq!(draft.notes, "");

    assert!(view.finish_save(key(), Ok(record(&[(Skill::Passing, 3)]))));
    assert_eq!(view.mode(), Mode::Viewing);
    assert_eq!(view.skill_line(Skill::Shooting), PLACEHOLDER);
}

#[test]
fn edits_resume_after_a_failed_save() {
    let mut view = empty_view();
    view.begin_create().unwrap();
    view.set_skill(Skill::Passing, Some(3.0)).unwrap();
    view.prepare_save().unwrap();
    view.finish_save(key(), Err(ApiError::Transport("reset".to_string())));

    view.set_skill(Skill::Shooting, Some(4.0)).unwrap();
    let request = view.prepare_save().unwrap();
    assert_eq!(created_skills(&request).get(Skill::Shooting), Some(Rating::VeryGood));
}

#[test]
fn record_arriving_during_create_blocks_a_duplicate() {
    let fake = FakeTransport::new();
    let client = client(&fake);

    let mut view = empty_view();
    view.begin_create().unwrap();
    view.set_skill(Skill::Speed, Some(4.0)).unwrap();
    assert!(view.apply_fetch(key(), Ok(Some(record(&[(Skill::Speed, 2)])))));

    assert_eq!(view.mode(), Mode::Creating);
    assert_eq!(view.error(), Some("an evaluation already exists for this month"));
    assert_eq!(view.prepare_save(), Err(ViewError::AlreadyExists));
    assert!(view.save(&client).is_err());
    assert!(fake.sent().is_empty());

    view.cancel().unwrap();
    assert_eq!(view.mode(), Mode::Viewing);
    assert_eq!(view.skill_line(Skill::Speed), "2 (Not bad)");
}
