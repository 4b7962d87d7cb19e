mod common;

use common::read_fixture;
use roster_terminal::api::error_message;
use roster_terminal::evaluation::{parse_evaluation_json, parse_evaluation_list_json};
use roster_terminal::month::Month;
use roster_terminal::rating::Rating;
use roster_terminal::roster::{Feet, Group, Player};
use roster_terminal::skills::Skill;

#[test]
fn parses_evaluation_list_fixture() {
    let raw = read_fixture("evaluation_list.json");
    let eval = parse_evaluation_list_json(&raw)
        .expect("fixture should parse")
        .expect("list is not empty");
    assert_eq!(eval.id, 41);
    assert_eq!(eval.player, Some(7));
    assert_eq!(eval.evaluated_at, Month::new(2024, 5));
    assert_eq!(eval.skills.get(Skill::Dribbling), Some(Rating::Excellent));
    assert_eq!(eval.skills.get(Skill::Shooting), None);
    assert_eq!(eval.skills.get(Skill::Strength), None);
    assert_eq!(eval.skills.rated_count(), 16);
    assert_eq!(eval.average_rating, Some(3.75));
    assert_eq!(eval.notes_trimmed(), "Strong left foot, needs to track back.");
}

#[test]
fn empty_evaluation_list_means_no_record() {
    assert_eq!(parse_evaluation_list_json("[]").unwrap(), None);
    assert_eq!(parse_evaluation_list_json("  ").unwrap(), None);
    assert_eq!(parse_evaluation_list_json("null").unwrap(), None);
}

#[test]
fn record_without_skills_has_no_ratings() {
    let eval = parse_evaluation_json(r#"{"id": 5, "notes": null}"#).unwrap();
    assert_eq!(eval.skills.rated_count(), 0);
    assert_eq!(eval.average_rating, None);
    assert_eq!(eval.notes_trimmed(), "");
}

#[test]
fn out_of_scale_rating_is_rejected() {
    let err = parse_evaluation_json(r#"{"id": 5, "passing": 9}"#).unwrap_err();
    assert!(format!("{err:#}").contains("passing"), "{err:#}");
    assert!(parse_evaluation_json(r#"{"id": 5, "passing": "good"}"#).is_err());
    assert!(parse_evaluation_list_json(r#"{"id": 5}"#).is_err());
}

#[test]
fn parses_player_fixture() {
    let player: Player = serde_json::from_str(&read_fixture("player.json")).unwrap();
    assert_eq!(player.attendance_days, Some(5));
    assert_eq!(player.feet, Some(Feet::Both));
    assert_eq!(
        player.profile_line(),
        "Age: 12 • Phone: 555-0101 • Tall: 151.5 cm • Weight: 41 kg • Feet: Both"
    );
    assert_eq!(
        player.photo_url("http://localhost:8000/").as_deref(),
        Some("http://localhost:8000/media/players/sam-carter.jpg")
    );
}

#[test]
fn parses_group_fixture() {
    let group: Group = serde_json::from_str(&read_fixture("group.json")).unwrap();
    assert_eq!(group.name, "Under 12");
    assert_eq!(group.coach_display(), "Kim Lee");
}

#[test]
fn error_message_prefers_detail_then_field_errors() {
    assert_eq!(
        error_message(404, br#"{"detail": "Not found."}"#),
        "Not found."
    );
    assert_eq!(
        error_message(400, br#"{"name": ["This field may not be blank."]}"#),
        "name: This field may not be blank."
    );
    assert_eq!(
        error_message(400, br#"{"non_field_errors": ["Already evaluated."]}"#),
        "Already evaluated."
    );
    assert_eq!(error_message(502, b"Bad Gateway"), "Bad Gateway");
    assert_eq!(error_message(500, b""), "HTTP 500");
}
