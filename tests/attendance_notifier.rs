mod common;

use std::sync::mpsc;

use common::player_json;
use roster_terminal::attendance::{AttendanceBus, AttendanceChannel, AttendanceUpdate};
use roster_terminal::evaluation_view::ViewKey;
use roster_terminal::month::Month;
use roster_terminal::player_view::PlayerView;
use roster_terminal::roster::Player;

fn may_2024() -> Month {
    "2024-05".parse().unwrap()
}

fn loaded_view(player_id: u64, month: Month, days: Option<u8>) -> PlayerView {
    let key = ViewKey::new(player_id, month);
    let mut view = PlayerView::new(key);
    let player: Player = serde_json::from_value(player_json(player_id, "Sam", 2, days)).unwrap();
    assert!(view.apply_player(key, Ok(player)));
    view
}

fn drain(rx: &mpsc::Receiver<AttendanceUpdate>, views: &mut [&mut PlayerView]) {
    while let Ok(update) = rx.try_recv() {
        for view in views.iter_mut() {
            view.apply_attendance(&update);
        }
    }
}

#[test]
fn publish_updates_only_the_matching_view() {
    let bus = AttendanceBus::new();
    let (tx, rx) = mpsc::channel();

    let mut seven = loaded_view(7, may_2024(), Some(2));
    let mut eight = loaded_view(8, may_2024(), Some(3));
    let tx_seven = tx.clone();
    seven.watch_attendance(&bus, move |update| {
        let _ = tx_seven.send(update);
    });
    eight.watch_attendance(&bus, move |update| {
        let _ = tx.send(update);
    });
    assert_eq!(bus.subscriber_count(), 2);

    bus.publish(7, may_2024(), 5);
    let delivered: Vec<_> = rx.try_iter().collect();
    assert_eq!(
        delivered,
        vec![AttendanceUpdate {
            player_id: 7,
            month: may_2024(),
            days: 5
        }]
    );
    for update in &delivered {
        seven.apply_attendance(update);
        eight.apply_attendance(update);
    }

    assert_eq!(seven.attendance_summary(), "5/8 (63%)");
    assert_eq!(eight.attendance_summary(), "3/8 (38%)");
}

#[test]
fn other_month_is_ignored() {
    let bus = AttendanceBus::new();
    let (tx, rx) = mpsc::channel();
    let mut view = loaded_view(7, may_2024(), Some(2));
    view.watch_attendance(&bus, move |update| {
        let _ = tx.send(update);
    });

    bus.publish(7, may_2024().next(), 8);
    drain(&rx, &mut [&mut view]);
    assert_eq!(view.attendance_summary(), "2/8 (25%)");
}

#[test]
fn publish_without_subscribers_is_a_no_op() {
    let bus = AttendanceBus::new();
    bus.publish(7, may_2024(), 5);
    assert_eq!(bus.subscriber_count(), 0);
}

#[test]
fn subscription_is_released_with_the_view() {
    let bus = AttendanceBus::new();
    let mut view = loaded_view(7, may_2024(), None);
    view.watch_attendance(&bus, |_| {});
    assert!(view.is_watching());
    assert_eq!(bus.subscriber_count(), 1);

    drop(view);
    assert_eq!(bus.subscriber_count(), 0);
}

#[test]
fn switching_month_releases_the_old_subscription() {
    let bus = AttendanceBus::new();
    let (tx, rx) = mpsc::channel();
    let mut view = loaded_view(7, may_2024(), Some(1));
    let first = tx.clone();
    view.watch_attendance(&bus, move |update| {
        let _ = first.send(update);
    });

    assert!(view.set_month(may_2024().next()));
    assert!(!view.is_watching());
    assert_eq!(bus.subscriber_count(), 0);

    view.watch_attendance(&bus, move |update| {
        let _ = tx.send(update);
    });
    assert_eq!(bus.subscriber_count(), 1);

    bus.publish(7, may_2024(), 6);
    assert!(rx.try_recv().is_err());

    let june = ViewKey::new(7, may_2024().next());
    let player: Player = serde_json::from_value(player_json(7, "Sam", 2, Some(0))).unwrap();
    view.apply_player(june, Ok(player));
    bus.publish(7, may_2024().next(), 4);
    drain(&rx, &mut [&mut view]);
    assert_eq!(view.attendance_summary(), "4/8 (50%)");
}

#[test]
fn stop_watching_unsubscribes() {
    let bus = AttendanceBus::new();
    let mut view = loaded_view(7, may_2024(), None);
    view.watch_attendance(&bus, |_| {});
    view.stop_watching();
    assert!(!view.is_watching());
    assert_eq!(bus.subscriber_count(), 0);
    assert_eq!(view.attendance_summary(), "0/8 (0%)");
}
