use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use roster_terminal::attendance::{AttendanceBus, AttendanceChannel, AttendanceUpdate};
use roster_terminal::evaluation::parse_evaluation_list_json;
use roster_terminal::evaluation_view::{EvaluationView, ViewKey};
use roster_terminal::month::Month;
use roster_terminal::skills::Skill;
use std::sync::Arc;

const EVALUATION_LIST_JSON: &str = include_str!("../tests/fixtures/evaluation_list.json");

fn may_2024() -> Month {
    Month::new(2024, 5).expect("valid month")
}

fn bench_evaluation_list_parse(c: &mut Criterion) {
    c.bench_function("evaluation_list_parse", |b| {
        b.iter(|| {
            let eval = parse_evaluation_list_json(black_box(EVALUATION_LIST_JSON)).unwrap();
            black_box(eval.map(|e| e.id));
        })
    });
}

fn bench_draft_save_payload(c: &mut Criterion) {
    let key = ViewKey::new(7, may_2024());
    let confirmed = parse_evaluation_list_json(EVALUATION_LIST_JSON).unwrap();
    c.bench_function("draft_save_payload", |b| {
        b.iter(|| {
            let mut view = EvaluationView::new(key);
            view.apply_fetch(key, Ok(confirmed.clone()));
            view.begin_edit_skills().unwrap();
            for (idx, skill) in Skill::ALL.into_iter().enumerate() {
                view.set_skill(skill, Some(idx as f64 * 0.4)).unwrap();
            }
            let request = view.prepare_save().unwrap();
            black_box(request);
        })
    });
}

fn bench_attendance_publish(c: &mut Criterion) {
    let bus = AttendanceBus::new();
    let subs: Vec<_> = (0..32u64)
        .map(|player_id| {
            let key = ViewKey::new(player_id, may_2024());
            bus.subscribe(Arc::new(move |update: &AttendanceUpdate| {
                black_box(update.matches(&key));
            }))
        })
        .collect();
    c.bench_function("attendance_publish", |b| {
        b.iter(|| bus.publish(black_box(7), may_2024(), black_box(5)))
    });
    drop(subs);
}

criterion_group!(
    perf,
    bench_evaluation_list_parse,
    bench_draft_save_payload,
    bench_attendance_publish
);
criterion_main!(perf);
