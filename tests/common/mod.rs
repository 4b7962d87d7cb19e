#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use roster_terminal::api::{ApiClient, ApiError, ApiRequest, ApiResponse, Method, Transport};
use roster_terminal::skills::Skill;

pub fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

struct Route {
    method: Method,
    path: String,
    reply: Result<ApiResponse, ApiError>,
}

/// Canned backend: replies are matched on method and exact path, the most
/// recently registered route winning. Unknown routes answer 404.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<Vec<Route>>,
    sent: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: Method, path: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.routes.lock().unwrap().push(Route {
            method,
            path: path.to_string(),
            reply: Ok(ApiResponse {
                status,
                body: body.into(),
            }),
        });
    }

    pub fn on_json(&self, method: Method, path: &str, body: &Value) {
        self.on(method, path, 200, body.to_string());
    }

    pub fn unreachable(&self, method: Method, path: &str) {
        self.routes.lock().unwrap().push(Route {
            method,
            path: path.to_string(),
            reply: Err(ApiError::Transport("connection refused".to_string())),
        });
    }

    pub fn sent(&self) -> Vec<ApiRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.sent()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.sent.lock().unwrap().push(request.clone());
        let routes = self.routes.lock().unwrap();
        routes
            .iter()
            .rev()
            .find(|r| r.method == request.method && r.path == request.path)
            .map(|r| r.reply.clone())
            .unwrap_or_else(|| {
                Ok(ApiResponse {
                    status: 404,
                    body: br#"{"detail":"Not found."}"#.to_vec(),
                })
            })
    }
}

pub fn client(fake: &Arc<FakeTransport>) -> ApiClient {
    ApiClient::new(fake.clone())
}

/// Evaluation record as the backend returns it; unlisted skills are null.
pub fn evaluation_json(id: u64, player: u64, month: &str, ratings: &[(Skill, u8)]) -> Value {
    let mut record = json!({
        "id": id,
        "player": player,
        "evaluated_at": format!("{month}-01"),
        "notes": "Works hard",
    });
    let rated: Vec<f64> = ratings.iter().map(|(_, v)| f64::from(*v)).collect();
    let average = if rated.is_empty() {
        Value::Null
    } else {
        json!(rated.iter().sum::<f64>() / rated.len() as f64)
    };
    if let Some(map) = record.as_object_mut() {
        for skill in Skill::ALL {
            map.insert(skill.key().to_string(), Value::Null);
        }
        for (skill, value) in ratings {
            map.insert(skill.key().to_string(), json!(value));
        }
        map.insert("average_rating".to_string(), average);
    }
    record
}

pub fn player_json(id: u64, name: &str, group: u64, attendance_days: Option<u8>) -> Value {
    json!({
        "id": id,
        "name": name,
        "age": 12,
        "phone": "555-0101",
        "group": group,
        "photo": null,
        "tall": 150.0,
        "weight": 40.0,
        "feet": "L",
        "attendance_days": attendance_days,
    })
}
