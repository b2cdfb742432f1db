use serde_json::{json, Value};
use std::{collections::HashMap, net::SocketAddr};
use warp::{
    http::StatusCode,
    reply::{Json, WithStatus},
    Filter,
};

pub const TOKEN: &str = "good-token";
pub const UID: u64 = 1130000;

fn guarded(auth: Option<String>, body: Value) -> WithStatus<Json> {
    if auth.as_deref() == Some(format!("OAuth {TOKEN}").as_str()) {
        warp::reply::with_status(warp::reply::json(&body), StatusCode::OK)
    } else {
        warp::reply::with_status(
            warp::reply::json(&json!({
                "error": { "name": "session-expired", "message": "Your OAuth token is expired" }
            })),
            StatusCode::UNAUTHORIZED,
        )
    }
}

fn liked(uid: String) -> (StatusCode, Value) {
    if uid == "999" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": { "name": "internal-error", "message": "library unavailable" } }),
        );
    }

    (
        StatusCode::OK,
        json!({
            "result": {
                "library": {
                    "uid": UID,
                    "revision": 5,
                    "tracks": [
                        { "id": "1", "albumId": "10", "timestamp": "2023-01-01T00:00:00+00:00" },
                        { "id": "2", "albumId": 20 },
                        { "id": 3 }
                    ]
                }
            }
        }),
    )
}

fn tracks(form: HashMap<String, String>) -> Value {
    let items = form
        .get("track-ids")
        .map(|ids| {
            ids.split(',')
                .map(|id| {
                    let id = id.split(':').next().unwrap_or_default();
                    let artists = if id == "3" {
                        json!([])
                    } else {
                        json!([{ "id": 100, "name": format!("Artist {id}") }])
                    };

                    json!({ "id": id, "title": format!("Title {id}"), "artists": artists })
                })
                .collect::<Vec<Value>>()
        })
        .unwrap_or_default();

    json!({ "result": items })
}

/// Serves a tiny imitation of the Yandex Music API on an ephemeral port.
pub fn spawn_server() -> SocketAddr {
    let auth = warp::header::optional::<String>("authorization");

    let status = warp::path!("account" / "status")
        .and(warp::get())
        .and(auth)
        .map(|auth: Option<String>| {
            guarded(
                auth,
                json!({ "result": { "account": { "uid": UID, "login": "listener" } } }),
            )
        });

    let likes = warp::path!("users" / String / "likes" / "tracks")
        .and(warp::get())
        .and(auth)
        .map(|uid: String, auth: Option<String>| match liked(uid) {
            (StatusCode::OK, body) => guarded(auth, body),
            (status, body) => warp::reply::with_status(warp::reply::json(&body), status),
        });

    let full_tracks = warp::path!("tracks")
        .and(warp::post())
        .and(warp::body::form::<HashMap<String, String>>())
        .and(auth)
        .map(|form: HashMap<String, String>, auth: Option<String>| guarded(auth, tracks(form)));

    let (addr, server) =
        warp::serve(status.or(likes).or(full_tracks)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    addr
}

pub fn base_url(addr: SocketAddr) -> String {
    format!("http://{addr}")
}
