use tokio_test::assert_ok;
use yam2spot_yandex_api::{
    client::{api, Id},
    Error,
};

mod common;

#[tokio::test]
async fn can_fetch_account_status() {
    let addr = common::spawn_server();
    let client = api::new(
        common::TOKEN.to_string(),
        Some(common::base_url(addr)),
        None,
    )
    .expect("failed to create client");

    let status = assert_ok!(client.account_status().await);

    assert_eq!(status.account.uid, Some(Id::Number(common::UID)));
    assert_eq!(status.account.login.as_deref(), Some("listener"));
}

#[tokio::test]
async fn rejected_token_is_unauthorized() {
    let addr = common::spawn_server();
    let client = api::new("bad-token".to_string(), Some(common::base_url(addr)), None)
        .expect("failed to create client");

    assert!(matches!(
        client.account_status().await,
        Err(Error::Unauthorized)
    ));
}

#[tokio::test]
async fn can_fetch_liked_tracks_in_order() {
    let addr = common::spawn_server();
    let client = api::new(
        common::TOKEN.to_string(),
        Some(common::base_url(addr)),
        None,
    )
    .expect("failed to create client");

    let likes = assert_ok!(client.liked_tracks(&Id::Number(common::UID)).await);
    let ids = likes.iter().map(|t| t.track_id()).collect::<Vec<String>>();

    assert_eq!(ids, vec!["1:10", "2:20", "3"]);

    let tracks = assert_ok!(client.tracks(&likes).await);
    let titles = tracks
        .iter()
        .map(|t| t.title.as_str())
        .collect::<Vec<&str>>();

    assert_eq!(titles, vec!["Title 1", "Title 2", "Title 3"]);
    assert_eq!(tracks[0].artists[0].name, "Artist 1");
    assert!(tracks[2].artists.is_empty());
}

#[tokio::test]
async fn api_error_body_is_surfaced() {
    let addr = common::spawn_server();
    let client = api::new(
        common::TOKEN.to_string(),
        Some(common::base_url(addr)),
        None,
    )
    .expect("failed to create client");

    match client.liked_tracks(&Id::Number(999)).await {
        Err(Error::Api { message }) => {
            assert_eq!(message, "internal-error: library unavailable")
        }
        other => panic!("expected an api error, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_id_list_makes_no_requests() {
    let client = api::new(
        common::TOKEN.to_string(),
        Some("http://127.0.0.1:9".to_string()),
        None,
    )
    .expect("failed to create client");

    let tracks = assert_ok!(client.tracks(&[]).await);
    assert!(tracks.is_empty());
}
