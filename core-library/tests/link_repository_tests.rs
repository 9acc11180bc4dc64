use core_library::db::create_test_pool;
use core_library::{
    AlbumRecord, ArtistRecord, LibraryError, LinkRepository, ServiceUrls, SqliteLinkRepository,
};

async fn setup() -> SqliteLinkRepository {
    let pool = create_test_pool().await.unwrap();
    SqliteLinkRepository::new(pool)
}

fn spotify(url: &str) -> ServiceUrls {
    ServiceUrls {
        spotify_url: Some(url.to_string()),
        ..ServiceUrls::default()
    }
}

#[tokio::test]
async fn test_exact_match_ignores_case_and_accents() {
    let repo = setup().await;
    repo.save_artist(
        &ArtistRecord::new("Björk").with_urls(spotify("https://open.spotify.com/artist/bjork")),
    )
    .await
    .unwrap();

    let found = repo.find_artist("BJORK").await.unwrap().unwrap();
    assert_eq!(found.name, "Björk");
    assert_eq!(
        found.urls.spotify_url.as_deref(),
        Some("https://open.spotify.com/artist/bjork")
    );
}

#[tokio::test]
async fn test_partial_match_fallback_prefers_shortest() {
    let repo = setup().await;
    repo.save_artist(&ArtistRecord::new("The National Parks"))
        .await
        .unwrap();
    repo.save_artist(&ArtistRecord::new("The National"))
        .await
        .unwrap();

    let found = repo.find_artist("National").await.unwrap().unwrap();
    assert_eq!(found.name, "The National");
}

#[tokio::test]
async fn test_unknown_and_blank_names() {
    let repo = setup().await;
    repo.save_artist(&ArtistRecord::new("Low")).await.unwrap();

    assert!(repo.find_artist("Slowdive").await.unwrap().is_none());
    assert!(repo.find_artist("   ").await.unwrap().is_none());
}

#[tokio::test]
async fn test_like_wildcards_are_literal() {
    let repo = setup().await;
    repo.save_artist(&ArtistRecord::new("Sunn O)))")).await.unwrap();

    assert!(repo.find_artist("%").await.unwrap().is_none());
    assert!(repo.find_artist("_").await.unwrap().is_none());
}

#[tokio::test]
async fn test_save_artist_updates_existing_row() {
    let repo = setup().await;
    let first = repo
        .save_artist(&ArtistRecord::new("Portishead"))
        .await
        .unwrap();
    let second = repo
        .save_artist(&ArtistRecord::new("PORTISHEAD").with_website("https://portishead.co.uk"))
        .await
        .unwrap();

    assert_eq!(first, second);
    let found = repo.find_artist("portishead").await.unwrap().unwrap();
    assert_eq!(found.website.as_deref(), Some("https://portishead.co.uk"));
}

#[tokio::test]
async fn test_find_album_links() {
    let repo = setup().await;
    let artist_id = repo
        .save_artist(&ArtistRecord::new("Radiohead"))
        .await
        .unwrap();
    repo.save_album(
        &AlbumRecord::new(artist_id, "OK Computer")
            .with_urls(spotify("https://open.spotify.com/album/ok"))
            .with_musicbrainz_albumid("b1392450"),
    )
    .await
    .unwrap();

    let album = repo
        .find_album("radiohead", "ok computer")
        .await
        .unwrap()
        .unwrap();
    let links = album.links();

    assert_eq!(links.len(), 2);
    assert_eq!(links[0].0, "Spotify");
    assert_eq!(links[1].1, "https://musicbrainz.org/release/b1392450");

    let partial = repo.find_album("Radiohead", "Computer").await.unwrap();
    assert!(partial.is_some());

    assert!(repo
        .find_album("Radiohead", "Kid A")
        .await
        .unwrap()
        .is_none());
    assert!(repo
        .find_album("Unknown", "OK Computer")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_artist_image_fields_round_trip() {
    let repo = setup().await;
    repo.save_artist(
        &ArtistRecord::new("Mogwai")
            .with_image_url("https://img.example/mogwai.jpg")
            .with_image_urls(["https://img.example/a.jpg", "https://img.example/b.jpg"]),
    )
    .await
    .unwrap();

    let found = repo.find_artist("mogwai").await.unwrap().unwrap();
    assert_eq!(
        found.image_candidates(),
        vec![
            "https://img.example/mogwai.jpg",
            "https://img.example/a.jpg",
            "https://img.example/b.jpg",
        ]
    );
}

#[tokio::test]
async fn test_blank_name_rejected() {
    let repo = setup().await;
    let result = repo.save_artist(&ArtistRecord::new("  ")).await;
    assert!(matches!(result, Err(LibraryError::InvalidInput { .. })));
}
