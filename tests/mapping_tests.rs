use postcraft::mapping::{
    InstagramPostData, PostType, Row, extract_hashtags_from_caption, limit_posts, map_field_name,
    map_profile_field_name, normalize_post_type, object_to_post_data, object_to_profile_data,
    parse_hashtags,
};
use serde_json::{Value, json};
use spectral::{assert_that, boolean::BooleanAssertions};

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("Expected a JSON object, got {other}"),
    }
}

fn post(id: &str) -> InstagramPostData {
    object_to_post_data(&row(json!({ "post_id": id }))).expect("Expected a post.")
}

#[test]
fn field_names_ignore_case_and_separators() {
    assert_that(&map_field_name("Post ID")).is_equal_to(Some("post_id"));
    assert_that(&map_field_name("likes-count")).is_equal_to(Some("likes_count"));
    assert_that(&map_field_name("TIMESTAMP")).is_equal_to(Some("posted_at"));
    assert_that(&map_field_name("display_url")).is_equal_to(Some("image_url"));
    assert_that(&map_field_name("owner_username")).is_equal_to(None);
    assert_that(&map_profile_field_name("Followers_Count")).is_equal_to(Some("followers_count"));
    assert_that(&map_profile_field_name("bio")).is_equal_to(Some("biography"));
}

#[test]
fn maps_a_full_row() {
    let post = object_to_post_data(&row(json!({
        "id": "C4xYz",
        "content_type": "Carousel",
        "description": "Strawberry season is here",
        "hashtags": ["strawberry", "#cafe"],
        "likes": "1,234",
        "num_comments": 56,
        "date_posted": "2024-04-01T10:00:00.000Z",
        "engagement_rate": "3.5%",
        "photos": "ignored",
        "thumbnail": "https://cdn.example.com/p.jpg"
    })))
    .expect("Expected a post.");

    assert_that(&post.post_id).is_equal_to("C4xYz".to_string());
    assert_that(&post.post_type).is_equal_to(PostType::Carousel);
    assert_that(&post.caption).is_equal_to("Strawberry season is here".to_string());
    assert_that(&post.hashtags).is_equal_to(vec!["#strawberry".to_string(), "#cafe".to_string()]);
    assert_that(&post.likes_count).is_equal_to(1234);
    assert_that(&post.comments_count).is_equal_to(56);
    assert_that(&post.posted_at).is_equal_to("2024-04-01T10:00:00.000Z".to_string());
    assert_that(&post.engagement_rate).is_equal_to(Some(3.5));
    assert_that(&post.image_url).is_equal_to(Some("https://cdn.example.com/p.jpg".to_string()));
}

#[test]
fn first_non_blank_synonym_wins() {
    let post = object_to_post_data(&row(json!({
        "post_id": "",
        "shortcode": "ABC",
        "caption": "Hello"
    })))
    .expect("Expected a post.");

    assert_that(&post.post_id).is_equal_to("ABC".to_string());
}

#[test]
fn rows_without_id_or_caption_are_dropped() {
    assert_that(&object_to_post_data(&row(json!({ "likes": 10, "caption": "  " })))).is_equal_to(None);
}

#[test]
fn missing_id_is_generated() {
    let post = object_to_post_data(&row(json!({ "caption": "No id here" }))).expect("Expected a post.");

    assert_that(&post.post_id.starts_with("generated_")).is_true();
    let suffix = post.post_id.rsplit('_').next().unwrap_or_default();
    assert_that(&suffix.len()).is_equal_to(9);
    assert_that(&suffix.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())).is_true();
}

#[test]
fn defaults_for_missing_fields() {
    let post = post("1");

    assert_that(&post.post_type).is_equal_to(PostType::Image);
    assert_that(&post.caption).is_equal_to(String::new());
    assert_that(&post.hashtags.is_empty()).is_true();
    assert_that(&post.likes_count).is_equal_to(0);
    assert_that(&post.posted_at).is_equal_to(String::new());
    assert_that(&post.engagement_rate).is_equal_to(None);
    assert_that(&post.image_url).is_equal_to(None);
}

#[test]
fn explicit_hashtags_win_over_caption() {
    let post = object_to_post_data(&row(json!({
        "post_id": "1",
        "caption": "Morning #coffee",
        "hashtags": "latte, espresso"
    })))
    .expect("Expected a post.");

    assert_that(&post.hashtags).is_equal_to(vec!["#latte".to_string(), "#espresso".to_string()]);
}

#[test]
fn caption_hashtags_are_used_without_a_column() {
    let post = object_to_post_data(&row(json!({
        "post_id": "1",
        "caption": "春限定 #いちごラテ と #カフェ巡り #cafe_time #カフェ巡り"
    })))
    .expect("Expected a post.");

    assert_that(&post.hashtags).is_equal_to(vec![
        "#いちごラテ".to_string(),
        "#カフェ巡り".to_string(),
        "#cafe_time".to_string(),
    ]);
}

#[test]
fn hashtag_column_formats() {
    let expected = vec!["#latte".to_string(), "#art".to_string()];

    assert_that(&parse_hashtags(&json!(r##"["latte", "#art"]"##))).is_equal_to(expected.clone());
    assert_that(&parse_hashtags(&json!("#latte #art #latte"))).is_equal_to(expected.clone());
    assert_that(&parse_hashtags(&json!("latte,art,"))).is_equal_to(expected);
    assert_that(&parse_hashtags(&json!(""))).is_equal_to(Vec::<String>::new());
}

#[test]
fn caption_extraction_stops_at_punctuation() {
    assert_that(&extract_hashtags_from_caption("Great day! #sunny, #beach.")).is_equal_to(vec![
        "#sunny".to_string(),
        "#beach".to_string(),
    ]);
    assert_that(&extract_hashtags_from_caption("no tags here").is_empty()).is_true();
}

#[test]
fn post_types_are_normalized() {
    assert_that(&normalize_post_type("GraphSidecar")).is_equal_to(PostType::Carousel);
    assert_that(&normalize_post_type("Reel")).is_equal_to(PostType::Reel);
    assert_that(&normalize_post_type("clips_reel")).is_equal_to(PostType::Reel);
    assert_that(&normalize_post_type("Video")).is_equal_to(PostType::Video);
    assert_that(&normalize_post_type("photo")).is_equal_to(PostType::Image);
    assert_that(&normalize_post_type("")).is_equal_to(PostType::Image);
}

#[test]
fn unix_timestamps_become_rfc3339() {
    let seconds = object_to_post_data(&row(json!({ "id": "1", "timestamp": "1700000000" })))
        .expect("Expected a post.");
    let millis = object_to_post_data(&row(json!({ "id": "2", "timestamp": 1_700_000_000_000_i64 })))
        .expect("Expected a post.");

    assert_that(&seconds.posted_at).is_equal_to("2023-11-14T22:13:20+00:00".to_string());
    assert_that(&millis.posted_at).is_equal_to("2023-11-14T22:13:20+00:00".to_string());
}

#[test]
fn counts_tolerate_formatting() {
    let post = object_to_post_data(&row(json!({
        "id": "1",
        "likes": "12 345",
        "comments": [{"text": "nice"}, {"text": "yum"}]
    })))
    .expect("Expected a post.");

    assert_that(&post.likes_count).is_equal_to(12345);
    assert_that(&post.comments_count).is_equal_to(2);

    let unparsable = object_to_post_data(&row(json!({ "id": "1", "likes": "many" })))
        .expect("Expected a post.");
    assert_that(&unparsable.likes_count).is_equal_to(0);
}

#[test]
fn profile_needs_username_and_profile_columns() {
    let profile = object_to_profile_data(&row(json!({
        "account": "@cafe_tokyo",
        "profile_name": "Cafe Tokyo",
        "followers": "12,000",
        "following": 150,
        "posts_count": "320",
        "biography": "Seasonal coffee"
    })))
    .expect("Expected a profile.");

    assert_that(&profile.username).is_equal_to("cafe_tokyo".to_string());
    assert_that(&profile.full_name).is_equal_to(Some("Cafe Tokyo".to_string()));
    assert_that(&profile.followers_count).is_equal_to(12000);
    assert_that(&profile.following_count).is_equal_to(150);
    assert_that(&profile.posts_count).is_equal_to(320);

    assert_that(&object_to_profile_data(&row(json!({ "username": "cafe", "caption": "hi" }))))
        .is_equal_to(None);
    assert_that(&object_to_profile_data(&row(json!({ "followers": 10 })))).is_equal_to(None);
}

#[test]
fn posts_are_limited() {
    let (kept, warning) = limit_posts((0..3).map(|index| post(&index.to_string())).collect());
    assert_that(&kept.len()).is_equal_to(3);
    assert_that(&warning).is_equal_to(None);

    let (kept, warning) = limit_posts((0..250).map(|index| post(&index.to_string())).collect());
    assert_that(&kept.len()).is_equal_to(200);
    assert_that(&kept[199].post_id).is_equal_to("199".to_string());
    assert_that(&warning.is_some()).is_true();
}
