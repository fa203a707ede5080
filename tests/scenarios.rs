//! End-to-end classification scenarios through the public API.

use titlemeta::{classify, EngineConfig, MediaType, MetaEngine};

#[test]
fn movie_with_year_resolution_source_and_codec() {
    let record = classify("The.Matrix.1999.1080p.BluRay.x264-GROUP", None);
    assert_eq!(record.media_type, Some(MediaType::Movie));
    assert_eq!(record.en_name.as_deref(), Some("The Matrix"));
    assert_eq!(record.year.as_deref(), Some("1999"));
    assert_eq!(record.resource_pix.as_deref(), Some("1080p"));
    assert_eq!(record.resource_type.as_deref(), Some("BluRay"));
    assert_eq!(record.video_encode.as_deref(), Some("x264"));
    assert_eq!(record.title_string(), "The Matrix (1999)");
    assert_eq!(record.season_episode_string(), "");
}

#[test]
fn tv_episode_with_compound_source_and_codecs() {
    let record = classify("某剧.S02E05.2160p.WEB-DL.H265.10bit.AAC", None);
    assert_eq!(record.media_type, Some(MediaType::Tv));
    assert_eq!(record.cn_name.as_deref(), Some("某剧"));
    assert_eq!(record.begin_season, Some(2));
    assert_eq!(record.begin_episode, Some(5));
    assert_eq!(record.resource_pix.as_deref(), Some("2160p"));
    assert_eq!(record.resource_type.as_deref(), Some("WEB-DL"));
    assert_eq!(record.video_encode.as_deref(), Some("H265 10bit"));
    assert_eq!(record.audio_encode.as_deref(), Some("AAC"));
    assert_eq!(record.season_episode_string(), "S02 E05");
}

#[test]
fn fansub_release_takes_the_anime_path() {
    let record = classify("[LoliHouse] 某动画 - 12 [WebRip 1080p]", None);
    assert_eq!(record.media_type, Some(MediaType::Anime));
    assert_eq!(record.begin_episode, Some(12));
    assert_eq!(record.resource_pix.as_deref(), Some("1080p"));
    assert_eq!(record.release_group.as_deref(), Some("LoliHouse"));
}

#[test]
fn subtitle_hints_fill_season_and_reset_episodes() {
    let record = classify("某剧 1080p WEB-DL", Some("第三季 全12集"));
    assert_eq!(record.begin_season, Some(3));
    assert_eq!(record.begin_episode, None);
    assert_eq!(record.total_episodes, 0);
    assert!(record.subtitle_derived);
}

#[test]
fn episode_offset_rewrites_before_classification() {
    let engine = MetaEngine::new(EngineConfig::builder().offset_word("第", "集", "-1").build());
    let record = engine.classify("某剧 第5集", None);
    assert!(record.org_string.contains("第04集"));
    assert_eq!(record.begin_episode, Some(4));
    assert_eq!(record.offset_words, vec!["第@集@-1"]);
}

#[test]
fn single_file_never_spans_more_than_two_episodes() {
    let record = classify("Show.S01.EP03-EP09.mkv", None);
    assert_eq!(record.begin_episode, Some(3));
    assert_eq!(record.end_episode, None);
    assert_eq!(record.total_episodes, 1);

    // Directory-shaped names keep the span.
    let record = classify("Show.S01.EP03-EP09.1080p", None);
    assert_eq!(record.end_episode, Some(9));
    assert_eq!(record.total_episodes, 7);

    // The cap also holds when the range arrives as a hint phrase.
    let record = classify("某剧 第03-09集.mkv", None);
    assert!(record.file_flag);
    assert_eq!(record.begin_episode, Some(3));
    assert_eq!(record.end_episode, None);
    assert_eq!(record.total_episodes, 1);
}

#[test]
fn release_groups_deduplicate_in_discovery_order() {
    let found = titlemeta::groups::match_groups("Movie-TLF.x264-TLF.mkv", None);
    assert_eq!(found, vec!["TLF"]);
}

#[test]
fn every_title_resolves_exactly_one_media_type() {
    let titles = [
        "The.Matrix.1999.1080p.BluRay.x264-GROUP",
        "某剧.S02E05.2160p.WEB-DL.H265.10bit.AAC",
        "[LoliHouse] 某动画 - 12 [WebRip 1080p]",
        "0102.mkv",
        "随便一个名字",
        "",
    ];
    for title in titles {
        let record = classify(title, None);
        assert!(record.media_type.is_some(), "no media type for {title:?}");
    }
}

#[test]
fn season_range_normalizes_equal_bounds() {
    let record = classify("Some.Show.S02.S02.1080p", None);
    assert_eq!(record.begin_season, Some(2));
    // A repeated equal season never becomes an end bound.
    assert_eq!(record.end_season, None);
}

#[test]
fn ignore_and_replace_words_rewrite_the_title() {
    let engine = MetaEngine::new(
        EngineConfig::builder()
            .ignore_word(r"\[推广\]")
            .replace_word("剧场版", "Movie")
            .build(),
    );
    let record = engine.classify("[推广]Some.Show.S01E01.1080p", None);
    assert_eq!(record.ignored_words, vec!["[推广]"]);
    assert_eq!(record.begin_episode, Some(1));
}

#[test]
fn custom_release_group_patterns() {
    let engine = MetaEngine::new(EngineConfig::builder().custom_groups("MyFansub").build());
    let record = engine.classify("Movie.2020.1080p.WEB-DL.x264-MyFansub.mkv", None);
    assert_eq!(record.release_group.as_deref(), Some("MyFansub"));
}

#[test]
fn pure_number_file_names_are_episodes() {
    let record = classify("0304.mkv", None);
    assert_eq!(record.begin_episode, Some(304));
    assert_eq!(record.media_type, Some(MediaType::Tv));
}
