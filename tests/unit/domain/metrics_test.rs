// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use blogrs::domain::models::profile::{ErTrend, ScrapedPost};
    use blogrs::domain::services::metrics::{
        avg_reels_views, er_trend, extract_hashtags, extract_mentions, median_er, posts_per_week,
    };
    use chrono::{Duration, TimeZone, Utc};

    fn make_post(likes: i64, comments: i64, days_ago: i64) -> ScrapedPost {
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        ScrapedPost {
            platform_id: format!("p{}", days_ago),
            media_type: 1,
            product_type: None,
            caption_text: String::new(),
            hashtags: vec![],
            mentions: vec![],
            has_sponsor_tag: false,
            sponsor_brands: vec![],
            like_count: likes,
            comment_count: comments,
            play_count: None,
            thumbnail_url: None,
            title: None,
            comments_disabled: false,
            top_comments: vec![],
            taken_at: base - Duration::days(days_ago),
        }
    }

    fn make_reel(plays: Option<i64>, days_ago: i64) -> ScrapedPost {
        let mut post = make_post(0, 0, days_ago);
        post.media_type = 2;
        post.product_type = Some("clips".to_string());
        post.play_count = plays;
        post
    }

    #[test]
    fn test_median_er_uses_median_not_mean() {
        // 爆款帖 (990+10) 不应抬高中位数
        let posts = vec![
            make_post(10, 0, 1),
            make_post(15, 5, 2),
            make_post(990, 10, 3),
        ];
        // engagements = [10, 20, 1000], медиана 20 → 20/1000*100 = 2.0
        assert_eq!(median_er(&posts, 1000), Some(2.0));
    }

    #[test]
    fn test_median_er_even_count_averages_middle() {
        let posts = vec![make_post(10, 0, 1), make_post(20, 0, 2)];
        // median([10, 20]) = 15 → 1.5%
        assert_eq!(median_er(&posts, 1000), Some(1.5));
    }

    #[test]
    fn test_median_er_requires_posts_and_followers() {
        assert_eq!(median_er(&[], 1000), None);
        assert_eq!(median_er(&[make_post(10, 0, 1)], 0), None);
    }

    #[test]
    fn test_er_trend_growing() {
        // 新两帖 ER 20，旧两帖 ER 10：变化 +100% > 20%
        let posts = vec![
            make_post(200, 0, 1),
            make_post(200, 0, 2),
            make_post(100, 0, 10),
            make_post(100, 0, 11),
        ];
        assert_eq!(er_trend(&posts, 1000), Some(ErTrend::Growing));
    }

    #[test]
    fn test_er_trend_declining() {
        let posts = vec![
            make_post(100, 0, 1),
            make_post(100, 0, 2),
            make_post(200, 0, 10),
            make_post(200, 0, 11),
        ];
        assert_eq!(er_trend(&posts, 1000), Some(ErTrend::Declining));
    }

    #[test]
    fn test_er_trend_stable_within_threshold() {
        let posts = vec![
            make_post(110, 0, 1),
            make_post(110, 0, 2),
            make_post(100, 0, 10),
            make_post(100, 0, 11),
        ];
        assert_eq!(er_trend(&posts, 1000), Some(ErTrend::Stable));
    }

    #[test]
    fn test_er_trend_needs_four_posts() {
        let posts = vec![make_post(10, 0, 1), make_post(10, 0, 2), make_post(10, 0, 3)];
        assert_eq!(er_trend(&posts, 1000), None);
    }

    #[test]
    fn test_posts_per_week() {
        // 5 帖覆盖 28 天 = 4 周 → 1.25 帖/周
        let posts = vec![
            make_post(0, 0, 0),
            make_post(0, 0, 7),
            make_post(0, 0, 14),
            make_post(0, 0, 21),
            make_post(0, 0, 28),
        ];
        assert_eq!(posts_per_week(&posts), Some(1.25));
    }

    #[test]
    fn test_posts_per_week_needs_time_span() {
        assert_eq!(posts_per_week(&[make_post(0, 0, 1)]), None);
        // 同一时刻的两帖没有跨度
        let same_moment = vec![make_post(0, 0, 3), make_post(1, 0, 3)];
        assert_eq!(posts_per_week(&same_moment), None);
    }

    #[test]
    fn test_avg_reels_views_only_counts_clips() {
        let posts = vec![
            make_reel(Some(100), 1),
            make_reel(Some(200), 2),
            make_reel(None, 3),
            make_post(50, 0, 4),
        ];
        assert_eq!(avg_reels_views(&posts), Some(150));
    }

    #[test]
    fn test_avg_reels_views_empty() {
        assert_eq!(avg_reels_views(&[make_post(10, 0, 1)]), None);
    }

    #[test]
    fn test_extract_hashtags_supports_cyrillic() {
        let tags = extract_hashtags("Утро в городе #москва #coffee_time и всё");
        assert_eq!(tags, vec!["#москва", "#coffee_time"]);
    }

    #[test]
    fn test_extract_mentions_keeps_inner_dots() {
        let mentions = extract_mentions("с @user.name. и @brand_official");
        assert_eq!(mentions, vec!["@user.name", "@brand_official"]);
    }
}
