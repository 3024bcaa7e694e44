use mangarank::prelude::*;
use mangarank::rank::{MIN_CONFIDENCE_THRESHOLD, bayesian_score, prior_mean};
use mangarank::{Error, SearchFiltersBuilder};
use std::collections::BTreeSet;

mod common;
use common::{TOLERANCE, candidate, mixed_corpus};

#[cfg(test)]
mod ranking_tests {
    use super::*;

    fn ids(ranked: &[RankedCandidate]) -> Vec<&str> {
        ranked.iter().map(|r| r.candidate.id.as_str()).collect()
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        let ranked = Ranker::default().rank(Vec::new());
        assert!(ranked.is_empty());
        assert!(Ranker::default().context(&[]).is_none());
    }

    #[test]
    fn test_rank_is_a_permutation() {
        let corpus = mixed_corpus();
        let ranked = Ranker::default().rank(corpus.clone());

        assert_eq!(ranked.len(), corpus.len());
        let before: BTreeSet<&str> = corpus.iter().map(|c| c.id.as_str()).collect();
        let after: BTreeSet<&str> = ids(&ranked).into_iter().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_rank_sorted_descending() {
        let mut corpus = mixed_corpus();
        for i in 0..40u64 {
            let rating = ((i * 37) % 100) as f64 / 10.0;
            corpus.push(candidate(&format!("gen-{}", i), rating, (i * 53) % 700));
        }

        for threshold in [
            ConfidenceThreshold::Fixed(1.0),
            ConfidenceThreshold::Fixed(50.0),
            ConfidenceThreshold::Fixed(5000.0),
            ConfidenceThreshold::Percentile(25.0),
            ConfidenceThreshold::Percentile(90.0),
        ] {
            let ranked = Ranker::new(threshold).rank(corpus.clone());
            for pair in ranked.windows(2) {
                assert!(
                    pair[0].score >= pair[1].score,
                    "{:?}: {} ({}) ranked above {} ({})",
                    threshold,
                    pair[0].candidate.id,
                    pair[0].score,
                    pair[1].candidate.id,
                    pair[1].score
                );
            }
        }
    }

    #[test]
    fn test_many_votes_approach_raw_average() {
        let score = bayesian_score(8.0, 10_000, 10.0, 5.0);
        assert!((score - 8.0).abs() / 8.0 < 0.001, "score {} too far from 8.0", score);

        // Monotonic approach from below when the prior is lower
        let mut previous = bayesian_score(8.0, 0, 10.0, 5.0);
        for votes in [1, 10, 100, 1_000, 10_000, 100_000] {
            let current = bayesian_score(8.0, votes, 10.0, 5.0);
            assert!(current > previous);
            assert!(current < 8.0);
            previous = current;
        }
    }

    #[test]
    fn test_zero_votes_score_is_exactly_prior() {
        for prior in [0.0, 5.25, 7.62, 10.0] {
            for min_votes in [1.0, 10.0, 50.0, 1234.5] {
                assert_eq!(bayesian_score(9.9, 0, min_votes, prior), prior);
            }
        }
    }

    #[test]
    fn test_many_votes_beat_few_high_votes() {
        let ranked = Ranker::new(ConfidenceThreshold::Fixed(50.0)).rank(mixed_corpus());
        assert_eq!(ids(&ranked), vec!["classic", "niche", "hyped", "meh", "bad"]);

        let context = Ranker::new(ConfidenceThreshold::Fixed(50.0))
            .context(&mixed_corpus())
            .unwrap();
        assert!((context.prior_mean - 7.62).abs() < TOLERANCE);
        assert!((ranked[0].score - 8.68933).abs() < 1e-4);
        assert!((ranked[2].score - 7.70769).abs() < 1e-4);
    }

    #[test]
    fn test_three_title_corpus_scores() {
        // C = (9.9 + 8.7 + 8.0) / 3; the hyped title's score stays above C, which
        // is itself above the classic's raw average.
        let corpus = vec![
            candidate("hyped", 9.9, 2),
            candidate("classic", 8.7, 5000),
            candidate("niche", 8.0, 100),
        ];
        let ranker = Ranker::new(ConfidenceThreshold::Fixed(50.0));
        let context = ranker.context(&corpus).unwrap();
        assert!((context.prior_mean - 26.6 / 3.0).abs() < TOLERANCE);

        let ranked = ranker.rank(corpus);
        let score_of = |id: &str| {
            ranked
                .iter()
                .find(|r| r.candidate.id == id)
                .map(|r| r.score)
                .unwrap()
        };
        assert!((score_of("hyped") - 8.90641).abs() < 1e-4);
        assert!((score_of("classic") - 8.70165).abs() < 1e-4);
    }

    #[test]
    fn test_large_threshold_lets_volume_win() {
        // With a tiny threshold the raw average dominates
        let ranked = Ranker::new(ConfidenceThreshold::Fixed(1.0)).rank(mixed_corpus());
        assert_eq!(ranked[0].candidate.id, "hyped");

        // With a large one the two-vote title is pulled to the prior
        let ranked = Ranker::new(ConfidenceThreshold::Fixed(500.0)).rank(mixed_corpus());
        assert_eq!(ranked[0].candidate.id, "classic");
    }

    #[test]
    fn test_all_unvoted_keeps_fetch_order() {
        let corpus = vec![
            candidate("c", 0.0, 0),
            candidate("a", 0.0, 0),
            candidate("b", 0.0, 0),
        ];
        let ranked = Ranker::default().rank(corpus);

        assert_eq!(ids(&ranked), vec!["c", "a", "b"]);
        assert!(ranked.iter().all(|r| r.score == 0.0));
    }

    #[test]
    fn test_ties_keep_fetch_order() {
        let corpus = vec![
            candidate("first", 8.0, 100),
            candidate("loud", 9.0, 1000),
            candidate("second", 8.0, 100),
            candidate("third", 8.0, 100),
        ];
        let ranked = Ranker::default().rank(corpus);
        assert_eq!(ids(&ranked), vec!["loud", "first", "second", "third"]);
    }

    #[test]
    fn test_unvoted_titles_score_prior() {
        let corpus = vec![
            candidate("voted-a", 8.0, 10),
            candidate("voted-b", 6.0, 30),
            candidate("new", 0.0, 0),
        ];
        assert_eq!(prior_mean(&corpus), Some(7.0));

        let ranked = Ranker::default().rank(corpus);
        let new = ranked.iter().find(|r| r.candidate.id == "new").unwrap();
        assert_eq!(new.score, 7.0);
        assert!(ranked.iter().all(|r| r.score.is_finite()));
    }

    #[test]
    fn test_percentile_threshold_uses_corpus() {
        let corpus = mixed_corpus();
        // Vote counts sorted: 2, 100, 800, 1200, 5000
        let threshold = ConfidenceThreshold::Percentile(50.0);
        assert_eq!(threshold.resolve(&corpus), 800.0);

        let context = Ranker::new(threshold).context(&corpus).unwrap();
        assert_eq!(context.min_votes, 800.0);
    }

    #[test]
    fn test_zero_threshold_is_guarded() {
        let corpus = vec![candidate("a", 0.0, 0), candidate("b", 0.0, 0)];
        let ranker = Ranker::new(ConfidenceThreshold::Fixed(0.0));

        assert_eq!(
            ranker.context(&corpus).unwrap().min_votes,
            MIN_CONFIDENCE_THRESHOLD
        );
        assert!(ranker.rank(corpus).iter().all(|r| !r.score.is_nan()));
    }

    #[test]
    fn test_ranked_list_trimming() {
        let ranked = Ranker::new(ConfidenceThreshold::Fixed(50.0)).rank(mixed_corpus());

        let above = ranked.clone().above(7.7);
        assert_eq!(ids(&above), vec!["classic", "niche", "hyped"]);

        let top = ranked.clone().top(2);
        assert_eq!(ids(&top), vec!["classic", "niche"]);

        assert_eq!(ranked.clone().top(100).len(), 5);
        assert!(ranked.above(10.0).is_empty());
    }
}

#[cfg(test)]
mod filter_tests {
    use super::*;

    fn filters(include: &[&str], exclude: &[&str]) -> SearchFilters {
        SearchFiltersBuilder::default()
            .include_tags(include.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>())
            .exclude_tags(exclude.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>())
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let filters = SearchFiltersBuilder::default().build().unwrap();
        assert!(filters.is_unfiltered());
        assert_eq!(filters.pages, 10);
        assert_eq!(filters, SearchFilters::default());
        assert!(filters.validate().is_ok());
    }

    #[test]
    fn test_disjoint_filters_are_valid() {
        assert!(filters(&["Romance", "Comedy"], &["Tragedy"]).validate().is_ok());
    }

    #[test]
    fn test_overlapping_filters_are_rejected() {
        let err = filters(&["Romance", "Comedy"], &["comedy "]).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidFilter(_)));
        assert!(err.to_string().contains("Comedy"));
        assert!(!err.is_remote());
    }

    #[test]
    fn test_blank_tag_is_rejected() {
        let err = filters(&["  "], &[]).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidFilter(_)));
    }

    #[test]
    fn test_zero_pages_is_rejected() {
        let filters = SearchFiltersBuilder::default()
            .pages(0usize)
            .build()
            .unwrap();
        assert!(matches!(filters.validate(), Err(Error::InvalidFilter(_))));
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(Error::remote("mgd", "HTTP 500").is_remote());
        assert!(Error::rate_limit(None).is_remote());
        assert!(Error::parse("missing statistics").is_remote());

        let json_err = serde_json::from_str::<Candidate>("{").unwrap_err();
        assert!(Error::from(json_err).is_remote());

        assert!(!Error::invalid_filter("overlap").is_remote());
        assert!(!Error::from(std::io::Error::other("closed")).is_remote());
    }

    #[test]
    fn test_error_messages() {
        let error = Error::remote("mgd", "HTTP 503 Service Unavailable");
        assert_eq!(
            error.to_string(),
            "Remote service error [mgd]: HTTP 503 Service Unavailable"
        );

        let error = Error::invalid_filter("unknown tag 'isekaii'");
        assert!(error.to_string().contains("isekaii"));
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_credentials_need_both_values() {
        assert!(Credentials::from_pair(Some("reader".into()), Some("secret".into())).is_some());
        assert!(Credentials::from_pair(None, Some("secret".into())).is_none());
        assert!(Credentials::from_pair(Some("reader".into()), Some(String::new())).is_none());
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = Credentials::new("reader", "hunter2");
        let printed = format!("{:?}", credentials);
        assert!(printed.contains("reader"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_catalog_config_builders() {
        let config = CatalogConfig::default()
            .with_api_base("http://localhost:9000/")
            .with_page_size(500)
            .with_rate_limit(0);

        assert_eq!(config.api_base, "http://localhost:9000");
        assert_eq!(config.page_size, 100);
        assert_eq!(config.rate_limit_ms, 0);
        assert!(!config.is_authenticated());
        assert!(
            config
                .with_credentials(Credentials::new("a", "b"))
                .is_authenticated()
        );
    }
}

#[cfg(test)]
mod output_tests {
    use super::*;

    fn ranked() -> Vec<RankedCandidate> {
        let mut first = candidate("abc", 9.2, 4000);
        first.title = "Yotsuba&!".to_string();
        let mut second = candidate("def", 8.5, 12);
        second.title = "Love, Chunibyo \"Special\"".to_string();

        vec![
            RankedCandidate {
                candidate: first,
                score: 9.134,
            },
            RankedCandidate {
                candidate: second,
                score: 7.9,
            },
        ]
    }

    fn render(format: OutputFormat) -> String {
        let mut out = Vec::new();
        write_ranked(&mut out, &ranked(), format).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_wide_format() {
        let text = render(OutputFormat::Wide);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("  1. Yotsuba&!"));
        assert!(lines[0].ends_with("9.13 (9.20 x 4000)"));
        assert!(lines[1].starts_with("  2. Love, Chunibyo"));
        assert!(lines[1].ends_with("7.90 (8.50 x 12)"));
    }

    #[test]
    fn test_json_format() {
        let text = render(OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let rows = value.as_array().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], "abc");
        assert_eq!(rows[0]["url"], "https://mangadex.org/title/abc");
        assert_eq!(rows[0]["votes"], 4000);
        assert_eq!(rows[0]["follows"], 40000);
        assert_eq!(rows[1]["title"], "Love, Chunibyo \"Special\"");
    }

    #[test]
    fn test_yaml_format() {
        let text = render(OutputFormat::Yaml);
        assert!(text.starts_with("- id: abc\n"));

        let value: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
        let rows = value.as_sequence().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["title"].as_str(), Some("Yotsuba&!"));
        assert_eq!(rows[0]["url"].as_str(), Some("https://mangadex.org/title/abc"));
        assert_eq!(rows[0]["score"].as_f64(), Some(9.134));
        assert_eq!(rows[0]["votes"].as_u64(), Some(4000));
        assert_eq!(rows[1]["id"].as_str(), Some("def"));
        assert_eq!(rows[1]["title"].as_str(), Some("Love, Chunibyo \"Special\""));
    }

    #[test]
    fn test_csv_format() {
        let text = render(OutputFormat::Csv);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "id,title,url,rating,score,votes,follows");
        assert_eq!(
            lines[1],
            "abc,Yotsuba&!,https://mangadex.org/title/abc,9.2,9.134,4000,40000"
        );
        assert!(lines[2].starts_with("def,\"Love, Chunibyo \"\"Special\"\"\","));
    }

    #[test]
    fn test_empty_list_prints_header_only_for_csv() {
        let mut out = Vec::new();
        write_ranked(&mut out, &[], OutputFormat::Csv).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "id,title,url,rating,score,votes,follows\n");

        let mut out = Vec::new();
        write_ranked(&mut out, &[], OutputFormat::Json).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[]\n");

        let mut out = Vec::new();
        write_ranked(&mut out, &[], OutputFormat::Yaml).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[]\n");
    }
}
