use super::*;
use crate::text::titles_similar;

type Vectors = anyhow::Result<Vec<Vec<f32>>>;

const DIMENSIONS: usize = 8;

fn axis(position: usize) -> Vec<f32> {
    let mut v = vec![0.0; DIMENSIONS];
    v[position] = 1.0;
    v
}

fn mixed(position1: usize, weight1: f32, position2: usize, weight2: f32) -> Vec<f32> {
    let mut v = vec![0.0; DIMENSIONS];
    v[position1] = weight1;
    v[position2] = weight2;
    v
}

/// Embeds each text as the vector of the first topic word it contains.
fn topic_provider(topics: Vec<(&'static str, Vec<f32>)>) -> impl Fn(&[String]) -> Vectors {
    move |texts: &[String]| -> Vectors {
        texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                topics
                    .iter()
                    .find(|(word, _)| lower.contains(word))
                    .map(|(_, vector)| vector.clone())
                    .ok_or_else(|| anyhow::anyhow!("no topic for {:?}", text))
            })
            .collect()
    }
}

fn newsroom_provider() -> impl Fn(&[String]) -> Vectors {
    topic_provider(vec![
        ("sensex", axis(0)),
        ("rain", axis(1)),
        ("brahmaputra", axis(2)),
        // cosine 0.72 with the Brahmaputra story
        ("deluge", mixed(2, 0.72, 3, 0.694)),
        ("bihar", axis(4)),
        // cosine 0.55 with the Bihar story
        ("maharashtra", mixed(4, 0.55, 5, 0.835)),
        ("isro", axis(6)),
        ("wire", axis(7)),
    ])
}

fn newsroom() -> Vec<Article> {
    vec![
        Article::new(
            "Sensex crashes 800 points amid global selloff",
            "Markets fell sharply.",
            "https://eco.com/markets/sensex-crash",
        ),
        Article::new(
            "Sensex crashes 800 points amid global selloff",
            "Benchmark indices fell sharply on Monday as global cues weakened.",
            "https://mirror.com/biz/sensex",
        ),
        Article::new(
            "Markets tumble",
            "",
            "https://ECO.com/markets/sensex-crash/?utm_source=feed",
        ),
        Article::new(
            "Heavy rain lashes Mumbai, local trains hit",
            "Waterlogging reported in low-lying areas.",
            "https://city.com/mumbai/rain-trains",
        ),
        Article::new(
            "Brahmaputra breaches banks, thousands displaced",
            "Relief camps opened across Assam as water levels rise.",
            "https://ne.com/assam/brahmaputra-breach",
        ),
        Article::new(
            "Deluge in Assam leaves villages under water",
            "State disaster teams evacuate residents in several districts.",
            "https://wire.in/flood-villages",
        ),
        Article::new(
            "Bihar votes in first phase of assembly polls",
            "Voting is underway in 71 constituencies.",
            "https://polls.com/bihar/phase-one",
        ),
        Article::new(
            "Counting begins for Maharashtra civic elections",
            "Results for 29 municipal corporations are expected by evening.",
            "https://polls.com/maharashtra/civic-count",
        ),
        Article::new("", "Untitled wire copy", ""),
        Article::new(
            "ISRO launches new weather satellite",
            "The satellite lifted off from Sriharikota.",
            "https://space.com/isro/launch/2024/101",
        ),
        Article::new(
            "Weather satellite put in orbit by ISRO",
            "Launch successful.",
            "https://space.com/isro/launch/2024/102",
        ),
    ]
}

fn is_subsequence(output: &[Article], input: &[Article]) -> bool {
    let mut remaining = input.iter();
    output
        .iter()
        .all(|wanted| remaining.any(|candidate| candidate == wanted))
}

#[test]
fn test_empty_input() {
    let provider = newsroom_provider();
    let (survivors, report) =
        deduplicate_with_report(Vec::new(), Some(&provider), &DedupConfig::default());
    assert!(survivors.is_empty());
    assert_eq!(report.total_removed(), 0);
    assert_eq!(report.output(), 0);
}

#[test]
fn test_full_pipeline_report() {
    let provider = newsroom_provider();
    let input = newsroom();
    let (survivors, report) =
        deduplicate_with_report(input.clone(), Some(&provider), &DedupConfig::default());

    assert_eq!(report.input, 11);
    assert_eq!(report.url_removed, 1);
    assert_eq!(report.title_removed, 1);
    assert_eq!(report.semantic_removed, 2);
    assert_eq!(report.semantic, SemanticOutcome::Applied);
    assert_eq!(report.output(), survivors.len());
    assert_eq!(survivors.len(), 7);

    // The more complete Sensex report replaced the first one
    assert!(survivors.contains(&input[1]));
    assert!(!survivors.contains(&input[0]));
    assert!(!survivors.contains(&input[2]));
    // Both election stories and the untitled copy survive
    assert!(survivors.contains(&input[6]));
    assert!(survivors.contains(&input[7]));
    assert!(survivors.contains(&input[8]));
    // The two launch reports share a URL stem; the longer text stays
    assert!(survivors.contains(&input[9]));
    assert!(!survivors.contains(&input[10]));
}

#[test]
fn test_semantic_stage_embeds_once_with_full_batch() {
    use std::cell::RefCell;

    let batches: RefCell<Vec<usize>> = RefCell::new(Vec::new());
    let inner = newsroom_provider();
    let counting = |texts: &[String]| -> Vectors {
        batches.borrow_mut().push(texts.len());
        inner(texts)
    };

    let config = DedupConfig::default();
    let expected = dedupe_by_title(dedupe_by_url(newsroom()), config.title_threshold)
        .iter()
        .filter(|article| article.has_text())
        .count();
    let (_, report) = deduplicate_with_report(newsroom(), Some(&counting), &config);

    assert_eq!(report.semantic, SemanticOutcome::Applied);
    assert_eq!(expected, 9);
    assert_eq!(*batches.borrow(), vec![expected]);
}

#[test]
fn test_idempotence() {
    let provider = newsroom_provider();
    let config = DedupConfig::default();
    let once = deduplicate(newsroom(), Some(&provider), &config);
    let twice = deduplicate(once.clone(), Some(&provider), &config);
    assert_eq!(once, twice);

    let once = deduplicate(newsroom(), None, &config);
    let twice = deduplicate(once.clone(), None, &config);
    assert_eq!(once, twice);
}

#[test]
fn test_output_is_subsequence_of_input() {
    let provider = newsroom_provider();
    let input = newsroom();
    let survivors = deduplicate(input.clone(), Some(&provider), &DedupConfig::default());
    assert!(is_subsequence(&survivors, &input));

    let mut reversed = input.clone();
    reversed.reverse();
    let survivors = deduplicate(reversed.clone(), Some(&provider), &DedupConfig::default());
    assert!(is_subsequence(&survivors, &reversed));
}

#[test]
fn test_url_and_title_invariants() {
    let provider = newsroom_provider();
    let survivors = deduplicate(newsroom(), Some(&provider), &DedupConfig::default());

    for (i, a) in survivors.iter().enumerate() {
        for b in survivors.iter().skip(i + 1) {
            if let (Some(url_a), Some(url_b)) = (canonical_url(&a.url), canonical_url(&b.url)) {
                assert_ne!(url_a, url_b);
            }
            assert!(
                !titles_similar(&a.title, &b.title, 0.85),
                "{:?} and {:?} both survived",
                a.title,
                b.title
            );
        }
    }
}

#[test]
fn test_completeness_preference_across_stages() {
    let config = DedupConfig::default();

    let by_url = vec![
        Article::new("One", "long description here", "https://n.com/x"),
        Article::new("Two", "short", "https://n.com/x/"),
    ];
    assert_eq!(deduplicate(by_url.clone(), None, &config), vec![by_url[0].clone()]);

    let by_title = vec![
        Article::new("Gold prices surge", "short", "https://a.com/1"),
        Article::new("Gold prices surge!", "a longer description", "https://b.com/2"),
    ];
    assert_eq!(deduplicate(by_title.clone(), None, &config), vec![by_title[1].clone()]);
}

#[test]
fn test_scenario_trailing_slash_url() {
    let articles = vec![
        Article::new("Dam gates opened", "Water released.", "https://n.com/a/1"),
        Article::new(
            "Authorities open sluice gates at reservoir",
            "Water released downstream after heavy inflow.",
            "https://n.com/a/1/",
        ),
    ];
    let survivors = deduplicate(articles.clone(), None, &DedupConfig::default());
    assert_eq!(survivors, vec![articles[1].clone()]);
}

#[test]
fn test_scenario_paraphrased_headline() {
    let articles = vec![
        Article::new("Modi launches new scheme", "", "https://a.com/modi-scheme"),
        Article::new(
            "PM Modi launches new government scheme today",
            "The scheme targets rural households.",
            "https://b.com/pm-scheme",
        ),
    ];

    // Shared words cover 4 of 7, below the title stage threshold
    let survivors = deduplicate(articles.clone(), None, &DedupConfig::default());
    assert_eq!(survivors.len(), 2);

    // Embeddings close the gap
    let provider = topic_provider(vec![
        ("government", vec![0.9, 0.436]),
        ("modi", vec![1.0, 0.0]),
    ]);
    let survivors = deduplicate(articles.clone(), Some(&provider), &DedupConfig::default());
    assert_eq!(survivors, vec![articles[1].clone()]);

    // So does a more aggressive title threshold
    let aggressive = DedupConfig::default().with_title_threshold(0.55);
    let survivors = deduplicate(articles.clone(), None, &aggressive);
    assert_eq!(survivors, vec![articles[1].clone()]);
}

#[test]
fn test_scenario_same_flood_different_words() {
    let provider = newsroom_provider();
    let input = newsroom();
    let floods = vec![input[4].clone(), input[5].clone()];
    assert!(!titles_similar(&floods[0].title, &floods[1].title, 0.75));

    let survivors = deduplicate(floods.clone(), Some(&provider), &DedupConfig::default());
    assert_eq!(survivors.len(), 1);
    let longer = if floods[1].combined_text().chars().count()
        > floods[0].combined_text().chars().count()
    {
        &floods[1]
    } else {
        &floods[0]
    };
    assert_eq!(&survivors[0], longer);

    // With the threshold above the cosine only the high-similarity rule applies
    let strict = DedupConfig::default().with_semantic_threshold(0.80);
    let survivors = deduplicate(floods.clone(), Some(&provider), &strict);
    assert_eq!(survivors.len(), 1);
}

#[test]
fn test_scenario_different_elections_survive() {
    let provider = newsroom_provider();
    let input = newsroom();
    let elections = vec![input[6].clone(), input[7].clone()];

    let verdict = explain_pair(
        &elections[0],
        &elections[1],
        &axis(4),
        &mixed(4, 0.55, 5, 0.835),
        0.60,
        &SemanticRules::default(),
    );
    assert!(!verdict.is_duplicate());
    assert!(verdict.key_overlap.unwrap() < 0.35);

    let survivors = deduplicate(elections.clone(), Some(&provider), &DedupConfig::default());
    assert_eq!(survivors, elections);
}

#[test]
fn test_scenario_without_provider_matches_title_stage() {
    let input = newsroom();
    let config = DedupConfig::default();
    let expected = dedupe_by_title(dedupe_by_url(input.clone()), config.title_threshold);

    let (survivors, report) = deduplicate_with_report(input, None, &config);
    assert_eq!(survivors, expected);
    assert_eq!(report.semantic_removed, 0);
    assert_eq!(
        report.semantic,
        SemanticOutcome::Skipped(crate::vector::EmbeddingUnavailable::NotConfigured)
    );
}

#[test]
fn test_failing_provider_matches_title_stage() {
    let input = newsroom();
    let config = DedupConfig::default();
    let expected = dedupe_by_title(dedupe_by_url(input.clone()), config.title_threshold);

    let failing = |_: &[String]| -> Vectors { Err(anyhow::anyhow!("model failed to load")) };
    assert_eq!(deduplicate(input.clone(), Some(&failing), &config), expected);

    let partial = |texts: &[String]| -> Vectors {
        Ok(texts.iter().skip(1).map(|_| axis(0)).collect())
    };
    assert_eq!(deduplicate(input, Some(&partial), &config), expected);
}

fn selection() -> Vec<Article> {
    [
        "Monsoon arrives in Kerala",
        "Sensex hits record high",
        "ISRO tests reusable launch vehicle",
        "Bihar assembly polls announced",
        "RBI keeps repo rate unchanged",
        "India wins series against Australia",
        "Heatwave grips Rajasthan",
        "New metro line opens in Pune",
        "Farmers protest at Delhi border",
        "GST collections rise in June",
        "Modi launches new farm scheme",
        "Modi launches new farm policy",
    ]
    .iter()
    .enumerate()
    .map(|(i, title)| Article::new(title, &"d".repeat(i + 1), ""))
    .collect()
}

#[test]
fn test_final_pass_trusts_small_selections() {
    let selected: Vec<Article> = selection().into_iter().skip(2).collect();
    assert_eq!(selected.len(), 10);
    let config = FinalPassConfig {
        title_threshold: 0.55,
        ..FinalPassConfig::default()
    };

    let result = final_pass(selected.clone(), &selected, 10, None, &config);
    assert_eq!(result, selected);

    let result = final_pass(selected.clone(), &selected, 4, None, &config);
    assert_eq!(result, selected[..4].to_vec());
}

#[test]
fn test_final_pass_dedupes_and_backfills() {
    let selected = selection();
    let cyclone = Article::new("Cyclone alert issued for Odisha coast", "", "");
    let mut pool = selected.clone();
    pool.push(cyclone.clone());

    let config = FinalPassConfig {
        title_threshold: 0.55,
        ..FinalPassConfig::default()
    };
    let result = final_pass(selected.clone(), &pool, 12, None, &config);

    assert_eq!(result.len(), 12);
    // The shorter Modi headline is gone and is not backfilled
    assert!(!result.contains(&selected[10]));
    assert!(result.contains(&selected[11]));
    assert_eq!(result.last(), Some(&cyclone));
}

#[test]
fn test_final_pass_uses_semantic_threshold() {
    let selected = selection();
    // The two Modi stories: cosine 0.58 and titles similar at the pair threshold,
    // so only a semantic threshold below 0.58 merges them
    let provider = |texts: &[String]| -> Vectors {
        Ok(texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let mut v = vec![0.0; texts.len() + 2];
                if text.contains("policy") {
                    v[0] = 0.58;
                    v[1] = 0.815;
                } else if text.contains("Modi") {
                    v[0] = 1.0;
                } else {
                    v[i + 2] = 1.0;
                }
                v
            })
            .collect())
    };

    let main = deduplicate(selected.clone(), Some(&provider), &DedupConfig::default());
    assert_eq!(main.len(), 12);

    let result = final_pass(
        selected.clone(),
        &selected,
        12,
        Some(&provider),
        &FinalPassConfig::default(),
    );
    assert_eq!(result.len(), 11);
    assert!(!result.contains(&selected[10]));
    assert!(result.contains(&selected[11]));
}
