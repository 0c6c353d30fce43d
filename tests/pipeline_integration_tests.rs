//! End-to-end tests for a full mapping run against a local fixture server
//!
//! These tests verify:
//! - Every dataset is fetched, extracted, and written in both styles
//! - Market listings are filtered by the index table from the skins catalog
//! - A failing dataset only removes its own outputs
//! - Repeated runs over the same inputs produce byte-identical files

use camino::{Utf8Path, Utf8PathBuf};
use item_mapper::services::FetchError;
use item_mapper::{Category, Dataset, MapperConfig, Pipeline, PipelineError};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;
use tokio_test::assert_ok;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ALL_FILES: usize = 48;

fn fixture_routes() -> Vec<(&'static str, Value)> {
    vec![
        (
            "/api/en/skins.json",
            json!([
                {"weapon": {"name": "AK-47", "weapon_id": 7}, "pattern": {"name": "Redline"}, "paint_index": "180"},
                {"weapon": {"name": "AWP", "weapon_id": 9}, "pattern": {"name": "Asiimov"}, "paint_index": "279"},
                {"weapon": {"name": "Desert Eagle", "weapon_id": 1}, "pattern": null}
            ]),
        ),
        (
            "/api/en/agents.json",
            json!([
                {"def_index": "4619", "market_hash_name": "Sir Bloody Darryl | The Professionals"},
                {"def_index": "n/a", "market_hash_name": "Broken Agent"}
            ]),
        ),
        (
            "/api/en/collectibles.json",
            json!([
                {"def_index": "42", "market_hash_name": "Music Box"},
                {"def_index": "43", "market_hash_name": "Souvenir Token | Cache"}
            ]),
        ),
        (
            "/api/en/crates.json",
            json!([
                {"id": "crate-4001", "market_hash_name": "CS:GO Weapon Case"},
                {"id": "crate-4002", "market_hash_name": "Community Sticker Collection"},
                {"id": "crate-x", "market_hash_name": "Unnumbered Case"}
            ]),
        ),
        (
            "/api/en/graffiti.json",
            json!([
                {"id": "graffiti-1001", "market_hash_name": "Sealed Graffiti | Lambda"},
                {"id": "graffiti-1002", "market_hash_name": "Sealed Graffiti | Cologne 2024"}
            ]),
        ),
        (
            "/api/en/highlights.json",
            json!([
                {"id": "highlight-aa01", "market_hash_name": "Souvenir Charm | Austin 2025 Highlight"}
            ]),
        ),
        (
            "/api/en/keychains.json",
            json!([{"def_index": "1", "market_hash_name": "Charm | Lil' Ava"}]),
        ),
        (
            "/api/en/keys.json",
            json!([
                {"id": "key-1203", "market_hash_name": "CS:GO Case Key"},
                {"id": "key-community", "market_hash_name": "Community Key"}
            ]),
        ),
        (
            "/api/en/music_kits.json",
            json!([{"def_index": "3", "market_hash_name": "Music Kit | Daniel Sadowski, Crystal"}]),
        ),
        (
            "/api/en/patches.json",
            json!([{"def_index": "4501", "market_hash_name": "Patch | Bloodhound"}]),
        ),
        (
            "/api/en/stickers.json",
            json!([
                {"def_index": "5", "market_hash_name": "Sticker | Ninja (Foil)"},
                {"def_index": "6", "market_hash_name": "Sticker | Crown (Foil)"}
            ]),
        ),
        (
            "/cs2_marketplaceids.json",
            json!({
                "items": {
                    "AK-47 | Redline (Field-Tested)": {
                        "buff163_goods_id": 33974,
                        "buffmarket_goods_id": 1201,
                        "buff163_paintseed_group_ids": {"Tier 1": 10, "Tier 2": null}
                    },
                    "Sticker | Crown (Foil)": {"buff163_sticker_id": 77}
                },
                "patterns": {
                    "AK-47 | Case Hardened": {"Blue Gem": [661, 670]}
                }
            }),
        ),
        (
            "/mapper/steam/730.json",
            json!({
                "AK-47": {"cn_name": "AK-47", "en_name": "AK-47", "name_id": 100},
                "AK-47 | Redline (Field-Tested)": {"en_name": "AK-47 | Redline (Field-Tested)", "name_id": 200},
                "Sticker | Crown (Foil)": {"en_name": "Sticker | Crown (Holo/Foil)", "name_id": 300},
                "Renamed Item": {"en_name": "Something Else", "name_id": 400}
            }),
        ),
        (
            "/mapper/buff/730.json",
            json!({"AWP": 5, "AWP | Asiimov (Field-Tested)": 33, "Delisted Item": -1}),
        ),
        (
            "/mapper/c5/730.json",
            json!({"AK-47 | Redline (Field-Tested)": 11}),
        ),
        (
            "/mapper/uuyp/730.json",
            json!({"AK-47 | Redline (Field-Tested)": 12}),
        ),
        ("/mapper/igxe/730.json", json!({})),
    ]
}

/// Serve every fixture except the routes in `skip`, which answer 404.
async fn start_server(skip: &[&str]) -> MockServer {
    let server = MockServer::start().await;

    for (route, body) in fixture_routes() {
        if skip.contains(&route) {
            continue;
        }
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
    }

    server
}

fn config_for(server: &MockServer, root: &Utf8Path) -> MapperConfig {
    let mut config = MapperConfig::default();
    config.sources.catalog_base_url = format!("{}/api/en/", server.uri());
    config.sources.market_ids_base_url = format!("{}/mapper", server.uri());
    config.sources.marketplace_ids_url = format!("{}/cs2_marketplaceids.json", server.uri());
    config.sources.request_timeout_secs = 5;
    config.output.root = root.to_path_buf();
    config
}

fn output_root() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, root)
}

fn read(root: &Utf8Path, style: &str, relative: &str) -> String {
    fs::read_to_string(root.join(style).join(relative)).unwrap()
}

fn read_json(root: &Utf8Path, style: &str, relative: &str) -> Value {
    serde_json::from_str(&read(root, style, relative)).unwrap()
}

/// Every file under `dir`, keyed by its path relative to `dir`.
fn collect_files(dir: &Utf8Path) -> BTreeMap<String, Vec<u8>> {
    let mut files = BTreeMap::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        for entry in current.read_dir_utf8().unwrap() {
            let entry = entry.unwrap();
            let path = entry.path().to_path_buf();
            if path.is_dir() {
                pending.push(path);
            } else {
                let relative = path.strip_prefix(dir).unwrap().to_string();
                files.insert(relative, fs::read(&path).unwrap());
            }
        }
    }

    files
}

#[tokio::test(flavor = "multi_thread")]
async fn test_full_run_writes_every_dataset() {
    let server = start_server(&[]).await;
    let (_temp_dir, root) = output_root();
    let pipeline = assert_ok!(Pipeline::new(&config_for(&server, &root)));

    let report = assert_ok!(pipeline.run().await);

    assert!(report.is_clean(), "unexpected errors: {:?}", report.errors);
    assert_eq!(report.files_written, ALL_FILES);
    assert_eq!(collect_files(&root.join("mini")).len(), ALL_FILES / 2);
    assert_eq!(collect_files(&root.join("pretty")).len(), ALL_FILES / 2);

    assert_eq!(
        read(&root, "mini", "steam_indexes/def_indexes.json"),
        "{\"AK-47\":7,\"AWP\":9,\"Desert Eagle\":1}\n"
    );
    assert_eq!(
        read(&root, "pretty", "steam_indexes/paint_indexes.json"),
        "{\n    \"Asiimov\": 279,\n    \"Redline\": 180\n}\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_catalog_outputs_apply_category_rules() {
    let server = start_server(&[]).await;
    let (_temp_dir, root) = output_root();
    let pipeline = Pipeline::new(&config_for(&server, &root)).unwrap();

    pipeline.run().await.unwrap();

    let grouped = |name: &str| read_json(&root, "mini", &format!("steam_grouped_ids/{}", name));

    assert_eq!(
        grouped("agents.json"),
        json!({"Sir Bloody Darryl | The Professionals": 4619})
    );
    assert_eq!(grouped("collectibles.json"), json!({"Music Box": 42}));
    assert_eq!(grouped("crates.json"), json!({"CS:GO Weapon Case": 4001}));
    assert_eq!(
        grouped("graffiti.json"),
        json!({"Sealed Graffiti | Lambda": "1001"})
    );
    assert_eq!(
        grouped("highlights.json"),
        json!({"Souvenir Charm | Austin 2025 Highlight": "highlight-aa01"})
    );
    assert_eq!(
        grouped("keys.json"),
        json!({"CS:GO Case Key": 1203, "Community Key": "community"})
    );
    assert_eq!(grouped("stickers.json"), json!({"Sticker | Crown (Foil)": 6}));
    assert_eq!(grouped("patches.json"), json!({"Patch | Bloodhound": 4501}));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_market_outputs_are_cross_referenced() {
    let server = start_server(&[]).await;
    let (_temp_dir, root) = output_root();
    let pipeline = Pipeline::new(&config_for(&server, &root)).unwrap();

    pipeline.run().await.unwrap();

    assert_eq!(
        read_json(&root, "mini", "market_ids/steam.json"),
        json!({"AK-47 | Redline (Field-Tested)": 200, "Sticker | Crown (Foil)": 300})
    );
    assert_eq!(
        read_json(&root, "mini", "market_ids/buff163.json"),
        json!({"AWP | Asiimov (Field-Tested)": 33})
    );
    assert_eq!(
        read_json(&root, "mini", "market_ids/c5game.json"),
        json!({"AK-47 | Redline (Field-Tested)": 11})
    );
    assert_eq!(
        read_json(&root, "mini", "market_ids/youpin898.json"),
        json!({"AK-47 | Redline (Field-Tested)": 12})
    );
    assert_eq!(read(&root, "mini", "market_ids/igxe.json"), "{}\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_marketplace_ids_tables() {
    let server = start_server(&[]).await;
    let (_temp_dir, root) = output_root();
    let pipeline = Pipeline::new(&config_for(&server, &root)).unwrap();

    pipeline.run().await.unwrap();

    assert_eq!(
        read_json(&root, "mini", "market_ids/buff_market.json"),
        json!({"AK-47 | Redline (Field-Tested)": 1201})
    );
    assert_eq!(
        read_json(&root, "mini", "buff163_grouped_ids/stickers.json"),
        json!({"Sticker | Crown (Foil)": 77})
    );
    assert_eq!(
        read_json(&root, "mini", "buff163_grouped_ids/paintseed_group_ids.json"),
        json!({"AK-47 | Redline (Field-Tested)": {"Tier 1": 10}})
    );
    assert_eq!(
        read_json(&root, "mini", "buff163_grouped_ids/patterns.json"),
        json!({"AK-47 | Case Hardened": {"Blue Gem": [661, 670]}})
    );
    assert_eq!(read(&root, "mini", "buff163_grouped_ids/phases.json"), "{}\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_compact_and_pretty_trees_hold_the_same_data() {
    let server = start_server(&[]).await;
    let (_temp_dir, root) = output_root();
    let pipeline = Pipeline::new(&config_for(&server, &root)).unwrap();

    pipeline.run().await.unwrap();

    let mini = collect_files(&root.join("mini"));
    let pretty = collect_files(&root.join("pretty"));
    assert_eq!(
        mini.keys().collect::<Vec<_>>(),
        pretty.keys().collect::<Vec<_>>()
    );

    for (relative, compact) in &mini {
        let compact_value: Value = serde_json::from_slice(compact).unwrap();
        let pretty_value: Value = serde_json::from_slice(&pretty[relative]).unwrap();
        assert_eq!(compact_value, pretty_value, "{} differs between trees", relative);
        assert!(compact.ends_with(b"\n"));
        assert!(!compact[..compact.len() - 1].contains(&b'\n'));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_dataset_only_removes_its_outputs() {
    let server = start_server(&["/api/en/stickers.json"]).await;
    let (_temp_dir, root) = output_root();
    let pipeline = Pipeline::new(&config_for(&server, &root)).unwrap();

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.errors.len(), 1);
    let err = &report.errors[0];
    assert_eq!(err.dataset(), Some(&Dataset::Catalog(Category::Stickers)));
    assert!(matches!(
        err,
        PipelineError::Fetch {
            source: FetchError::Status { status: 404, .. },
            ..
        }
    ));

    assert_eq!(report.files_written, ALL_FILES - 2);
    for style in ["mini", "pretty"] {
        assert!(!root.join(style).join("steam_grouped_ids/stickers.json").exists());
        assert!(root.join(style).join("steam_grouped_ids/agents.json").exists());
        assert!(root.join(style).join("market_ids/steam.json").exists());
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_dataset_is_reported() {
    let server = start_server(&["/api/en/agents.json"]).await;
    Mock::given(method("GET"))
        .and(path("/api/en/agents.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[{\"def_index\": "))
        .mount(&server)
        .await;

    let (_temp_dir, root) = output_root();
    let pipeline = Pipeline::new(&config_for(&server, &root)).unwrap();

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.errors.len(), 1);
    assert!(matches!(
        &report.errors[0],
        PipelineError::Fetch {
            dataset: Dataset::Catalog(Category::Agents),
            source: FetchError::Decode { .. },
        }
    ));
    assert!(!root.join("mini/steam_grouped_ids/agents.json").exists());
    assert!(root.join("mini/steam_grouped_ids/crates.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_skins_leaves_markets_unfiltered() {
    let server = start_server(&["/api/en/skins.json"]).await;
    let (_temp_dir, root) = output_root();
    let pipeline = Pipeline::new(&config_for(&server, &root)).unwrap();

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.errors.len(), 1);
    assert_eq!(
        report.errors[0].dataset(),
        Some(&Dataset::Catalog(Category::Skins))
    );

    assert!(!root.join("mini/steam_indexes/def_indexes.json").exists());
    assert!(!root.join("mini/steam_indexes/paint_indexes.json").exists());

    let steam = read_json(&root, "mini", "market_ids/steam.json");
    assert_eq!(steam["AK-47"], json!(100));
    let buff = read_json(&root, "mini", "market_ids/buff163.json");
    assert_eq!(buff, json!({"AWP": 5, "AWP | Asiimov (Field-Tested)": 33}));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_regional_market_keeps_the_others() {
    let server = start_server(&["/mapper/uuyp/730.json"]).await;
    let (_temp_dir, root) = output_root();
    let pipeline = Pipeline::new(&config_for(&server, &root)).unwrap();

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.errors.len(), 1);
    assert_eq!(
        report.errors[0].dataset(),
        Some(&Dataset::RegionalMarket("uuyp".to_string()))
    );
    assert!(!root.join("pretty/market_ids/youpin898.json").exists());
    assert!(root.join("pretty/market_ids/c5game.json").exists());
    assert!(root.join("pretty/market_ids/buff163.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_repeated_runs_are_byte_identical() {
    let server = start_server(&[]).await;

    let (_first_dir, first_root) = output_root();
    let (_second_dir, second_root) = output_root();

    Pipeline::new(&config_for(&server, &first_root))
        .unwrap()
        .run()
        .await
        .unwrap();
    Pipeline::new(&config_for(&server, &second_root))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(collect_files(&first_root), collect_files(&second_root));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rerun_overwrites_previous_outputs() {
    let server = start_server(&[]).await;
    let (_temp_dir, root) = output_root();

    let stale = root.join("mini/steam_grouped_ids/agents.json");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, "{\"Stale Agent\":1,\"padding\":\"xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx\"}\n").unwrap();

    let pipeline = Pipeline::new(&config_for(&server, &root)).unwrap();
    let report = assert_ok!(pipeline.run().await);
    assert!(report.is_clean());

    assert_eq!(
        read(&root, "mini", "steam_grouped_ids/agents.json"),
        "{\"Sir Bloody Darryl | The Professionals\":4619}\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_metrics_count_datasets_and_files() {
    use std::sync::atomic::Ordering;

    let server = start_server(&["/api/en/keys.json"]).await;
    let (_temp_dir, root) = output_root();
    let pipeline = Pipeline::new(&config_for(&server, &root)).unwrap();

    pipeline.run().await.unwrap();

    let metrics = pipeline.metrics();
    assert_eq!(metrics.datasets_fetched.load(Ordering::Relaxed), 16);
    assert_eq!(metrics.datasets_failed.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.files_written.load(Ordering::Relaxed), ALL_FILES - 2);
    assert_eq!(metrics.files_failed.load(Ordering::Relaxed), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_null_descriptive_fields_keep_the_dataset() {
    let server = start_server(&["/api/en/stickers.json", "/mapper/steam/730.json"]).await;
    Mock::given(method("GET"))
        .and(path("/api/en/stickers.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"def_index": "6", "market_hash_name": "Sticker | Crown (Foil)", "tournament_event": null, "rarity": null},
            {"def_index": null, "market_hash_name": "Sticker | No Index", "effect": null}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mapper/steam/730.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "AK-47 | Redline (Field-Tested)": {"cn_name": null, "en_name": "AK-47 | Redline (Field-Tested)", "name_id": 200},
            "Broken Entry": {"cn_name": null, "en_name": "Broken Entry", "name_id": null}
        })))
        .mount(&server)
        .await;

    let (_temp_dir, root) = output_root();
    let pipeline = Pipeline::new(&config_for(&server, &root)).unwrap();

    let report = assert_ok!(pipeline.run().await);

    assert!(report.is_clean(), "unexpected errors: {:?}", report.errors);
    assert_eq!(
        read_json(&root, "mini", "steam_grouped_ids/stickers.json"),
        json!({"Sticker | Crown (Foil)": 6})
    );
    assert_eq!(
        read_json(&root, "mini", "market_ids/steam.json"),
        json!({"AK-47 | Redline (Field-Tested)": 200})
    );
}
