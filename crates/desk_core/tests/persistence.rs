use desk_core::{
    update, AppState, CacheStore, Effect, MemoryCacheStore, Msg, Solution, SolutionCache,
    SourceRef, Ticket,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    desk_logging::initialize_for_tests();
}

fn solution(text: &str, confidence: f64) -> Solution {
    Solution {
        text: text.to_string(),
        confidence,
        model: "gemini-2.5-flash".to_string(),
        sources: vec![SourceRef::Raw("KB-104".to_string())],
    }
}

#[test]
fn put_then_get_returns_same_list() {
    let s1 = solution("Restart the interface job.", 0.8);
    let s2 = solution("Reprocess the failed batch.", 0.4);
    let mut cache = SolutionCache::new();

    cache.put("T-1", vec![s1.clone(), s2.clone()]);

    assert!(cache.has("T-1"));
    assert_eq!(cache.get("T-1"), Some([s1, s2].as_slice()));
    assert_eq!(cache.get("T-2"), None);
}

#[test]
fn put_replaces_instead_of_merging() {
    let mut cache = SolutionCache::new();
    cache.put("T-1", vec![solution("a", 0.1), solution("b", 0.2)]);

    cache.put("T-1", vec![solution("c", 0.3)]);

    assert_eq!(cache.get("T-1").unwrap().len(), 1);
    assert_eq!(cache.get("T-1").unwrap()[0].text, "c");
}

#[test]
fn mapping_survives_simulated_reload() {
    init_logging();
    let store = MemoryCacheStore::new();
    let s1 = solution("Restart the interface job.", 0.8);
    let s2 = solution("Reprocess the failed batch.", 0.4);
    let mut cache = SolutionCache::new();
    cache.put("T-1", vec![s1.clone(), s2.clone()]);
    store.save(&cache.to_blob().unwrap()).unwrap();

    let reloaded = SolutionCache::restore(&store);

    assert_eq!(reloaded, cache);
    assert_eq!(reloaded.get("T-1"), Some([s1, s2].as_slice()));
}

#[test]
fn corrupt_or_missing_blob_yields_empty_cache() {
    init_logging();
    assert!(SolutionCache::restore(&MemoryCacheStore::new()).is_empty());
    assert!(SolutionCache::restore(&MemoryCacheStore::with_blob("{not json")).is_empty());
    assert!(SolutionCache::restore(&MemoryCacheStore::with_blob("[1,2,3]")).is_empty());
}

#[test]
fn evicting_absent_key_reports_no_change() {
    let mut cache = SolutionCache::new();
    cache.put("T-1", vec![solution("a", 0.5)]);

    assert!(!cache.evict("T-9"));
    assert!(cache.evict("T-1"));
    assert!(cache.is_empty());
}

#[test]
fn every_cache_mutation_emits_a_full_blob() {
    init_logging();
    let mut cache = SolutionCache::new();
    cache.put("ERP-1", vec![solution("existing", 0.5)]);
    let state = AppState::with_cache(cache);
    let (state, _) = update(
        state,
        Msg::CompleteTicketsLoaded(Ok(vec![
            Ticket {
                key: "ERP-1".to_string(),
                module: "AP.Invoice".to_string(),
                confidence: 0.9,
                validated_at: None,
            },
            Ticket {
                key: "ERP-2".to_string(),
                module: "AR.Receipt".to_string(),
                confidence: 0.7,
                validated_at: None,
            },
        ])),
    );
    let (state, effects) = update(state, Msg::TicketSelected(Some("ERP-2".to_string())));
    let token = match &effects[0] {
        Effect::GenerateSolutions { token, .. } => *token,
        other => panic!("unexpected effect {other:?}"),
    };

    let (_state, effects) = update(
        state,
        Msg::SolutionsGenerated {
            token,
            ticket_key: "ERP-2".to_string(),
            result: Ok(vec![solution("fresh", 0.9)]),
        },
    );

    let blob = match effects.as_slice() {
        [Effect::PersistSolutionCache { blob }] => blob.clone(),
        other => panic!("unexpected effects {other:?}"),
    };
    let store = MemoryCacheStore::with_blob(blob);
    let reloaded = SolutionCache::restore(&store);
    assert_eq!(reloaded.keys().collect::<Vec<_>>(), vec!["ERP-1", "ERP-2"]);
}
