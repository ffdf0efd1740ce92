use super::*;

#[test]
fn test_unknown_session_is_empty() {
    let store: SessionStore<u32> = SessionStore::new();
    assert!(store.entries("nope").is_empty());
    assert!(store.results("nope").is_empty());
    assert_eq!(store.last("nope"), None);
    assert_eq!(store.len("nope"), 0);
    assert!(store.is_empty("nope"));
}

#[test]
fn test_append_preserves_order() {
    let store = SessionStore::new();
    store.append("s1", "first", 1);
    store.append("s1", "second", 2);
    store.append("s2", "other", 9);

    assert_eq!(store.results("s1"), vec![1, 2]);
    assert_eq!(store.last("s1"), Some(2));
    assert_eq!(store.len("s1"), 2);
    assert_eq!(store.session_count(), 2);

    let entries = store.entries("s1");
    assert_eq!(entries[0].sub_query, "first");
    assert_eq!(entries[1].sub_query, "second");
}

#[test]
fn test_clear_removes_only_that_session() {
    let store = SessionStore::new();
    store.append("s1", "q", "a".to_string());
    store.append("s1", "q", "b".to_string());
    store.append("s2", "q", "c".to_string());

    assert_eq!(store.clear("s1"), 2);
    assert_eq!(store.clear("s1"), 0);
    assert!(store.is_empty("s1"));
    assert_eq!(store.last("s2"), Some("c".to_string()));
}

#[test]
fn test_clones_share_state() {
    let store = SessionStore::new();
    let handle = store.clone();
    handle.append("s", "q", 7u8);
    assert_eq!(store.last("s"), Some(7));
}

#[tokio::test]
async fn test_concurrent_appends_are_not_lost() {
    let store: SessionStore<usize> = SessionStore::new();

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                for j in 0..25 {
                    store.append("shared", format!("q{i}-{j}"), i * 100 + j);
                }
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(store.len("shared"), 16 * 25);
}
